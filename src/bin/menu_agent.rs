//! Restaurant menu agent: a complete A2A agent answering from a fixed menu.
//!
//! Run with: cargo run --bin menu-agent -- --port 10003

use async_trait::async_trait;
use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use a2akit::a2a::{AgentCard, AgentSkill};
use a2akit::server::AgentServer;
use a2akit::{AgentBackend, AgentResult, InMemoryTaskStore};

#[derive(Parser, Debug)]
#[command(name = "menu-agent", about = "A2A restaurant menu agent")]
struct Args {
    /// Host to bind the server to
    #[arg(long, default_value = "127.0.0.1", env = "MENU_AGENT_HOST")]
    host: String,

    /// Port number for the server
    #[arg(long, default_value_t = 10003, env = "MENU_AGENT_PORT")]
    port: u16,

    /// Evict completed tasks older than this many seconds (kept forever if unset)
    #[arg(long)]
    task_ttl_secs: Option<u64>,
}

/// Answers menu questions from a fixed in-memory menu.
struct MenuAgent {
    menu: HashMap<&'static str, &'static str>,
}

impl MenuAgent {
    const SUPPORTED_CONTENT_TYPES: &'static [&'static str] = &["text", "text/plain"];

    fn new() -> Self {
        let mut menu = HashMap::new();
        menu.insert("burger", "cheeseburger, chicken burger, veggie burger");
        menu.insert("pizza", "margherita, pepperoni, barbecue chicken");
        menu.insert("drinks", "cola, lemonade, iced tea");
        Self { menu }
    }
}

#[async_trait]
impl AgentBackend for MenuAgent {
    fn supported_content_types(&self) -> &[&str] {
        Self::SUPPORTED_CONTENT_TYPES
    }

    async fn invoke(&self, query: &str, session_id: &str) -> AgentResult<String> {
        tracing::debug!(%session_id, "answering menu query");
        let lowered = query.to_lowercase();

        let mut matches: Vec<String> = self
            .menu
            .iter()
            .filter(|(category, _)| lowered.contains(*category))
            .map(|(category, items)| format!("Our {category} options: {items}."))
            .collect();
        matches.sort();

        if matches.is_empty() {
            let mut categories: Vec<&str> = self.menu.keys().copied().collect();
            categories.sort_unstable();
            return Ok(format!(
                "We serve {}. Ask about any of them!",
                categories.join(", ")
            ));
        }
        Ok(matches.join(" "))
    }
}

fn agent_card(host: &str, port: u16) -> AgentCard {
    AgentCard::new(
        "RestaurantMenuAgent",
        "This agent provides information about the restaurant menu.",
        format!("http://{host}:{port}/"),
        "1.0.0",
    )
    .with_streaming(false)
    .with_content_types(MenuAgent::SUPPORTED_CONTENT_TYPES)
    .with_skill(AgentSkill {
        id: "menu_assistant".to_string(),
        name: "Restaurant Menu Assistant".to_string(),
        description: "Provides information about the restaurant menu.".to_string(),
        tags: vec!["menu".to_string(), "restaurant".to_string()],
        examples: vec![
            "What burgers do you have?".to_string(),
            "Tell me about your drinks.".to_string(),
        ],
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "menu agent failed to start");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = match args.task_ttl_secs {
        Some(secs) => Arc::new(InMemoryTaskStore::with_retention(Duration::from_secs(secs))),
        None => Arc::new(InMemoryTaskStore::new()),
    };

    // Sweep at a fraction of the TTL so eviction lag stays bounded.
    if let Some(secs) = args.task_ttl_secs {
        let every = Duration::from_secs(secs.div_ceil(4).max(1));
        InMemoryTaskStore::start_sweeper(store.clone(), every);
    }

    // Configuration faults are fatal: refuse to bind on a broken card.
    let server = AgentServer::builder(agent_card(&args.host, args.port))
        .with_backend(MenuAgent::new())
        .with_store(store)
        .build()?;

    server.serve((args.host.as_str(), args.port)).await?;
    Ok(())
}
