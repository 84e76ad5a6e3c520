use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::a2a::AgentCard;
use crate::agents::AgentBackend;
use crate::errors::{AgentError, AgentResult};
use crate::server::routes::{create_routes, ServerState};
use crate::task::{InMemoryTaskStore, TaskManager, TaskStore};

/// A2A protocol server binding an agent card to a task manager.
pub struct AgentServer {
    card: Arc<AgentCard>,
    manager: Arc<TaskManager>,
}

impl AgentServer {
    /// Create a new server builder for the given card.
    pub fn builder(card: AgentCard) -> AgentServerBuilder {
        AgentServerBuilder::new(card)
    }

    fn display_server_info(&self, local_addr: &std::net::SocketAddr) {
        tracing::info!("A2A server listening at http://{}", local_addr);
        tracing::info!(
            "agent card available at http://{}/.well-known/agent-card.json",
            local_addr
        );
        tracing::info!(
            agent = %self.card.name,
            version = %self.card.version,
            streaming = self.card.capabilities.streaming,
            skills = self.card.skills.len(),
            "serving agent"
        );
    }

    /// Convert the server into an axum router (exposed for tests).
    pub fn into_router(self) -> Router {
        let state = ServerState {
            card: self.card,
            manager: self.manager,
        };
        create_routes(state).layer(CorsLayer::permissive())
    }

    /// Run the server on the specified address.
    ///
    /// Shuts down gracefully on ctrl-c: in-flight requests run to
    /// completion, they are not abandoned mid-task.
    pub async fn serve(self, addr: impl tokio::net::ToSocketAddrs) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        self.display_server_info(&local_addr);

        let app = self.into_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("A2A server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}

/// Builder for configuring an A2A server.
pub struct AgentServerBuilder {
    card: AgentCard,
    backend: Option<Arc<dyn AgentBackend>>,
    store: Option<Arc<dyn TaskStore>>,
}

impl AgentServerBuilder {
    fn new(card: AgentCard) -> Self {
        Self {
            card,
            backend: None,
            store: None,
        }
    }

    /// Set the agent backend. Required.
    pub fn with_backend<B: AgentBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Use a custom task store instead of the default in-memory one.
    ///
    /// Takes an `Arc` so callers can keep a handle, e.g. to drive a
    /// retention sweeper.
    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Configure the agent's card (useful for setting URL, version, etc.)
    pub fn with_card_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(AgentCard) -> AgentCard,
    {
        self.card = f(self.card);
        self
    }

    /// Build the server, validating the configuration.
    ///
    /// Configuration faults are fatal here: a server that cannot describe
    /// itself refuses to bind rather than advertising a broken card.
    pub fn build(self) -> AgentResult<AgentServer> {
        let backend = self.backend.ok_or_else(|| AgentError::MissingConfiguration {
            field: "backend".to_string(),
        })?;

        let mut card = self.card;
        if card.name.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration {
                field: "name".to_string(),
                reason: "agent card name must not be empty".to_string(),
            });
        }
        if card.url.trim().is_empty() {
            return Err(AgentError::InvalidConfiguration {
                field: "url".to_string(),
                reason: "agent card url must not be empty".to_string(),
            });
        }
        if card.version.is_empty() {
            card = card.with_version("0.1.0");
        }
        // The backend's supported content types populate the card's default
        // modes when the card does not set its own.
        if card.default_input_modes.is_empty() {
            card = card.with_content_types(backend.supported_content_types());
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new()));
        let manager = TaskManager::new(store, backend, card.capabilities.clone());

        Ok(AgentServer {
            card: Arc::new(card),
            manager: Arc::new(manager),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentResult;
    use async_trait::async_trait;

    struct EchoBackend;

    #[async_trait]
    impl AgentBackend for EchoBackend {
        async fn invoke(&self, query: &str, _session_id: &str) -> AgentResult<String> {
            Ok(query.to_string())
        }
    }

    #[test]
    fn test_build_requires_backend() {
        let card = AgentCard::new("Echo", "echoes", "http://localhost:9999/", "1.0.0");
        let err = AgentServer::builder(card).build().err().unwrap();
        assert!(matches!(err, AgentError::MissingConfiguration { field } if field == "backend"));
    }

    #[test]
    fn test_build_rejects_empty_card_name() {
        let card = AgentCard::new("", "echoes", "http://localhost:9999/", "1.0.0");
        let err = AgentServer::builder(card)
            .with_backend(EchoBackend)
            .build()
            .err()
            .unwrap();
        assert!(err.is_startup_fatal());
    }

    #[test]
    fn test_build_fills_defaults() {
        let card = AgentCard::new("Echo", "echoes", "http://localhost:9999/", "");
        let server = AgentServer::builder(card)
            .with_backend(EchoBackend)
            .build()
            .unwrap();
        assert_eq!(server.card.version, "0.1.0");
    }
}
