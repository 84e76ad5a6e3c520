use serde::{Deserialize, Serialize};

// ============================================================================
// Agent Card and Discovery Types
// ============================================================================

/// Defines optional capabilities supported by an agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentCapabilities {
    /// Indicates if the agent supports streaming responses (`tasks/sendSubscribe`).
    pub streaming: bool,
}

/// Represents a distinct capability or function that an agent can perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    /// A unique identifier for the agent's skill.
    pub id: String,
    /// A human-readable name for the skill.
    pub name: String,
    /// A detailed description of the skill.
    pub description: String,
    /// A set of keywords describing the skill's capabilities.
    pub tags: Vec<String>,
    /// Example prompts or scenarios that this skill can handle.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub examples: Vec<String>,
}

/// The AgentCard is a self-describing manifest for an agent.
///
/// Built once at startup and immutable thereafter; served verbatim from the
/// discovery endpoint so other agents can decide whether and how to call
/// this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    /// A human-readable name for the agent.
    pub name: String,
    /// A human-readable description of the agent.
    pub description: String,
    /// The public URL where this agent can be reached.
    pub url: String,
    /// The agent's own version number.
    pub version: String,
    /// A declaration of optional capabilities supported by the agent.
    pub capabilities: AgentCapabilities,
    /// Default set of supported input content types for all skills.
    #[serde(rename = "defaultInputModes")]
    pub default_input_modes: Vec<String>,
    /// Default set of supported output content types for all skills.
    #[serde(rename = "defaultOutputModes")]
    pub default_output_modes: Vec<String>,
    /// The set of skills that the agent can perform.
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a new AgentCard with minimal required fields.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: version.into(),
            capabilities: AgentCapabilities::default(),
            default_input_modes: vec!["text".to_string(), "text/plain".to_string()],
            default_output_modes: vec!["text".to_string(), "text/plain".to_string()],
            skills: Vec::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.capabilities.streaming = streaming;
        self
    }

    pub fn with_content_types(mut self, content_types: &[&str]) -> Self {
        let modes: Vec<String> = content_types.iter().map(|s| s.to_string()).collect();
        self.default_input_modes = modes.clone();
        self.default_output_modes = modes;
        self
    }

    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_card_wire_format() {
        let card = AgentCard::new(
            "RestaurantMenuAgent",
            "Provides information about the restaurant menu.",
            "http://localhost:10003/",
            "1.0.0",
        )
        .with_streaming(false)
        .with_skill(AgentSkill {
            id: "menu_assistant".to_string(),
            name: "Restaurant Menu Assistant".to_string(),
            description: "Provides information about the restaurant menu.".to_string(),
            tags: vec!["menu".to_string(), "restaurant".to_string()],
            examples: vec!["What burgers do you have?".to_string()],
        });

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "RestaurantMenuAgent");
        assert_eq!(json["capabilities"]["streaming"], false);
        assert_eq!(json["defaultInputModes"][1], "text/plain");
        assert_eq!(json["skills"][0]["id"], "menu_assistant");
    }
}
