//! Agent card: the self-description an agent serves at `/.well-known/agent.json`

use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

/// Something the agent can do, with sample prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl AgentSkill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProvider {
    pub organization: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    /// JSON-RPC endpoint
    pub url: String,
    pub version: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_transport")]
    pub preferred_transport: String,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

fn default_transport() -> String {
    "JSONRPC".to_string()
}

impl AgentCard {
    pub fn builder(name: impl Into<String>, url: impl Into<String>) -> AgentCardBuilder {
        AgentCardBuilder::new(name, url)
    }

    /// Whether the agent accepts the given input mode (e.g. `text/plain`)
    #[must_use]
    pub fn accepts(&self, mode: &str) -> bool {
        self.default_input_modes.is_empty() || self.default_input_modes.iter().any(|m| m == mode)
    }
}

/// Fluent construction of an [`AgentCard`]
#[derive(Debug, Clone)]
pub struct AgentCardBuilder {
    card: AgentCard,
}

impl AgentCardBuilder {
    fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            card: AgentCard {
                name: name.into(),
                description: String::new(),
                url: url.into(),
                version: "1.0.0".to_string(),
                protocol_version: default_protocol_version(),
                preferred_transport: default_transport(),
                default_input_modes: vec!["text".to_string(), "text/plain".to_string()],
                default_output_modes: vec!["text".to_string(), "text/plain".to_string()],
                capabilities: AgentCapabilities::default(),
                skills: Vec::new(),
                provider: None,
            },
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.card.description = description.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.card.version = version.into();
        self
    }

    #[must_use]
    pub const fn streaming(mut self, enabled: bool) -> Self {
        self.card.capabilities.streaming = enabled;
        self
    }

    #[must_use]
    pub const fn push_notifications(mut self, enabled: bool) -> Self {
        self.card.capabilities.push_notifications = enabled;
        self
    }

    #[must_use]
    pub const fn state_transition_history(mut self, enabled: bool) -> Self {
        self.card.capabilities.state_transition_history = enabled;
        self
    }

    #[must_use]
    pub fn skill(mut self, skill: AgentSkill) -> Self {
        self.card.skills.push(skill);
        self
    }

    #[must_use]
    pub fn provider(mut self, organization: impl Into<String>, url: impl Into<String>) -> Self {
        self.card.provider = Some(AgentProvider {
            organization: organization.into(),
            url: url.into(),
        });
        self
    }

    pub fn build(self) -> AgentCard {
        self.card
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn beach_card() -> AgentCard {
        AgentCard::builder("Beach Agent", "http://localhost:10002/")
            .description("Helps with beach searching")
            .streaming(true)
            .skill(
                AgentSkill::new("beach_search", "Search for beaches", "Helps with beach searching")
                    .with_tags(["beach search"])
                    .with_examples(["Please find a beach near Tokyo."]),
            )
            .build()
    }

    #[test]
    fn serializes_camel_case_fields() {
        let json = serde_json::to_value(beach_card()).unwrap();
        assert_eq!(json["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(json["preferredTransport"], "JSONRPC");
        assert_eq!(json["capabilities"]["streaming"], true);
        assert_eq!(json["capabilities"]["pushNotifications"], false);
        assert_eq!(json["defaultInputModes"][1], "text/plain");
        assert_eq!(json["skills"][0]["id"], "beach_search");
    }

    #[test]
    fn minimal_card_fills_defaults() {
        let card: AgentCard = serde_json::from_str(
            r#"{"name":"x","description":"y","url":"http://h/","version":"0.1"}"#,
        )
        .unwrap();
        assert_eq!(card.protocol_version, PROTOCOL_VERSION);
        assert!(!card.capabilities.streaming);
        assert!(card.accepts("application/json"));
    }

    #[test]
    fn accepts_checks_input_modes() {
        let card = beach_card();
        assert!(card.accepts("text/plain"));
        assert!(!card.accepts("image/png"));
    }
}
