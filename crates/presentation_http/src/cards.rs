//! Agent cards advertised at `/.well-known/agent.json`

use domain::AgentKind;
use protocol_a2a::{AgentCard, AgentSkill};

const CARD_VERSION: &str = "1.0.0";

/// Card of `kind`, served from `url`
pub fn agent_card(kind: AgentKind, url: impl Into<String>) -> AgentCard {
    let (description, skill) = match kind {
        AgentKind::Weather => (
            "Provides weather forecasts and alerts for US and worldwide locations",
            AgentSkill::new(
                "weather_search",
                "Search weather",
                "Helps with weather forecasts, current conditions and alerts",
            )
            .with_tags(["weather", "forecast", "alerts"])
            .with_examples([
                "What's the weather like in Santa Monica this weekend?",
                "Give me a 5 day forecast for Nice",
                "Are there any weather alerts for FL?",
            ]),
        ),
        AgentKind::Beach => (
            "Helps with searching for beaches and answering related questions",
            AgentSkill::new(
                "beach_search",
                "Search for beaches",
                "Helps with beach search and related questions",
            )
            .with_tags(["beach information", "beach search"])
            .with_examples([
                "Please find a beach in California with good surfing conditions for tomorrow.",
                "What are the amenities at Bondi Beach?",
                "Show me family-friendly beaches near San Diego.",
            ]),
        ),
        AgentKind::Planner => (
            "Planner agent for planning beach parties",
            AgentSkill::new("planner", "planner agent", "planner agent")
                .with_tags(["planner agent"])
                .with_examples(["hello", "nice to meet you!"]),
        ),
        AgentKind::Travel => (
            "Travel planner for trips, itineraries and local tips",
            AgentSkill::new(
                "travel_planner",
                "travel planner agent",
                "Plans trips and answers travel questions",
            )
            .with_tags(["travel planner"])
            .with_examples(["Plan a three day trip to Lisbon"]),
        ),
        AgentKind::Host => (
            "Routes beach party requests to the weather, beach and planner agents",
            AgentSkill::new(
                "beach_party_host",
                "Beach party host",
                "Coordinates the other agents to plan a beach party",
            )
            .with_tags(["orchestration", "beach party"])
            .with_examples([
                "Plan a beach party in Santa Monica this Saturday",
                "Which beach near San Diego has the best weather tomorrow?",
            ]),
        ),
    };

    AgentCard::builder(kind.display_name(), url)
        .description(description)
        .version(CARD_VERSION)
        .streaming(true)
        .skill(skill)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beach_card_keeps_its_skill() {
        let card = agent_card(AgentKind::Beach, "http://localhost:10002/");
        assert_eq!(card.name, "Beach Agent");
        assert_eq!(card.url, "http://localhost:10002/");
        assert!(card.capabilities.streaming);
        assert!(!card.capabilities.push_notifications);

        let skill = &card.skills[0];
        assert_eq!(skill.id, "beach_search");
        assert_eq!(skill.name, "Search for beaches");
        assert_eq!(skill.examples.len(), 3);
    }

    #[test]
    fn every_agent_has_a_card() {
        for kind in AgentKind::ALL {
            let card = agent_card(kind, "http://localhost/");
            assert_eq!(card.name, kind.display_name());
            assert_eq!(card.skills.len(), 1);
            assert!(!card.description.is_empty());
        }
    }
}
