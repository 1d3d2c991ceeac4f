//! Planner agent - persona-driven streaming chat

use std::{fmt, sync::Arc};

use async_stream::stream;
use domain::AgentKind;
use futures::StreamExt;
use tracing::warn;

use super::{AgentEvent, AgentEventStream, AgentExecutor, AgentRequest, with_conversation};
use crate::ports::InferencePort;

/// Answer when the model cannot be reached
pub const PLANNER_ERROR: &str = "Sorry, an error occurred while processing your request.";

const BEACH_PARTY_PROMPT: &str = "You are an expert in planning beach parties. Help the user plan \
a beach party that is fun and realistic, keeping the following in mind:
- Cover every part of the party: the choice of beach, activities, food, drinks, decorations and music.
- Respect the real constraints: budget, what the guests enjoy, the weather and the season.
- Honour local culture and customs, and keep the party safe as well as fun.
- Give concrete advice and suggestions the user can act on.";

const TRAVEL_PROMPT: &str = "You are an expert travel assistant for trip planning, destination \
information and travel recommendations. Help the user plan an enjoyable, safe and realistic trip \
that fits their preferences and constraints.

When giving information:
- Be specific and practical
- Account for seasonality, budget and logistics
- Point out cultural experiences and authentic local activities
- Include practical tips for the destination
- Use headings and bullet points where they help

For itineraries:
- Plan day by day and allow for travel time between sights
- Mix well-known sights with less visited ones
- Give approximate timings
- Suggest meals that feature local cuisine
- Consider weather, local events and opening hours

Stay helpful and enthusiastic but realistic, and say so when you are unsure.";

/// Which planner the agent plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerPersona {
    BeachParty,
    Travel,
}

impl PlannerPersona {
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::BeachParty => BEACH_PARTY_PROMPT,
            Self::Travel => TRAVEL_PROMPT,
        }
    }

    #[must_use]
    pub const fn kind(self) -> AgentKind {
        match self {
            Self::BeachParty => AgentKind::Planner,
            Self::Travel => AgentKind::Travel,
        }
    }
}

/// Agent that streams planning advice
pub struct PlannerAgent {
    inference: Arc<dyn InferencePort>,
    persona: PlannerPersona,
}

impl fmt::Debug for PlannerAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerAgent")
            .field("persona", &self.persona)
            .finish_non_exhaustive()
    }
}

impl PlannerAgent {
    pub fn new(inference: Arc<dyn InferencePort>, persona: PlannerPersona) -> Self {
        Self { inference, persona }
    }
}

impl AgentExecutor for PlannerAgent {
    fn kind(&self) -> AgentKind {
        self.persona.kind()
    }

    fn execute(&self, request: AgentRequest) -> AgentEventStream {
        let inference = Arc::clone(&self.inference);
        let system = self.persona.system_prompt();

        Box::pin(stream! {
            let message = with_conversation(&request.history, &request.text);
            match inference.stream_with_system(system, &message).await {
                Ok(mut chunks) => {
                    while let Some(chunk) = chunks.next().await {
                        match chunk {
                            Ok(text) => {
                                if !text.is_empty() {
                                    yield AgentEvent::Chunk(text);
                                }
                            },
                            Err(e) => {
                                warn!(error = %e, "Planner stream failed");
                                yield AgentEvent::Chunk(PLANNER_ERROR.to_string());
                                break;
                            },
                        }
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Planner model unavailable");
                    yield AgentEvent::Chunk(PLANNER_ERROR.to_string());
                },
            }
            yield AgentEvent::Completed;
        })
    }
}
