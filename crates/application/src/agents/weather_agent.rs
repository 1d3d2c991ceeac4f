//! Weather agent - forecasts and alerts, summarised by the LLM

use std::{fmt, sync::Arc};

use async_stream::stream;
use domain::{AgentKind, ChatMessage, MessageRole};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{AgentEvent, AgentEventStream, AgentExecutor, AgentRequest};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, WeatherPort},
    report_formatter::{format_report, format_state_alerts},
    weather_query::{WeatherQuery, WeatherQueryParser},
};

/// Question asked when no place can be found in the message
pub const ASK_LOCATION: &str = "Which city or location would you like the weather for?";

const SYSTEM_PROMPT: &str = "You are a friendly weather assistant for people planning a day at \
the beach. Answer the question using only the forecast data provided. Mention any active alerts \
first. Give temperatures, rain chances and wind where they matter, and say plainly whether the \
conditions suit the beach. Keep the answer short.";

/// Agent answering weather questions for any place
pub struct WeatherAgent {
    weather: Arc<dyn WeatherPort>,
    inference: Arc<dyn InferencePort>,
    parser: Arc<WeatherQueryParser>,
}

impl fmt::Debug for WeatherAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherAgent")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl WeatherAgent {
    pub fn new(
        weather: Arc<dyn WeatherPort>,
        inference: Arc<dyn InferencePort>,
        parser: WeatherQueryParser,
    ) -> Self {
        Self {
            weather,
            inference,
            parser: Arc::new(parser),
        }
    }
}

/// The user message we asked "which city?" about, if that was our last word
fn pending_question(history: &[ChatMessage]) -> Option<&str> {
    let (last, earlier) = history.split_last()?;
    if last.role != MessageRole::Assistant || !last.content.ends_with(ASK_LOCATION) {
        return None;
    }
    earlier
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
}

async fn understand(
    parser: &WeatherQueryParser,
    inference: &Arc<dyn InferencePort>,
    request: &AgentRequest,
) -> WeatherQuery {
    let Some(question) = pending_question(&request.history) else {
        return parser.parse_with_llm(inference, &request.text).await;
    };

    // The reply is usually a bare place name
    let answer = request.text.trim().trim_end_matches(['?', '.', '!']);
    let combined = parser.parse_quick(&format!("{question} in {answer}"));
    if combined.location.is_some() {
        return combined;
    }
    parser
        .parse_with_llm(inference, &format!("{question} {answer}"))
        .await
}

impl AgentExecutor for WeatherAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Weather
    }

    fn execute(&self, request: AgentRequest) -> AgentEventStream {
        let weather = Arc::clone(&self.weather);
        let inference = Arc::clone(&self.inference);
        let parser = Arc::clone(&self.parser);

        Box::pin(stream! {
            yield AgentEvent::Working("Checking the forecast".to_string());

            let query = understand(&parser, &inference, &request).await;
            debug!(?query, "Parsed weather query");

            let grounding = if let Some(state) = query.alerts_for {
                match weather.alerts(state).await {
                    Ok(alerts) => format_state_alerts(state, &alerts),
                    Err(e) => {
                        warn!(error = %e, state = state.code(), "Alert lookup failed");
                        yield AgentEvent::Failed(format!("Could not fetch weather alerts: {e}"));
                        return;
                    },
                }
            } else {
                let Some(name) = query.location else {
                    yield AgentEvent::InputRequired(ASK_LOCATION.to_string());
                    return;
                };

                let place = match weather.resolve_place(&name).await {
                    Ok(place) => place,
                    Err(ApplicationError::LocationNotFound(_)) => {
                        yield AgentEvent::InputRequired(format!(
                            "I couldn't find \"{name}\". {ASK_LOCATION}"
                        ));
                        return;
                    },
                    Err(e) => {
                        warn!(error = %e, location = %name, "Geocoding failed");
                        yield AgentEvent::Failed(format!("Could not look up \"{name}\": {e}"));
                        return;
                    },
                };

                yield AgentEvent::Working(format!("Fetching forecast for {}", place.display_name()));
                let mut report = match weather.forecast(&place, query.days).await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(error = %e, place = %place.display_name(), "Forecast failed");
                        yield AgentEvent::Failed(format!(
                            "Weather data for {} is unavailable right now: {e}",
                            place.display_name()
                        ));
                        return;
                    },
                };

                if report.alerts.is_empty() {
                    if let Some(state) = place.us_state() {
                        match weather.alerts(state).await {
                            Ok(alerts) => report.alerts = alerts,
                            Err(e) => warn!(error = %e, state = state.code(), "Skipping alerts"),
                        }
                    }
                }
                info!(
                    place = %place.display_name(),
                    source = report.source.attribution(),
                    days = query.days,
                    alerts = report.alerts.len(),
                    "Forecast retrieved"
                );
                format_report(&report)
            };

            let prompt = format!("Forecast data:\n{grounding}\n\nQuestion: {}", request.text);
            let mut emitted = false;
            let mut broken = false;
            match inference.stream_with_system(SYSTEM_PROMPT, &prompt).await {
                Ok(mut chunks) => {
                    while let Some(chunk) = chunks.next().await {
                        match chunk {
                            Ok(text) => {
                                if !text.is_empty() {
                                    emitted = true;
                                    yield AgentEvent::Chunk(text);
                                }
                            },
                            Err(e) => {
                                warn!(error = %e, "Summary stream broke off");
                                broken = true;
                                break;
                            },
                        }
                    }
                },
                Err(e) => warn!(error = %e, "LLM unavailable, answering with the raw report"),
            }

            if !emitted {
                yield AgentEvent::Chunk(grounding);
            } else if broken {
                yield AgentEvent::Chunk(format!("\n\n{grounding}"));
            }
            yield AgentEvent::Completed;
        })
    }
}
