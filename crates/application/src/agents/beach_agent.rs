//! Beach agent - beach recommendations from LLM research notes
//!
//! Research is a plain LLM call standing in for a web search; its notes are
//! then handed to the answering prompt.

use std::{fmt, sync::Arc};

use async_stream::stream;
use domain::AgentKind;
use futures::StreamExt;
use tracing::{info, warn};

use super::{AgentEvent, AgentEventStream, AgentExecutor, AgentRequest, with_conversation};
use crate::ports::InferencePort;

/// Answer when the non-streaming call fails
pub const RETRIEVAL_FAILED: &str = "Failed to retrieve information.";

/// Answer when the streaming call fails
pub const STREAMING_FAILED: &str = "Streaming error occurred.";

const SYSTEM_INSTRUCTION: &str = "You are a specialized assistant for beach information. \
Use the provided web search results to respond accurately.";

const RESEARCH_PROMPT: &str = "You are an excellent beach information assistant. Search the \
internet for the query you are given and gather the relevant information. Focus on facts about \
beaches: location, water and surf conditions, amenities, access and safety. Do not deliberate; \
summarise the findings quickly.";

/// Agent answering beach questions
pub struct BeachAgent {
    inference: Arc<dyn InferencePort>,
}

impl fmt::Debug for BeachAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeachAgent")
            .field("model", &self.inference.current_model())
            .finish()
    }
}

impl BeachAgent {
    pub fn new(inference: Arc<dyn InferencePort>) -> Self {
        Self { inference }
    }
}

/// Research notes for the query; empty when research fails
async fn research(inference: &Arc<dyn InferencePort>, query: &str) -> String {
    info!(query_len = query.len(), "Researching beach information");
    match inference
        .generate_with_system(RESEARCH_PROMPT, &format!("Query: {query}"))
        .await
    {
        Ok(result) if !result.content.trim().is_empty() => {
            info!(notes_len = result.content.len(), "Research returned notes");
            result.content
        },
        Ok(_) => {
            warn!("Research returned no content");
            String::new()
        },
        Err(e) => {
            warn!(error = %e, "Research failed");
            String::new()
        },
    }
}

impl AgentExecutor for BeachAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Beach
    }

    fn execute(&self, request: AgentRequest) -> AgentEventStream {
        let inference = Arc::clone(&self.inference);

        Box::pin(stream! {
            yield AgentEvent::Working("Searching for beach information".to_string());

            let notes = research(&inference, &request.text).await;
            let question = with_conversation(&request.history, &request.text);
            let prompt = format!("Web results:\n{notes}\nAnswer the question: {question}");

            if request.streaming {
                match inference.stream_with_system(SYSTEM_INSTRUCTION, &prompt).await {
                    Ok(mut chunks) => {
                        while let Some(chunk) = chunks.next().await {
                            match chunk {
                                Ok(text) => {
                                    if !text.is_empty() {
                                        yield AgentEvent::Chunk(text);
                                    }
                                },
                                Err(e) => {
                                    warn!(error = %e, "Error during streaming");
                                    yield AgentEvent::Chunk(STREAMING_FAILED.to_string());
                                    break;
                                },
                            }
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Error during streaming");
                        yield AgentEvent::Chunk(STREAMING_FAILED.to_string());
                    },
                }
            } else {
                match inference.generate_with_system(SYSTEM_INSTRUCTION, &prompt).await {
                    Ok(result) => {
                        yield AgentEvent::Chunk(result.content);
                    },
                    Err(e) => {
                        warn!(error = %e, "Answer generation failed");
                        yield AgentEvent::Chunk(RETRIEVAL_FAILED.to_string());
                    },
                }
            }

            yield AgentEvent::Completed;
        })
    }
}
