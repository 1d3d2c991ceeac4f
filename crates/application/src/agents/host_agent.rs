//! Host agent - routes a request to the specialist agents and merges
//! their answers
//!
//! The LLM proposes a delegation plan; keyword routing takes over when it
//! can't. Delegates run one after another, each seeing the answers
//! gathered so far.

use std::{fmt, sync::Arc};

use async_stream::stream;
use domain::{AgentKind, ChatMessage, MessageRole};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{AgentEvent, AgentEventStream, AgentExecutor, AgentRequest, with_conversation};
use crate::{
    llm_json::extract_json,
    ports::{InferencePort, RemoteAgentInfo, RemoteAgentPort, RemoteReply},
};

const WEATHER_WORDS: &[&str] = &[
    "weather", "forecast", "rain", "temperature", "sunny", "wind", "storm", "alert",
];
const BEACH_WORDS: &[&str] = &["beach", "surf", "sand", "coast", "swim", "ocean", "snorkel"];
const PLANNING_WORDS: &[&str] = &[
    "plan", "party", "parties", "itinerary", "itineraries", "trip", "organize",
];

/// Endings a keyword may carry and still count ("windy", "beaches", "planning")
const WORD_ENDINGS: &[&str] = &[
    "", "s", "es", "y", "ny", "d", "ed", "ned", "er", "ner", "ing", "ning", "ming", "al",
];

const SYNTHESIS_PROMPT: &str = "You are the host of a beach party planning service. Combine the \
answers of the specialist agents into one helpful reply to the user. Keep the facts the agents \
gave, merge overlapping advice, and never invent weather data.";

/// One delegation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanStep {
    pub agent: String,
    pub task: String,
}

/// Orchestrator over the registered remote agents
pub struct HostAgent {
    inference: Arc<dyn InferencePort>,
    remote: Arc<dyn RemoteAgentPort>,
}

impl fmt::Debug for HostAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostAgent").finish_non_exhaustive()
    }
}

impl HostAgent {
    pub fn new(inference: Arc<dyn InferencePort>, remote: Arc<dyn RemoteAgentPort>) -> Self {
        Self { inference, remote }
    }
}

fn routing_prompt(agents: &[RemoteAgentInfo]) -> String {
    let roster: Vec<String> = agents
        .iter()
        .map(|a| {
            if a.skills.is_empty() {
                format!("- {}: {}", a.name, a.description)
            } else {
                format!("- {}: {} (skills: {})", a.name, a.description, a.skills.join(", "))
            }
        })
        .collect();
    format!(
        "You route requests for a beach party planning assistant to specialist agents.\n\
         Available agents:\n{}\n\n\
         Reply with a JSON array of steps in the order they should run:\n\
         [{{\"agent\": \"<exact agent name>\", \"task\": \"<what to ask that agent>\"}}]\n\
         Use only the agents listed and as few steps as the request needs.",
        roster.join("\n")
    )
}

fn find_agent<'a>(agents: &'a [RemoteAgentInfo], name: &str) -> Option<&'a RemoteAgentInfo> {
    agents
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name.trim()))
}

fn agent_for(agents: &[RemoteAgentInfo], kind: AgentKind) -> Option<&RemoteAgentInfo> {
    let needle = kind.as_str();
    agents
        .iter()
        .find(|a| a.name.to_ascii_lowercase().contains(needle))
}

/// Route by keywords: weather words to the weather agent, beach words to
/// the beach agent, everything else to the planner
pub fn keyword_plan(text: &str, agents: &[RemoteAgentInfo]) -> Vec<PlanStep> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |keywords: &[&str]| {
        words.iter().any(|word| {
            keywords.iter().any(|keyword| {
                word.strip_prefix(keyword)
                    .is_some_and(|ending| WORD_ENDINGS.contains(&ending))
            })
        })
    };

    let mut kinds = Vec::new();
    if mentions(WEATHER_WORDS) {
        kinds.push(AgentKind::Weather);
    }
    if mentions(BEACH_WORDS) {
        kinds.push(AgentKind::Beach);
    }
    if kinds.is_empty() || mentions(PLANNING_WORDS) {
        kinds.push(AgentKind::Planner);
    }

    let mut steps: Vec<PlanStep> = kinds
        .into_iter()
        .filter_map(|kind| agent_for(agents, kind))
        .map(|agent| PlanStep {
            agent: agent.name.clone(),
            task: text.to_string(),
        })
        .collect();
    if steps.is_empty() {
        if let Some(first) = agents.first() {
            steps.push(PlanStep {
                agent: first.name.clone(),
                task: text.to_string(),
            });
        }
    }
    steps
}

/// Parse the LLM's plan, keeping only steps for known agents
fn parse_plan(response: &str, agents: &[RemoteAgentInfo]) -> Vec<PlanStep> {
    match serde_json::from_str::<Vec<PlanStep>>(extract_json(response)) {
        Ok(steps) => steps
            .into_iter()
            .filter_map(|step| {
                let agent = find_agent(agents, &step.agent)?;
                if step.task.trim().is_empty() {
                    return None;
                }
                Some(PlanStep {
                    agent: agent.name.clone(),
                    task: step.task,
                })
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "Routing reply is not a plan");
            Vec::new()
        },
    }
}

#[instrument(skip_all, fields(agents = agents.len()))]
async fn plan(
    inference: &Arc<dyn InferencePort>,
    text: &str,
    agents: &[RemoteAgentInfo],
) -> Vec<PlanStep> {
    let steps = match inference
        .generate_with_system(&routing_prompt(agents), text)
        .await
    {
        Ok(result) => parse_plan(&result.content, agents),
        Err(e) => {
            warn!(error = %e, "Routing model unavailable");
            Vec::new()
        },
    };
    if steps.is_empty() {
        debug!("Falling back to keyword routing");
        return keyword_plan(text, agents);
    }
    steps
}

/// The delegate whose question we relayed last, if the user is answering it
fn pending_delegate<'a>(
    history: &[ChatMessage],
    agents: &'a [RemoteAgentInfo],
) -> Option<&'a RemoteAgentInfo> {
    let last = history.last()?;
    if last.role != MessageRole::Assistant {
        return None;
    }
    let (name, _) = last.content.split_once(": ")?;
    find_agent(agents, name)
}

fn with_earlier_answers(task: &str, replies: &[RemoteReply]) -> String {
    if replies.is_empty() {
        return task.to_string();
    }
    let context: Vec<String> = replies
        .iter()
        .map(|r| format!("{}: {}", r.agent, r.text))
        .collect();
    format!("{task}\n\nContext from other agents:\n{}", context.join("\n"))
}

fn combined_answers(replies: &[RemoteReply]) -> String {
    if let [only] = replies {
        return only.text.clone();
    }
    replies
        .iter()
        .map(|r| format!("### {}\n{}", r.agent, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl AgentExecutor for HostAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Host
    }

    fn execute(&self, request: AgentRequest) -> AgentEventStream {
        let inference = Arc::clone(&self.inference);
        let remote = Arc::clone(&self.remote);

        Box::pin(stream! {
            yield AgentEvent::Working("Choosing agents".to_string());

            let agents = match remote.agents().await {
                Ok(agents) if !agents.is_empty() => agents,
                Ok(_) => {
                    yield AgentEvent::Failed("No remote agents are registered.".to_string());
                    return;
                },
                Err(e) => {
                    yield AgentEvent::Failed(format!("Remote agents are unavailable: {e}"));
                    return;
                },
            };

            let steps = match pending_delegate(&request.history, &agents) {
                Some(agent) => vec![PlanStep {
                    agent: agent.name.clone(),
                    task: request.text.clone(),
                }],
                None => {
                    let text = with_conversation(&request.history, &request.text);
                    plan(&inference, &text, &agents).await
                },
            };
            info!(steps = ?steps.iter().map(|s| s.agent.as_str()).collect::<Vec<_>>(), "Delegation plan");

            let mut replies: Vec<RemoteReply> = Vec::new();
            let mut failures: Vec<String> = Vec::new();
            for step in steps {
                yield AgentEvent::Working(format!("Asking {}", step.agent));
                let message = with_earlier_answers(&step.task, &replies);
                match remote
                    .send(&step.agent, &message, Some(request.context_id.clone()))
                    .await
                {
                    Ok(reply) if reply.needs_input() => {
                        yield AgentEvent::InputRequired(format!("{}: {}", reply.agent, reply.text));
                        return;
                    },
                    Ok(reply) if reply.is_answer() => replies.push(reply),
                    Ok(reply) => {
                        warn!(agent = %reply.agent, state = ?reply.state, "Delegate did not answer");
                        failures.push(format!("{} could not answer ({})", reply.agent, reply.text));
                    },
                    Err(e) => {
                        warn!(agent = %step.agent, error = %e, "Delegation failed");
                        failures.push(format!("{} is unavailable ({e})", step.agent));
                    },
                }
            }

            if replies.is_empty() {
                yield AgentEvent::Failed(format!("No agent could answer: {}", failures.join("; ")));
                return;
            }

            let mut prompt = format!("User request: {}\n\nAgent answers:\n{}", request.text, combined_answers(&replies));
            if !failures.is_empty() {
                prompt.push_str(&format!("\n\nUnavailable: {}", failures.join("; ")));
            }

            let mut emitted = false;
            match inference.stream_with_system(SYNTHESIS_PROMPT, &prompt).await {
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
                                warn!(error = %e, "Synthesis stream broke off");
                                break;
                            },
                        }
                    }
                },
                Err(e) => warn!(error = %e, "Synthesis unavailable, returning agent answers"),
            }
            if !emitted {
                yield AgentEvent::Chunk(combined_answers(&replies));
            }
            yield AgentEvent::Completed;
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use protocol_a2a::TaskState;

    use super::*;
    use crate::{
        agents::test_support::{answer, chunks, result, run},
        error::ApplicationError,
        ports::{MockInferencePort, MockRemoteAgentPort},
    };

    fn roster() -> Vec<RemoteAgentInfo> {
        ["Weather Agent", "Beach Agent", "Planner Agent"]
            .into_iter()
            .map(|name| RemoteAgentInfo {
                name: name.to_string(),
                description: format!("{name} description"),
                url: "http://localhost".to_string(),
                skills: vec![],
            })
            .collect()
    }

    fn reply(agent: &str, text: &str) -> RemoteReply {
        RemoteReply {
            agent: agent.to_string(),
            text: text.to_string(),
            state: TaskState::Completed,
            task_id: Some("t".into()),
        }
    }

    #[test]
    fn keyword_routing() {
        let agents = roster();
        let names = |text: &str| -> Vec<String> {
            keyword_plan(text, &agents).into_iter().map(|s| s.agent).collect()
        };
        assert_eq!(names("Will it rain in Miami?"), vec!["Weather Agent"]);
        assert_eq!(names("Best surf beach near Lisbon"), vec!["Beach Agent"]);
        assert_eq!(names("hello there"), vec!["Planner Agent"]);
        assert_eq!(
            names("Plan a beach party if the weather is good"),
            vec!["Weather Agent", "Beach Agent", "Planner Agent"]
        );
        assert_eq!(names("Windy and stormy, any surfing?"), vec!["Weather Agent", "Beach Agent"]);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let agents = roster();
        let names = |text: &str| -> Vec<String> {
            keyword_plan(text, &agents).into_iter().map(|s| s.agent).collect()
        };
        assert_eq!(names("a thousand guests"), vec!["Planner Agent"]);
        assert_eq!(names("seats by the window"), vec!["Planner Agent"]);
        assert_eq!(names("which planet is brightest?"), vec!["Planner Agent"]);
        assert_eq!(names("Sunset at the BEACH!"), vec!["Beach Agent"]);
    }

    #[test]
    fn plan_drops_unknown_agents() {
        let steps = parse_plan(
            r#"```json
[{"agent": "weather agent", "task": "Forecast for Malibu"},
 {"agent": "Surf Agent", "task": "Waves?"}]
```"#,
            &roster(),
        );
        assert_eq!(
            steps,
            vec![PlanStep {
                agent: "Weather Agent".into(),
                task: "Forecast for Malibu".into()
            }]
        );
        assert!(parse_plan("I would ask the weather agent", &roster()).is_empty());
    }

    #[tokio::test]
    async fn delegates_in_order_and_synthesises() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system().returning(|_, _| {
            Ok(result(
                r#"[{"agent": "Weather Agent", "task": "Weekend forecast for Malibu"},
                    {"agent": "Planner Agent", "task": "Plan a party in Malibu"}]"#,
            ))
        });
        llm.expect_stream_with_system()
            .withf(|_, prompt| prompt.contains("### Weather Agent\nSunny") && prompt.contains("### Planner Agent"))
            .returning(|_, _| Ok(chunks(&["Sunny weekend, ", "party on!"])));

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        let mut seq = mockall::Sequence::new();
        remote
            .expect_send()
            .withf(|agent, text, ctx| {
                agent == "Weather Agent" && text == "Weekend forecast for Malibu" && ctx.is_some()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|agent, _, _| Ok(reply(agent, "Sunny, 28C")));
        remote
            .expect_send()
            .withf(|agent, text, _| {
                agent == "Planner Agent" && text.contains("Context from other agents:\nWeather Agent: Sunny, 28C")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|agent, _, _| Ok(reply(agent, "Bring a grill")));

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("Beach party in Malibu this weekend?")).await;
        assert_eq!(answer(&events), "Sunny weekend, party on!");
        assert!(events.contains(&AgentEvent::Working("Asking Weather Agent".into())));
        assert_eq!(events.last(), Some(&AgentEvent::Completed));
    }

    #[tokio::test]
    async fn routing_failure_uses_keywords_and_synthesis_failure_concatenates() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system()
            .returning(|_, _| Err(ApplicationError::Inference("down".into())));
        llm.expect_stream_with_system()
            .returning(|_, _| Err(ApplicationError::Inference("down".into())));

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote
            .expect_send()
            .withf(|agent, _, _| agent == "Beach Agent")
            .returning(|agent, _, _| Ok(reply(agent, "Zuma Beach is wide and sandy.")));

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("a quiet beach near LA")).await;
        assert_eq!(answer(&events), "Zuma Beach is wide and sandy.");
    }

    #[tokio::test]
    async fn delegate_question_is_surfaced_and_answer_routed_back() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system()
            .returning(|_, _| Ok(result(r#"[{"agent": "Weather Agent", "task": "weather?"}]"#)));

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote.expect_send().returning(|agent, _, _| {
            Ok(RemoteReply {
                state: TaskState::InputRequired,
                ..reply(agent, "Which city or location would you like the weather for?")
            })
        });

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("how's the weather?")).await;
        let Some(AgentEvent::InputRequired(question)) = events.last() else {
            panic!("expected a question, got {events:?}");
        };
        assert!(question.starts_with("Weather Agent: Which city"));

        // The follow-up goes straight to the agent that asked
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system().never();
        llm.expect_stream_with_system()
            .returning(|_, _| Ok(chunks(&["Miami: sunny."])));
        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote
            .expect_send()
            .withf(|agent, text, _| agent == "Weather Agent" && text == "Miami")
            .times(1)
            .returning(|agent, _, _| Ok(reply(agent, "Sunny in Miami")));

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let request = AgentRequest::new("Miami").with_history(vec![
            ChatMessage::user("how's the weather?"),
            ChatMessage::assistant(question.clone()),
        ]);
        assert_eq!(answer(&run(&host, request).await), "Miami: sunny.");
    }

    #[tokio::test]
    async fn all_delegates_down_fails() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system()
            .returning(|_, _| Ok(result(r#"[{"agent": "Planner Agent", "task": "hi"}]"#)));

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote
            .expect_send()
            .returning(|_, _, _| Err(ApplicationError::ExternalService("connection refused".into())));

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("hi")).await;
        assert!(matches!(
            events.last(),
            Some(AgentEvent::Failed(reason)) if reason.contains("Planner Agent is unavailable")
        ));
    }

    #[tokio::test]
    async fn failed_delegate_is_not_an_answer() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system()
            .returning(|_, _| Ok(result(r#"[{"agent": "Weather Agent", "task": "Lisbon weather"}]"#)));
        llm.expect_stream_with_system().never();

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote.expect_send().returning(|agent, _, _| {
            Ok(RemoteReply {
                state: TaskState::Failed,
                ..reply(agent, "Weather data for Lisbon is unavailable right now: HTTP 503")
            })
        });

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("Lisbon beach day?")).await;
        assert!(answer(&events).is_empty());
        assert!(matches!(
            events.last(),
            Some(AgentEvent::Failed(reason))
                if reason.starts_with("No agent could answer")
                    && reason.contains("Weather Agent could not answer (Weather data for Lisbon")
        ));
    }

    #[tokio::test]
    async fn failed_delegate_is_reported_next_to_answers() {
        let mut llm = MockInferencePort::new();
        llm.expect_generate_with_system().returning(|_, _| {
            Ok(result(
                r#"[{"agent": "Weather Agent", "task": "forecast"},
                    {"agent": "Beach Agent", "task": "beaches"}]"#,
            ))
        });
        llm.expect_stream_with_system()
            .withf(|_, prompt| {
                prompt.contains("Agent answers:\nPraia da Rocha")
                    && !prompt.contains("Agent answers:\nWeather")
                    && prompt.contains("Unavailable: Weather Agent could not answer")
            })
            .returning(|_, _| Ok(chunks(&["Try Praia da Rocha."])));

        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(roster()));
        remote
            .expect_send()
            .withf(|agent, _, _| agent == "Weather Agent")
            .returning(|agent, _, _| {
                Ok(RemoteReply {
                    state: TaskState::Rejected,
                    ..reply(agent, "No forecast provider")
                })
            });
        remote
            .expect_send()
            .withf(|agent, text, _| agent == "Beach Agent" && !text.contains("No forecast provider"))
            .returning(|agent, _, _| Ok(reply(agent, "Praia da Rocha")));

        let host = HostAgent::new(Arc::new(llm), Arc::new(remote));
        let events = run(&host, AgentRequest::new("Algarve beach?")).await;
        assert_eq!(answer(&events), "Try Praia da Rocha.");
        assert_eq!(events.last(), Some(&AgentEvent::Completed));
    }

    #[tokio::test]
    async fn no_agents_registered() {
        let mut remote = MockRemoteAgentPort::new();
        remote.expect_agents().returning(|| Ok(vec![]));
        let host = HostAgent::new(Arc::new(MockInferencePort::new()), Arc::new(remote));
        let events = run(&host, AgentRequest::new("hi")).await;
        assert_eq!(
            events.last(),
            Some(&AgentEvent::Failed("No remote agents are registered.".into()))
        );
    }
}
