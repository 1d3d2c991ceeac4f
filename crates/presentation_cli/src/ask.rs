//! A2A client commands

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::Context;
use futures::StreamExt;
use protocol_a2a::{A2aClient, Message, StreamResponse, TaskState, TaskStatus};

/// Options of the `ask` command
#[derive(Debug, Clone)]
pub struct AskOptions {
    pub stream: bool,
    pub context_id: Option<String>,
    pub timeout: Duration,
}

/// What to show for one stream event
#[derive(Debug, PartialEq, Eq)]
enum Output {
    /// Part of the answer, printed to stdout as it arrives
    Answer(String),
    /// Progress or outcome note, printed to stderr
    Note(String),
}

const fn state_label(state: TaskState) -> &'static str {
    match state {
        TaskState::Submitted => "submitted",
        TaskState::Working => "working",
        TaskState::InputRequired => "input required",
        TaskState::Completed => "completed",
        TaskState::Canceled => "canceled",
        TaskState::Failed => "failed",
        TaskState::Rejected => "rejected",
        TaskState::AuthRequired => "auth required",
        TaskState::Unknown => "unknown",
    }
}

/// A completed status carries the answer again; everything else is a note
fn status_note(status: &TaskStatus) -> Option<Output> {
    let text = status.message.as_ref().map(Message::text)?;
    match status.state {
        TaskState::Completed => None,
        TaskState::Working => Some(Output::Note(format!("... {text}"))),
        state => Some(Output::Note(format!("[{}] {text}", state_label(state)))),
    }
}

fn render(event: &StreamResponse) -> Option<Output> {
    match event {
        StreamResponse::Task(_) => None,
        StreamResponse::Message(message) => Some(Output::Answer(message.text())),
        StreamResponse::ArtifactUpdate(update) => Some(Output::Answer(update.artifact.text())),
        StreamResponse::StatusUpdate(update) => status_note(&update.status),
    }
}

fn context_of(event: &StreamResponse) -> Option<&str> {
    match event {
        StreamResponse::Task(task) => Some(&task.context_id),
        StreamResponse::StatusUpdate(update) => Some(&update.context_id),
        StreamResponse::ArtifactUpdate(update) => Some(&update.context_id),
        StreamResponse::Message(message) => message.context_id.as_deref(),
    }
}

/// Send `text` to the agent at `url` and print its answer
pub async fn ask(url: &str, text: &str, options: AskOptions) -> anyhow::Result<()> {
    let client = A2aClient::connect(url, options.timeout)
        .await
        .with_context(|| format!("Failed to reach agent at {url}"))?;

    let mut message = Message::user_text(text);
    if let Some(context_id) = options.context_id {
        message = message.with_context_id(context_id);
    }

    if !options.stream {
        let result = client.send_message(message, None).await?;
        println!("{}", result.text());
        if let protocol_a2a::SendMessageResult::Task(task) = &result {
            if let Some(Output::Note(note)) = status_note(&task.status) {
                eprintln!("{note}");
            }
            eprintln!("context: {}", task.context_id);
        }
        return Ok(());
    }

    let mut events = client.stream_message(message).await?;
    let mut context_id = None;
    let mut stdout = io::stdout();
    while let Some(event) = events.next().await {
        let event = event?;
        if context_id.is_none() {
            context_id = context_of(&event).map(str::to_string);
        }
        match render(&event) {
            Some(Output::Answer(chunk)) => {
                print!("{chunk}");
                stdout.flush()?;
            },
            Some(Output::Note(note)) => eprintln!("{note}"),
            None => {},
        }
        if event.is_final() {
            break;
        }
    }
    println!();
    if let Some(context_id) = context_id {
        eprintln!("context: {context_id}");
    }
    Ok(())
}

/// Print the agent card served at `url`
pub async fn print_card(url: &str) -> anyhow::Result<()> {
    let card = A2aClient::resolve_card(url)
        .await
        .with_context(|| format!("Failed to fetch agent card from {url}"))?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use protocol_a2a::{
        AgentCard, Artifact, Part, TaskArtifactUpdateEvent, TaskStatusUpdateEvent,
    };
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    fn status_update(state: TaskState, text: Option<&str>, is_final: bool) -> StreamResponse {
        StreamResponse::StatusUpdate(TaskStatusUpdateEvent {
            task_id: "t".into(),
            context_id: "c".into(),
            status: TaskStatus::new(state, text.map(Message::agent_text)),
            is_final,
        })
    }

    #[test]
    fn artifact_chunks_are_answer_text() {
        let event = StreamResponse::ArtifactUpdate(TaskArtifactUpdateEvent {
            task_id: "t".into(),
            context_id: "c".into(),
            artifact: Artifact {
                artifact_id: "a".into(),
                name: Some("response".into()),
                description: None,
                parts: vec![Part::text("Sunny, 24°C")],
                metadata: None,
            },
            append: true,
            last_chunk: false,
        });
        assert_eq!(render(&event), Some(Output::Answer("Sunny, 24°C".into())));
        assert_eq!(context_of(&event), Some("c"));
    }

    #[test]
    fn completed_status_does_not_repeat_the_answer() {
        let event = status_update(TaskState::Completed, Some("the whole answer"), true);
        assert_eq!(render(&event), None);
    }

    #[test]
    fn questions_and_progress_become_notes() {
        let question = status_update(TaskState::InputRequired, Some("Which city?"), true);
        assert_eq!(
            render(&question),
            Some(Output::Note("[input required] Which city?".into()))
        );

        let progress = status_update(TaskState::Working, Some("Asking Weather Agent"), false);
        assert_eq!(
            render(&progress),
            Some(Output::Note("... Asking Weather Agent".into()))
        );

        assert_eq!(render(&status_update(TaskState::Working, None, false)), None);
    }

    #[tokio::test]
    async fn print_card_resolves_the_card() {
        let server = MockServer::start().await;
        let card = AgentCard::builder("Beach Agent", format!("{}/", server.uri())).build();
        Mock::given(method("GET"))
            .and(path("/.well-known/agent.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&card))
            .expect(1)
            .mount(&server)
            .await;

        print_card(&server.uri()).await.unwrap();
    }

    #[tokio::test]
    async fn print_card_reports_unreachable_agents() {
        let server = MockServer::start().await;
        let err = print_card(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch agent card"));
    }
}
