//! Messages, tasks, artifacts and streaming events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// File payload, inline (base64) or by reference
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// One piece of message or artifact content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },
    File {
        file: FileContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },
    Data {
        data: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Text content, if this is a text part
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

fn join_text(parts: &[Part]) -> String {
    parts.iter().filter_map(Part::as_text).collect::<String>()
}

/// A single conversational turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Message {
    /// New text message with a fresh id
    pub fn new_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            message_id: Uuid::new_v4().to_string(),
            task_id: None,
            context_id: None,
            metadata: None,
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new_text(Role::User, text)
    }

    pub fn agent_text(text: impl Into<String>) -> Self {
        Self::new_text(Role::Agent, text)
    }

    #[must_use]
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Concatenated text of all text parts
    #[must_use]
    pub fn text(&self) -> String {
        join_text(&self.parts)
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    Unknown,
}

impl TaskState {
    /// No further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Rejected
        )
    }

    /// The turn is over: terminal, or waiting on the caller
    #[must_use]
    pub const fn is_final(self) -> bool {
        self.is_terminal() || matches!(self, Self::InputRequired | Self::AuthRequired)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TaskStatus {
    /// Status stamped with the current time
    pub fn new(state: TaskState, message: Option<Message>) -> Self {
        Self {
            state,
            message,
            timestamp: Some(Utc::now()),
        }
    }
}

/// Output produced by a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Artifact {
    #[must_use]
    pub fn text(&self) -> String {
        join_text(&self.parts)
    }
}

/// A unit of work tracked by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Task {
    /// Best-effort answer text: artifacts first, then the status message
    #[must_use]
    pub fn text(&self) -> String {
        let from_artifacts: String = self.artifacts.iter().map(Artifact::text).collect();
        if !from_artifacts.is_empty() {
            return from_artifacts;
        }
        self.status
            .message
            .as_ref()
            .map(Message::text)
            .unwrap_or_default()
    }

    /// Drop all but the last `history_length` history entries
    ///
    /// `None` keeps the whole history.
    pub fn keep_last_history(&mut self, history_length: Option<usize>) {
        if let Some(keep) = history_length {
            let len = self.history.len();
            if keep < len {
                self.history.drain(..len - keep);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub artifact: Artifact,
    /// Parts extend the artifact with the same id instead of replacing it
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub last_chunk: bool,
}

/// Result of `message/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SendMessageResult {
    #[serde(rename = "task")]
    Task(Task),
    #[serde(rename = "message")]
    Message(Message),
}

impl SendMessageResult {
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Task(task) => task.text(),
            Self::Message(message) => message.text(),
        }
    }
}

/// One event of a `message/stream` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StreamResponse {
    #[serde(rename = "task")]
    Task(Task),
    #[serde(rename = "message")]
    Message(Message),
    #[serde(rename = "status-update")]
    StatusUpdate(TaskStatusUpdateEvent),
    #[serde(rename = "artifact-update")]
    ArtifactUpdate(TaskArtifactUpdateEvent),
}

impl StreamResponse {
    /// Whether this event closes the stream
    #[must_use]
    pub const fn is_final(&self) -> bool {
        match self {
            Self::Message(_) => true,
            Self::StatusUpdate(update) => update.is_final,
            Self::Task(_) | Self::ArtifactUpdate(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn part_is_tagged_by_kind() {
        let json = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(json, json!({"kind": "text", "text": "hello"}));

        let data: Part = serde_json::from_value(json!({
            "kind": "data",
            "data": {"city": "Miami"}
        }))
        .unwrap();
        assert!(data.as_text().is_none());
    }

    #[test]
    fn history_is_trimmed_from_the_front() {
        let mut task = Task {
            id: "t".into(),
            context_id: "c".into(),
            status: TaskStatus::new(TaskState::Completed, None),
            artifacts: Vec::new(),
            history: vec![
                Message::user_text("one"),
                Message::agent_text("two"),
                Message::user_text("three"),
            ],
            metadata: None,
        };

        task.keep_last_history(None);
        assert_eq!(task.history.len(), 3);
        task.keep_last_history(Some(5));
        assert_eq!(task.history.len(), 3);
        task.keep_last_history(Some(1));
        assert_eq!(task.history.len(), 1);
        assert_eq!(task.history[0].text(), "three");
        task.keep_last_history(Some(0));
        assert!(task.history.is_empty());
    }

    #[test]
    fn message_uses_camel_case() {
        let msg = Message::user_text("hi").with_context_id("ctx-1");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["contextId"], "ctx-1");
        assert!(json.get("taskId").is_none());
        assert!(json["messageId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn task_state_kebab_case() {
        assert_eq!(
            serde_json::to_value(TaskState::InputRequired).unwrap(),
            json!("input-required")
        );
        assert!(TaskState::Canceled.is_terminal());
        assert!(!TaskState::InputRequired.is_terminal());
        assert!(TaskState::InputRequired.is_final());
        assert!(!TaskState::Working.is_final());
    }

    #[test]
    fn stream_response_kind_tags() {
        let event = StreamResponse::StatusUpdate(TaskStatusUpdateEvent {
            task_id: "t".into(),
            context_id: "c".into(),
            status: TaskStatus {
                state: TaskState::Completed,
                message: None,
                timestamp: None,
            },
            is_final: true,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "status-update");
        assert_eq!(json["final"], true);
        assert!(event.is_final());

        let back: StreamResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn send_result_parses_python_style_task() {
        let raw = json!({
            "kind": "task",
            "id": "task-1",
            "contextId": "ctx-1",
            "status": {"state": "completed", "timestamp": "2026-07-04T12:00:00Z"},
            "artifacts": [{
                "artifactId": "a1",
                "name": "response",
                "parts": [{"kind": "text", "text": "Sunny, "}, {"kind": "text", "text": "31°C"}]
            }],
            "history": []
        });
        let result: SendMessageResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.text(), "Sunny, 31°C");
    }

    #[test]
    fn task_text_falls_back_to_status_message() {
        let task = Task {
            id: "t".into(),
            context_id: "c".into(),
            status: TaskStatus::new(
                TaskState::InputRequired,
                Some(Message::agent_text("Which city?")),
            ),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: None,
        };
        assert_eq!(task.text(), "Which city?");
    }
}
