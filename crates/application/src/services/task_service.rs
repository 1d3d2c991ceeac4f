//! Task service - the A2A task lifecycle around one agent executor
//!
//! Every turn runs on its own tokio task, so a client that drops a
//! `message/stream` connection does not stop the agent; the finished task
//! stays readable through `tasks/get`.

use std::{collections::HashMap, fmt, pin::Pin, sync::Arc};

use domain::{AgentKind, ChatMessage};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use protocol_a2a::{
    Artifact, Message, Part, Role, StreamResponse, Task, TaskArtifactUpdateEvent, TaskState,
    TaskStatus, TaskStatusUpdateEvent,
};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    agents::{AgentEvent, AgentEventStream, AgentExecutor, AgentRequest},
    error::ApplicationError,
    ports::TaskStorePort,
};

/// Name of the artifact holding a turn's answer
pub const ARTIFACT_NAME: &str = "response";

/// Earlier messages of a context handed to the agent
const CONTEXT_HISTORY_LIMIT: usize = 20;

const EVENT_BUFFER: usize = 64;

/// Events of a `message/stream` turn
pub type TaskEventStream =
    Pin<Box<dyn Stream<Item = Result<StreamResponse, ApplicationError>> + Send>>;

/// Handle on a turn that is still running
#[derive(Clone)]
struct RunningTurn {
    token: CancellationToken,
    /// Flips to `true` once the turn has saved its final state
    finished: watch::Receiver<bool>,
}

impl RunningTurn {
    async fn stop(mut self) {
        self.token.cancel();
        if self.finished.wait_for(|done| *done).await.is_err() {
            debug!("Turn went away without reporting its end");
        }
    }
}

type RunningTasks = Arc<Mutex<HashMap<String, RunningTurn>>>;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Service handling `message/send`, `message/stream`, `tasks/get` and `tasks/cancel`
pub struct TaskService {
    executor: Arc<dyn AgentExecutor>,
    store: Arc<dyn TaskStorePort>,
    running: RunningTasks,
    /// Serializes task creation and continuation against idle cancels
    transitions: tokio::sync::Mutex<()>,
}

impl fmt::Debug for TaskService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskService")
            .field("agent", &self.executor.kind())
            .field("running", &self.running.lock().len())
            .finish_non_exhaustive()
    }
}

impl TaskService {
    pub fn new(executor: Arc<dyn AgentExecutor>, store: Arc<dyn TaskStorePort>) -> Self {
        Self {
            executor,
            store,
            running: Arc::new(Mutex::new(HashMap::new())),
            transitions: tokio::sync::Mutex::new(()),
        }
    }

    /// The agent behind this service
    pub fn agent_kind(&self) -> AgentKind {
        self.executor.kind()
    }

    /// Run a turn to the end and return the resulting task
    #[instrument(skip(self, message), fields(agent = %self.executor.kind()))]
    pub async fn send(&self, message: Message) -> Result<Task, ApplicationError> {
        let (task_id, mut events) = self.start(message, false).await?;
        while let Some(event) = events.next().await {
            event?;
        }

        self.store
            .get(&task_id)
            .await?
            .ok_or(ApplicationError::TaskNotFound(task_id))
    }

    /// Start a turn and return its events
    ///
    /// Validation errors are returned before any event is produced.
    #[instrument(skip(self, message), fields(agent = %self.executor.kind()))]
    pub async fn stream(&self, message: Message) -> Result<TaskEventStream, ApplicationError> {
        let (_, events) = self.start(message, true).await?;
        Ok(events)
    }

    /// Fetch a task, keeping only the last `history_length` history entries
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        task_id: &str,
        history_length: Option<usize>,
    ) -> Result<Task, ApplicationError> {
        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or_else(|| ApplicationError::TaskNotFound(task_id.to_string()))?;

        task.keep_last_history(history_length);
        Ok(task)
    }

    /// Cancel a task that has not reached a terminal state
    ///
    /// A running turn is stopped through its token and writes the final
    /// state itself; if it finished first, the task is not cancelable.
    #[instrument(skip(self))]
    pub async fn cancel(&self, task_id: &str) -> Result<Task, ApplicationError> {
        let mut stopped_turn = false;
        let _guard = loop {
            let guard = self.transitions.lock().await;
            let running = self.running.lock().get(task_id).cloned();
            let Some(turn) = running else {
                break guard;
            };
            drop(guard);
            turn.stop().await;
            stopped_turn = true;
        };

        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or_else(|| ApplicationError::TaskNotFound(task_id.to_string()))?;

        match task.status.state {
            TaskState::Canceled if stopped_turn => {
                info!(task_id, "Running task canceled");
                return Ok(task);
            },
            state if state.is_terminal() => {
                return Err(ApplicationError::TaskNotCancelable(task_id.to_string()));
            },
            _ => {},
        }

        task.status = TaskStatus::new(TaskState::Canceled, None);
        self.store.save(task.clone()).await?;
        info!(task_id, "Task canceled");
        Ok(task)
    }

    /// Prepare the task and spawn its turn, returning the task id and its events
    async fn start(
        &self,
        message: Message,
        streaming: bool,
    ) -> Result<(String, TaskEventStream), ApplicationError> {
        let _guard = self.transitions.lock().await;
        let (task, request) = self.prepare(message, streaming).await?;
        let task_id = task.id.clone();
        Ok((task_id, self.run(task, request)))
    }

    /// Validate the message, create or continue its task, and build the agent request
    async fn prepare(
        &self,
        message: Message,
        streaming: bool,
    ) -> Result<(Task, AgentRequest), ApplicationError> {
        let text = message.text();
        if text.trim().is_empty() {
            return Err(ApplicationError::InvalidParams(
                "Message must contain a non-empty text part".to_string(),
            ));
        }

        let (mut task, history) = match message.task_id.clone() {
            Some(task_id) => {
                let task = self
                    .store
                    .get(&task_id)
                    .await?
                    .ok_or_else(|| ApplicationError::TaskNotFound(task_id.clone()))?;
                if task.status.state.is_terminal() {
                    return Err(ApplicationError::InvalidParams(format!(
                        "Task {task_id} is in a terminal state ({:?})",
                        task.status.state
                    )));
                }
                if self.running.lock().contains_key(&task_id) {
                    return Err(ApplicationError::InvalidParams(format!(
                        "Task {task_id} is still running"
                    )));
                }
                let history = chat_history(&task.history);
                (task, history)
            },
            None => {
                let context_id = message.context_id.clone().unwrap_or_else(new_id);
                let history = self.context_history(&context_id).await?;
                let task = Task {
                    id: new_id(),
                    context_id,
                    status: TaskStatus::new(TaskState::Submitted, None),
                    artifacts: Vec::new(),
                    history: Vec::new(),
                    metadata: None,
                };
                (task, history)
            },
        };

        let message = message
            .with_task_id(task.id.clone())
            .with_context_id(task.context_id.clone());
        task.history.push(message);
        task.status = TaskStatus::new(TaskState::Submitted, None);
        self.store.save(task.clone()).await?;

        debug!(task_id = %task.id, context_id = %task.context_id, history = history.len(), "Task submitted");
        let request = AgentRequest {
            text,
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
            history,
            streaming,
        };
        Ok((task, request))
    }

    /// Messages of earlier tasks in the same context
    async fn context_history(&self, context_id: &str) -> Result<Vec<ChatMessage>, ApplicationError> {
        let tasks = self.store.list_by_context(context_id).await?;
        let messages: Vec<Message> = tasks.into_iter().flat_map(|t| t.history).collect();
        let mut history = chat_history(&messages);
        if history.len() > CONTEXT_HISTORY_LIMIT {
            history.drain(..history.len() - CONTEXT_HISTORY_LIMIT);
        }
        Ok(history)
    }

    fn run(&self, task: Task, request: AgentRequest) -> TaskEventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let token = CancellationToken::new();
        let (finished, finished_rx) = watch::channel(false);
        self.running.lock().insert(
            task.id.clone(),
            RunningTurn {
                token: token.clone(),
                finished: finished_rx,
            },
        );

        let turn = Turn {
            events: self.executor.execute(request),
            task,
            store: Arc::clone(&self.store),
            running: Arc::clone(&self.running),
            token,
            finished,
            tx,
            consumer_gone: false,
        };
        tokio::spawn(turn.drive());

        ReceiverStream::new(rx).boxed()
    }
}

fn chat_history(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::User => ChatMessage::user(m.text()),
            Role::Agent => ChatMessage::assistant(m.text()),
        })
        .collect()
}

/// How a turn ended
enum TurnEnd {
    Agent(AgentEvent),
    Canceled,
}

/// One running turn of a task
struct Turn {
    task: Task,
    events: AgentEventStream,
    store: Arc<dyn TaskStorePort>,
    running: RunningTasks,
    token: CancellationToken,
    finished: watch::Sender<bool>,
    tx: mpsc::Sender<Result<StreamResponse, ApplicationError>>,
    consumer_gone: bool,
}

impl Turn {
    async fn drive(mut self) {
        let task_id = self.task.id.clone();
        if let Err(e) = self.run_to_end().await {
            warn!(task_id = %task_id, error = %e, "Task turn failed");
            self.emit(Err(e)).await;
        }
        self.running.lock().remove(&task_id);
        self.finished.send_replace(true);
    }

    async fn emit(&mut self, item: Result<StreamResponse, ApplicationError>) {
        if self.consumer_gone {
            return;
        }
        if self.tx.send(item).await.is_err() {
            debug!(task_id = %self.task.id, "Stream consumer went away, finishing in background");
            self.consumer_gone = true;
        }
    }

    fn status_update(&self, is_final: bool) -> StreamResponse {
        StreamResponse::StatusUpdate(TaskStatusUpdateEvent {
            task_id: self.task.id.clone(),
            context_id: self.task.context_id.clone(),
            status: self.task.status.clone(),
            is_final,
        })
    }

    fn agent_message(&self, text: impl Into<String>) -> Message {
        Message::agent_text(text)
            .with_task_id(self.task.id.clone())
            .with_context_id(self.task.context_id.clone())
    }

    async fn set_status(&mut self, state: TaskState, message: Option<Message>) -> Result<(), ApplicationError> {
        self.task.status = TaskStatus::new(state, message);
        self.store.save(self.task.clone()).await
    }

    async fn run_to_end(&mut self) -> Result<(), ApplicationError> {
        let snapshot = StreamResponse::Task(self.task.clone());
        self.emit(Ok(snapshot)).await;

        self.set_status(TaskState::Working, None).await?;
        let update = self.status_update(false);
        self.emit(Ok(update)).await;

        let artifact_id = new_id();
        let mut answer = String::new();
        let mut chunks_sent = false;

        let end = loop {
            let next = tokio::select! {
                biased;
                () = self.token.cancelled() => None,
                event = self.events.next() => Some(event.unwrap_or(AgentEvent::Completed)),
            };
            let Some(event) = next else {
                break TurnEnd::Canceled;
            };

            match event {
                AgentEvent::Working(note) => {
                    let message = self.agent_message(note);
                    self.set_status(TaskState::Working, Some(message)).await?;
                    let update = self.status_update(false);
                    self.emit(Ok(update)).await;
                },
                AgentEvent::Chunk(text) => {
                    answer.push_str(&text);
                    let update = StreamResponse::ArtifactUpdate(TaskArtifactUpdateEvent {
                        task_id: self.task.id.clone(),
                        context_id: self.task.context_id.clone(),
                        artifact: response_artifact(&artifact_id, text),
                        append: chunks_sent,
                        last_chunk: false,
                    });
                    chunks_sent = true;
                    self.emit(Ok(update)).await;
                },
                final_event => break TurnEnd::Agent(final_event),
            }
        };

        // cancel() may have won the race against the final event
        let end = if self.token.is_cancelled() {
            TurnEnd::Canceled
        } else {
            end
        };

        if !answer.is_empty() {
            self.task
                .artifacts
                .push(response_artifact(&artifact_id, answer.clone()));
        }

        let (state, status_text) = match end {
            TurnEnd::Canceled => (TaskState::Canceled, None),
            TurnEnd::Agent(AgentEvent::InputRequired(question)) => {
                (TaskState::InputRequired, Some(question))
            },
            TurnEnd::Agent(AgentEvent::Failed(reason)) => (TaskState::Failed, Some(reason)),
            TurnEnd::Agent(_) => (TaskState::Completed, Some(answer).filter(|a| !a.is_empty())),
        };

        let message = status_text.map(|text| self.agent_message(text));
        if let Some(ref message) = message {
            self.task.history.push(message.clone());
        }
        self.set_status(state, message).await?;
        info!(
            task_id = %self.task.id,
            state = ?state,
            artifacts = self.task.artifacts.len(),
            "Task turn finished"
        );

        let update = self.status_update(true);
        self.emit(Ok(update)).await;
        Ok(())
    }
}

fn response_artifact(artifact_id: &str, text: String) -> Artifact {
    Artifact {
        artifact_id: artifact_id.to_string(),
        name: Some(ARTIFACT_NAME.to_string()),
        description: None,
        parts: vec![Part::text(text)],
        metadata: None,
    }
}
