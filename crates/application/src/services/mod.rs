//! Application services - the use cases behind the A2A endpoints

mod task_service;

pub use task_service::{ARTIFACT_NAME, TaskEventStream, TaskService};
