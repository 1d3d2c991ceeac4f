//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod inference_port;
mod remote_agent_port;
mod task_store_port;
mod weather_port;

#[cfg(test)]
pub use inference_port::MockInferencePort;
pub use inference_port::{InferencePort, InferenceResult, InferenceStream};
#[cfg(test)]
pub use remote_agent_port::MockRemoteAgentPort;
pub use remote_agent_port::{RemoteAgentInfo, RemoteAgentPort, RemoteReply};
#[cfg(test)]
pub use task_store_port::MockTaskStorePort;
pub use task_store_port::TaskStorePort;
#[cfg(test)]
pub use weather_port::MockWeatherPort;
pub use weather_port::WeatherPort;
