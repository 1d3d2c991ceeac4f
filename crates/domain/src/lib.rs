//! Domain layer for the beach party agents
//!
//! Holds the vocabulary shared by every agent: places and coordinates,
//! weather reports, agent identities and chat messages. No I/O lives here.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
