//! Value Objects - Immutable, identity-less domain primitives

mod agent_kind;
mod geo_location;
mod us_state;

pub use agent_kind::AgentKind;
pub use geo_location::GeoLocation;
pub use us_state::UsState;
