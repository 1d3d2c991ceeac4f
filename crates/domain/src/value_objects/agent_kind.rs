//! Identity of the agents that make up the beach party

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// One of the agents the launcher knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Forecasts and alerts (NWS for the US, Open-Meteo worldwide)
    Weather,
    /// Beach recommendations
    Beach,
    /// Beach party planner
    Planner,
    /// Travel planner
    Travel,
    /// Routing host that delegates to the others
    Host,
}

impl AgentKind {
    /// All kinds, in the order the launcher starts them
    pub const ALL: [Self; 5] = [
        Self::Weather,
        Self::Beach,
        Self::Planner,
        Self::Travel,
        Self::Host,
    ];

    /// Port the agent listens on unless configured otherwise
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Weather => 10000,
            Self::Planner => 10001,
            Self::Beach => 10002,
            Self::Travel => 10003,
            Self::Host => 10010,
        }
    }

    /// Human readable name used on agent cards
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Weather => "Weather Agent",
            Self::Beach => "Beach Agent",
            Self::Planner => "Planner Agent",
            Self::Travel => "Travel Planner Agent",
            Self::Host => "Host Agent",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Beach => "beach",
            Self::Planner => "planner",
            Self::Travel => "travel",
            Self::Host => "host",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str() == lowered || kind.display_name().eq_ignore_ascii_case(s.trim())
            })
            .ok_or_else(|| DomainError::UnknownAgent(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_display_names() {
        assert_eq!("Weather".parse::<AgentKind>().unwrap(), AgentKind::Weather);
        assert_eq!(
            "beach agent".parse::<AgentKind>().unwrap(),
            AgentKind::Beach
        );
        assert!("surf".parse::<AgentKind>().is_err());
    }

    #[test]
    fn ports_are_distinct() {
        let mut ports: Vec<u16> = AgentKind::ALL.iter().map(|k| k.default_port()).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), AgentKind::ALL.len());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>().unwrap(), kind);
        }
    }
}
