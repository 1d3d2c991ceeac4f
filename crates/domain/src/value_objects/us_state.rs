//! US state postal codes, used to scope NWS weather alerts

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainError;

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Two-letter US state (or DC / Puerto Rico) postal code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsState(&'static str);

impl UsState {
    /// Postal code, e.g. `"CA"`
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.0
    }

    /// Full name, e.g. `"California"`
    #[must_use]
    pub fn name(&self) -> &'static str {
        STATES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map_or(self.0, |(_, name)| name)
    }

    /// Look up a state by full name or code, ignoring case
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let needle = input.trim();
        STATES
            .iter()
            .find(|(code, name)| {
                code.eq_ignore_ascii_case(needle) || name.eq_ignore_ascii_case(needle)
            })
            .map(|(code, _)| Self(code))
            .ok_or_else(|| DomainError::UnknownUsState(needle.to_string()))
    }

    /// Every known state, in table order
    pub fn all() -> impl Iterator<Item = Self> {
        STATES.iter().map(|(code, _)| Self(code))
    }
}

impl FromStr for UsState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UsState {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UsState> for String {
    fn from(state: UsState) -> Self {
        state.0.to_string()
    }
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_name() {
        assert_eq!(UsState::parse("ca").unwrap().code(), "CA");
        assert_eq!(UsState::parse(" Florida ").unwrap().code(), "FL");
        assert_eq!(UsState::parse("new york").unwrap().code(), "NY");
    }

    #[test]
    fn rejects_unknown() {
        let err = UsState::parse("Bavaria").unwrap_err();
        assert_eq!(err, DomainError::UnknownUsState("Bavaria".to_string()));
    }

    #[test]
    fn name_lookup() {
        assert_eq!(UsState::parse("HI").unwrap().name(), "Hawaii");
    }

    #[test]
    fn covers_states_dc_and_pr() {
        assert_eq!(UsState::all().count(), 52);
    }

    #[test]
    fn serde_as_code() {
        let state = UsState::parse("Texas").unwrap();
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"TX\"");
        let back: UsState = serde_json::from_str("\"tx\"").unwrap();
        assert_eq!(back, state);
    }
}
