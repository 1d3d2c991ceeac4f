//! Weather query parser - pull a place and a time span out of free text
//!
//! Quick patterns cover the usual phrasings ("weather in Miami tomorrow",
//! "3 day forecast for Kyoto", "alerts for CA"). When they find no place,
//! the LLM is asked for a JSON extraction.

use std::{fmt, sync::Arc};

use domain::UsState;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{llm_json::extract_json, ports::InferencePort};

/// Longest forecast Open-Meteo serves
pub const MAX_FORECAST_DAYS: u8 = 16;

const LOCATION_MARKERS: [&str; 4] = [" in ", " for ", " at ", " near "];

/// Words that describe time (or politeness) rather than a place
const TIME_WORDS: [&str; 20] = [
    "the", "next", "this", "coming", "day", "days", "week", "weeks", "weekend", "tomorrow",
    "today", "tonight", "now", "right", "please", "forecast", "weather", "outlook", "few",
    "couple",
];

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract weather lookups from user messages.
Respond with JSON only, no prose:
{"location": "<city or place, with region or country if given>" or null, "days": <number of forecast days> or null}"#;

/// What the user wants to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    /// Place name as typed, qualifiers kept ("Miami, FL")
    pub location: Option<String>,
    /// Forecast span in days, 1..=16
    pub days: u8,
    /// "alerts for CA": only the state's alerts are wanted
    pub alerts_for: Option<UsState>,
}

#[derive(Debug, Deserialize)]
struct ExtractedQuery {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    days: Option<u32>,
}

/// Parser for weather questions
pub struct WeatherQueryParser {
    default_days: u8,
}

impl fmt::Debug for WeatherQueryParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherQueryParser")
            .field("default_days", &self.default_days)
            .finish()
    }
}

impl Default for WeatherQueryParser {
    fn default() -> Self {
        Self::new(3)
    }
}

impl WeatherQueryParser {
    /// Create a parser that falls back to `default_days` when no span is named
    pub fn new(default_days: u8) -> Self {
        Self {
            default_days: default_days.clamp(1, MAX_FORECAST_DAYS),
        }
    }

    /// Parse without any LLM help
    pub fn parse_quick(&self, input: &str) -> WeatherQuery {
        let cleaned = input
            .trim()
            .trim_end_matches(['?', '.', '!'])
            .trim();
        let lower = cleaned.to_ascii_lowercase();

        let days = extract_days(&lower).unwrap_or(self.default_days);

        if is_alert_request(&lower) {
            if let Some(state) = extract_state(cleaned) {
                return WeatherQuery {
                    location: None,
                    days,
                    alerts_for: Some(state),
                };
            }
        }

        WeatherQuery {
            location: extract_location(cleaned),
            days,
            alerts_for: None,
        }
    }

    /// Quick patterns first, then the LLM for the place name
    #[instrument(skip(self, inference, input), fields(input_len = input.len()))]
    pub async fn parse_with_llm(
        &self,
        inference: &Arc<dyn InferencePort>,
        input: &str,
    ) -> WeatherQuery {
        let quick = self.parse_quick(input);
        if quick.location.is_some() || quick.alerts_for.is_some() {
            return quick;
        }

        debug!("No quick match, asking LLM for the location");
        let result = match inference
            .generate_with_system(EXTRACTION_SYSTEM_PROMPT, input)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "LLM location extraction failed");
                return quick;
            },
        };

        match serde_json::from_str::<ExtractedQuery>(extract_json(&result.content)) {
            Ok(extracted) => WeatherQuery {
                location: extracted
                    .location
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("null")),
                days: extracted.days.map_or(quick.days, clamp_days),
                alerts_for: None,
            },
            Err(e) => {
                warn!(error = %e, response = %result.content, "Failed to parse LLM extraction");
                quick
            },
        }
    }
}

fn clamp_days(days: u32) -> u8 {
    u8::try_from(days.clamp(1, u32::from(MAX_FORECAST_DAYS))).unwrap_or(MAX_FORECAST_DAYS)
}

fn is_time_word(word: &str) -> bool {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
    word.is_empty()
        || word.chars().all(|c| c.is_ascii_digit())
        || word.ends_with("-day")
        || TIME_WORDS.contains(&word.to_ascii_lowercase().as_str())
}

fn extract_days(lower: &str) -> Option<u8> {
    let words: Vec<&str> = lower.split_whitespace().collect();
    for (i, &word) in words.iter().enumerate() {
        // "3-day" or "3 days"
        let (number, rest) = word.split_once('-').unwrap_or((word, ""));
        let Ok(n) = number.parse::<u32>() else {
            continue;
        };
        let unit = if rest.is_empty() {
            words.get(i + 1).copied().unwrap_or_default()
        } else {
            rest
        };
        if unit.starts_with("day") {
            return Some(clamp_days(n));
        }
        if unit.starts_with("week") {
            return Some(clamp_days(n.saturating_mul(7)));
        }
    }

    if lower.contains("weekend") || lower.contains("week") {
        Some(7)
    } else if lower.contains("tomorrow") {
        Some(2)
    } else if lower.contains("today") || lower.contains("tonight") || lower.contains("right now") {
        Some(1)
    } else {
        None
    }
}

fn is_alert_request(lower: &str) -> bool {
    lower.contains("alert") || lower.contains("warning")
}

fn extract_state(cleaned: &str) -> Option<UsState> {
    segments(cleaned)
        .into_iter()
        .chain(cleaned.split_whitespace().last().map(str::to_string))
        // "in", "me", "ok" are words before they are state codes
        .filter(|c| c.len() > 2 || c.chars().all(|ch| ch.is_ascii_uppercase()))
        .find_map(|candidate| UsState::parse(&candidate).ok())
}

/// Text between location markers, in reading order
fn segments(cleaned: &str) -> Vec<String> {
    let lower = cleaned.to_ascii_lowercase();
    let mut cuts: Vec<(usize, usize)> = LOCATION_MARKERS
        .iter()
        .flat_map(|marker| {
            lower
                .match_indices(marker)
                .map(move |(pos, m)| (pos, pos + m.len()))
        })
        .collect();
    cuts.sort_unstable();

    cuts.iter()
        .enumerate()
        .map(|(i, &(_, start))| {
            let end = cuts
                .iter()
                .skip(i + 1)
                .map(|&(pos, _)| pos)
                .find(|&pos| pos >= start)
                .unwrap_or(cleaned.len());
            cleaned[start..end].trim().to_string()
        })
        .collect()
}

/// Drop leading and trailing time words: "Tokyo tomorrow" -> "Tokyo"
fn strip_time_words(segment: &str) -> Option<String> {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let start = words.iter().position(|w| !is_time_word(w))?;
    let end = words.iter().rposition(|w| !is_time_word(w))?;
    let place = words[start..=end].join(" ");
    let place = place.trim_matches(|c: char| c == ',' || c == '"' || c == '\'');
    (!place.is_empty()).then(|| place.to_string())
}

fn extract_location(cleaned: &str) -> Option<String> {
    if let Some(place) = segments(cleaned)
        .iter()
        .find_map(|segment| strip_time_words(segment))
    {
        return Some(place);
    }

    // "Miami weather", "weather Miami", "Kyoto forecast"
    let lower = cleaned.to_ascii_lowercase();
    for keyword in ["weather", "forecast"] {
        if let Some(rest) = lower.strip_prefix(keyword) {
            if let Some(place) = strip_time_words(&cleaned[cleaned.len() - rest.len()..]) {
                return Some(place);
            }
        }
        if let Some(head) = lower.strip_suffix(keyword) {
            let head = &cleaned[..head.len()];
            let head = head
                .split_whitespace()
                .skip_while(|w| {
                    matches!(
                        w.to_ascii_lowercase().as_str(),
                        "what's" | "whats" | "what" | "is" | "the" | "how's" | "hows" | "show" | "me"
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(place) = strip_time_words(&head) {
                return Some(place);
            }
        }
    }
    None
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod async_tests {
    use super::*;
    use crate::{
        error::ApplicationError,
        ports::{InferenceResult, MockInferencePort},
    };

    fn reply(content: &str) -> InferenceResult {
        InferenceResult {
            content: content.to_string(),
            model: "test".into(),
            tokens_used: None,
            latency_ms: 1,
        }
    }

    #[tokio::test]
    async fn quick_match_skips_llm() {
        let mut mock = MockInferencePort::new();
        mock.expect_generate_with_system().never();
        let inference: Arc<dyn InferencePort> = Arc::new(mock);

        let q = WeatherQueryParser::default()
            .parse_with_llm(&inference, "weather in Lisbon")
            .await;
        assert_eq!(q.location.as_deref(), Some("Lisbon"));
    }

    #[tokio::test]
    async fn llm_extracts_location_from_fenced_json() {
        let mut mock = MockInferencePort::new();
        mock.expect_generate_with_system().returning(|_, _| {
            Ok(reply("```json\n{\"location\": \"Cancun, Mexico\", \"days\": 4}\n```"))
        });
        let inference: Arc<dyn InferencePort> = Arc::new(mock);

        let q = WeatherQueryParser::default()
            .parse_with_llm(&inference, "Should I pack an umbrella for Cancun?")
            .await;
        assert_eq!(q.location.as_deref(), Some("Cancun, Mexico"));
        assert_eq!(q.days, 4);
    }

    #[tokio::test]
    async fn llm_null_location_stays_none() {
        let mut mock = MockInferencePort::new();
        mock.expect_generate_with_system()
            .returning(|_, _| Ok(reply(r#"{"location": null, "days": null}"#)));
        let inference: Arc<dyn InferencePort> = Arc::new(mock);

        let q = WeatherQueryParser::default()
            .parse_with_llm(&inference, "is it nice out?")
            .await;
        assert!(q.location.is_none());
        assert_eq!(q.days, 3);
    }

    #[tokio::test]
    async fn llm_failure_keeps_quick_result() {
        let mut mock = MockInferencePort::new();
        mock.expect_generate_with_system()
            .returning(|_, _| Err(ApplicationError::Inference("down".into())));
        let inference: Arc<dyn InferencePort> = Arc::new(mock);

        let q = WeatherQueryParser::default()
            .parse_with_llm(&inference, "is it nice out tomorrow?")
            .await;
        assert!(q.location.is_none());
        assert_eq!(q.days, 2);
    }
}
