//! Weather report formatting
//!
//! Pure functions that turn a [`WeatherReport`] into plain text. The text is
//! both the grounding context handed to the LLM and the answer itself when
//! the LLM is unavailable.

use domain::{
    CurrentConditions, DailyForecast, ForecastPeriod, UsState, WeatherAlert, WeatherReport,
};

// ── Full report ─────────────────────────────────────────────────

/// Format a complete report: header, current conditions, forecast, alerts
#[must_use]
pub fn format_report(report: &WeatherReport) -> String {
    let place = report.place.display_name();
    if report.is_empty() && report.alerts.is_empty() {
        return format!("No forecast data is available for {place}.");
    }

    let mut parts = vec![format!(
        "Weather for {place} (source: {})",
        report.source.attribution()
    )];

    if let Some(ref current) = report.current {
        parts.push(format_current(current));
    }

    if !report.daily.is_empty() {
        parts.push(String::new());
        parts.push("Forecast:".to_string());
        parts.extend(report.daily.iter().map(format_day));
    }

    if !report.periods.is_empty() {
        parts.push(String::new());
        parts.push("Forecast:".to_string());
        parts.extend(report.periods.iter().map(format_period));
    }

    if !report.alerts.is_empty() {
        parts.push(String::new());
        parts.push("Active alerts:".to_string());
        parts.extend(report.alerts.iter().map(format_alert));
    }

    parts.join("\n")
}

// ── Alerts only ─────────────────────────────────────────────────

/// Format the alerts of one state
#[must_use]
pub fn format_state_alerts(state: UsState, alerts: &[WeatherAlert]) -> String {
    if alerts.is_empty() {
        return format!("No active weather alerts for {}.", state.name());
    }
    let mut parts = vec![format!(
        "{} active weather alert(s) for {}:",
        alerts.len(),
        state.name()
    )];
    parts.extend(alerts.iter().map(format_alert));
    parts.join("\n")
}

// ── Pieces ──────────────────────────────────────────────────────

fn format_current(current: &CurrentConditions) -> String {
    let mut line = format!(
        "Now: {} {}, {:.1}°C (feels like {:.1}°C), humidity {}%, wind {:.0} km/h",
        current.condition.emoji(),
        current.condition,
        current.temperature_c,
        current.apparent_temperature_c,
        current.humidity_pct,
        current.wind_speed_kmh,
    );
    if current.precipitation_mm > 0.0 {
        line.push_str(&format!(", precipitation {:.1} mm", current.precipitation_mm));
    }
    line
}

fn format_day(day: &DailyForecast) -> String {
    let mut line = format!(
        "- {}: {} {}, high {:.0}°C / low {:.0}°C",
        day.date.format("%a %b %-d"),
        day.condition.emoji(),
        day.condition,
        day.temperature_max_c,
        day.temperature_min_c,
    );
    if let Some(chance) = day.precipitation_probability_pct {
        line.push_str(&format!(", {chance}% chance of rain"));
    }
    if day.precipitation_mm > 0.0 {
        line.push_str(&format!(" ({:.1} mm)", day.precipitation_mm));
    }
    line.push_str(&format!(", wind up to {:.0} km/h", day.wind_speed_max_kmh));
    if let Some(uv) = day.uv_index_max {
        line.push_str(&format!(", UV {uv:.0}"));
    }
    if let (Some(rise), Some(set)) = (day.sunrise, day.sunset) {
        line.push_str(&format!(
            ", sun {} to {}",
            rise.format("%H:%M"),
            set.format("%H:%M")
        ));
    }
    line
}

fn format_period(period: &ForecastPeriod) -> String {
    format!(
        "- {}: {}°{}, {}. Wind {} {}.",
        period.name,
        period.temperature,
        period.temperature_unit,
        period.short_forecast,
        period.wind_speed,
        period.wind_direction,
    )
}

fn format_alert(alert: &WeatherAlert) -> String {
    let summary = alert.headline.as_deref().unwrap_or(&alert.area_description);
    format!("- ⚠️ {} ({}): {summary}", alert.event, alert.severity)
}
