//! Domain entities

mod chat_message;
mod place;
mod weather;

pub use chat_message::{ChatMessage, MessageRole};
pub use place::Place;
pub use weather::{
    CurrentConditions, DailyForecast, ForecastPeriod, ForecastSource, WeatherAlert,
    WeatherCondition, WeatherReport,
};
