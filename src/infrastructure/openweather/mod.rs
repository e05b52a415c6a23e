//! OpenWeather 5-day / 3-hour forecast client.

mod client;

pub use client::{OpenWeatherClient, parse_forecast_response};
