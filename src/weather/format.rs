//! meteoblue `basic-6h_basic-day_sunmoon` payload and its SMS rendering.

use serde::Deserialize;
use std::fmt::Write;

use super::WeatherError;

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub metadata: Metadata,
    pub data_day: DailyData,
    pub data_6h: SixHourData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub modelrun_updatetime_utc: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    pub temperature_max: Vec<f64>,
    pub temperature_min: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub windspeed_max: Vec<f64>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub pictocode: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SixHourData {
    pub temperature_instant: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub windspeed_max: Vec<f64>,
}

/// Daily pictogram codes 1-17.
pub fn pictogram_description(code: u32) -> Option<&'static str> {
    let text = match code {
        1 => "Sunny, cloudless sky",
        2 => "Sunny and few clouds",
        3 => "Partly cloudy",
        4 => "Overcast",
        5 => "Fog",
        6 => "Overcast with rain",
        7 => "Mixed with showers",
        8 => "Showers, thunderstorms likely",
        9 => "Overcast with snow",
        10 => "Mixed with snow showers",
        11 => "Mostly cloudy with a mixture of snow and rain",
        12 => "Overcast with light rain",
        13 => "Overcast with light snow",
        14 => "Mostly cloudy with rain",
        15 => "Mostly cloudy with snow",
        16 => "Mostly cloudy with light rain",
        17 => "Mostly cloudy with light snow",
        _ => return None,
    };
    Some(text)
}

/// Daily entries rendered: today, tomorrow, the day after.
const DAYS: [(&str, usize); 3] = [("Today", 0), ("Tomorrow", 1), ("Following Day", 2)];
/// 6-hourly slots (label, index) shown under today and tomorrow.
const TODAY_SLOTS: [(&str, usize); 3] = [("6am", 1), ("12pm", 2), ("6pm", 3)];
const TOMORROW_SLOTS: [(&str, usize); 3] = [("6am", 5), ("12pm", 6), ("6pm", 7)];

/// Render a forecast as the multi-section SMS text.
pub fn render(forecast: &Forecast) -> Result<String, WeatherError> {
    let meta = &forecast.metadata;
    let mut out = String::new();
    let _ = write!(
        out,
        "\nLast Updated: {}\nLat: {}\nLon: {}\n",
        meta.modelrun_updatetime_utc,
        decimal(meta.latitude),
        decimal(meta.longitude)
    );

    for (label, day) in DAYS {
        let _ = write!(out, "\n- {}: {}", label, daily_summary(&forecast.data_day, day)?);
        let slots: &[(&str, usize)] = match day {
            0 => &TODAY_SLOTS,
            1 => &TOMORROW_SLOTS,
            _ => &[],
        };
        for &(slot, index) in slots {
            let _ = write!(out, "- {}:\n{}\n", slot, six_hour_summary(&forecast.data_6h, index)?);
        }
    }
    Ok(out.trim_end().to_string())
}

fn daily_summary(day: &DailyData, i: usize) -> Result<String, WeatherError> {
    let code = *at(&day.pictocode, "data_day.pictocode", i)?;
    let picture = pictogram_description(code).ok_or(WeatherError::UnknownPictocode(code))?;
    Ok(format!(
        "{}\n{}\nTemp Min: {:.0} C\nTemp Max: {:.0} C\nRain: {} mm\nWind Gusts: {:.0} kph\nSun Rise: {}\nSun Set: {}\n",
        at(&day.time, "data_day.time", i)?,
        picture,
        at(&day.temperature_min, "data_day.temperature_min", i)?,
        at(&day.temperature_max, "data_day.temperature_max", i)?,
        decimal(*at(&day.precipitation, "data_day.precipitation", i)?),
        at(&day.windspeed_max, "data_day.windspeed_max", i)?,
        at(&day.sunrise, "data_day.sunrise", i)?,
        at(&day.sunset, "data_day.sunset", i)?,
    ))
}

fn six_hour_summary(data: &SixHourData, i: usize) -> Result<String, WeatherError> {
    Ok(format!(
        "Temp: {:.0} C\nRain: {} mm\nWind Gusts: {:.0} kph",
        at(&data.temperature_instant, "data_6h.temperature_instant", i)?,
        decimal(*at(&data.precipitation, "data_6h.precipitation", i)?),
        at(&data.windspeed_max, "data_6h.windspeed_max", i)?,
    ))
}

fn at<'a, V>(values: &'a [V], field: &'static str, index: usize) -> Result<&'a V, WeatherError> {
    values
        .get(index)
        .ok_or(WeatherError::MissingField { field, index })
}

/// Always show a decimal point: `0.0`, `1.5`, `-40.17`.
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
