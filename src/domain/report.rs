//! Human-readable weather report

use super::entities::WeatherReport;

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Render `report` as the multi-line console report.
pub fn render_report(report: &WeatherReport) -> String {
    let mut lines = vec![
        format!("{} Weather Report", condition_emoji(&report.condition)),
        format!(
            "{} Temperature: {}°{}",
            temperature_emoji(report.temperature),
            report.temperature,
            report.units.temperature_symbol()
        ),
        format!(
            "💨 Wind: {} {} {}",
            report.wind_speed,
            report.units.speed_label(),
            compass_direction(report.wind_direction)
        ),
    ];
    if let Some(humidity) = report.humidity {
        lines.push(format!("💧 Humidity: {humidity}%"));
    }
    lines.push(format!(
        "Observed at: {}",
        report.observed_at.format("%Y-%m-%d %H:%M:%SZ")
    ));
    lines.push(format!("Condition: {}", report.condition));
    lines.push(format!("Source: {}", report.source));
    lines.join("\n")
}

/// 8-point compass name for a bearing in degrees.
pub fn compass_direction(degrees: i32) -> &'static str {
    let normalized = f64::from(degrees.rem_euclid(360));
    let index = (normalized / 45.0).round() as usize % COMPASS.len();
    COMPASS[index]
}

fn temperature_emoji(temperature: f64) -> &'static str {
    if temperature > 30.0 {
        "🌡️"
    } else if temperature < 10.0 {
        "❄️"
    } else {
        "🌤️"
    }
}

fn condition_emoji(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("rain") {
        "🌧️"
    } else if condition.contains("cloud") {
        "☁️"
    } else if condition.contains("clear") {
        "☀️"
    } else if condition.contains("snow") {
        "❄️"
    } else if condition.contains("storm") {
        "⛈️"
    } else {
        "🌤️"
    }
}
