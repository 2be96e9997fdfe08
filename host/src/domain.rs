use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// shown wherever a vital is absent
pub const PLACEHOLDER: &str = "--";

/// one sample of the three vitals as stored in the realtime database
///
/// every field is optional on the wire. values are decoded leniently:
/// numbers and numeric strings are accepted, anything else reads as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// heart rate, beats per minute
    #[serde(rename = "BPM", default, deserialize_with = "lenient_number")]
    pub bpm: Option<f64>,

    /// blood-oxygen saturation, percent
    #[serde(rename = "SpO2", default, deserialize_with = "lenient_number")]
    pub spo2: Option<f64>,

    /// body temperature, celsius
    #[serde(rename = "Temp", default, deserialize_with = "lenient_number")]
    pub temp: Option<f64>,
}

/// the three vitals in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vital {
    HeartRate,
    Oxygen,
    Temperature,
}

impl Vital {
    pub const ALL: [Vital; 3] = [Vital::HeartRate, Vital::Oxygen, Vital::Temperature];

    /// card title
    pub fn label(self) -> &'static str {
        match self {
            Vital::HeartRate => "Heart Rate (BPM)",
            Vital::Oxygen => "SpO₂ (%)",
            Vital::Temperature => "Temperature (°C)",
        }
    }
}

impl Reading {
    pub fn value(&self, vital: Vital) -> Option<f64> {
        match vital {
            Vital::HeartRate => self.bpm,
            Vital::Oxygen => self.spo2,
            Vital::Temperature => self.temp,
        }
    }

    /// the value formatted for display, or the placeholder
    pub fn display(&self, vital: Vital) -> String {
        format_value(self.value(vital))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BPM: {}, SpO₂: {}, Temp: {}°C",
            self.display(Vital::HeartRate),
            self.display(Vital::Oxygen),
            self.display(Vital::Temperature),
        )
    }
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(number_from_value))
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// the last `limit` entries of a history, newest first
pub fn recent(history: &[Reading], limit: usize) -> Vec<Reading> {
    let start = history.len().saturating_sub(limit);
    history[start..].iter().rev().cloned().collect()
}

/// state shared between the poll loop and the web server
#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardState {
    /// newest reading, none when the last fetch failed or found no data
    pub latest: Option<Reading>,
    /// full history in database order
    pub history: Vec<Reading>,
    /// unix timestamp (ms) of the last refresh attempt
    pub last_update: u64,
}

/// current unix time in milliseconds
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading(bpm: f64) -> Reading {
        Reading { bpm: Some(bpm), ..Reading::default() }
    }

    #[test]
    fn decodes_wire_names() {
        let r: Reading = serde_json::from_value(json!({"BPM": 72, "SpO2": 98.5, "Temp": 36.6})).unwrap();
        assert_eq!(r.bpm, Some(72.0));
        assert_eq!(r.spo2, Some(98.5));
        assert_eq!(r.temp, Some(36.6));
    }

    #[test]
    fn missing_and_bad_fields_are_absent() {
        let r: Reading = serde_json::from_value(json!({"BPM": null, "SpO2": "n/a", "Extra": 1})).unwrap();
        assert_eq!(r, Reading::default());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let r: Reading = serde_json::from_value(json!({"BPM": " 80 ", "Temp": "NaN"})).unwrap();
        assert_eq!(r.bpm, Some(80.0));
        assert_eq!(r.temp, None);
    }

    #[test]
    fn display_uses_placeholder() {
        let r = Reading { bpm: Some(72.0), spo2: None, temp: Some(36.5) };
        assert_eq!(r.to_string(), "BPM: 72, SpO₂: --, Temp: 36.5°C");
        assert_eq!(r.display(Vital::Oxygen), PLACEHOLDER);
    }

    #[test]
    fn recent_keeps_last_entries_newest_first() {
        let history: Vec<Reading> = (0..25).map(|i| reading(i as f64)).collect();
        let shown = recent(&history, 20);
        assert_eq!(shown.len(), 20);
        assert_eq!(shown.first().unwrap().bpm, Some(24.0));
        assert_eq!(shown.last().unwrap().bpm, Some(5.0));
    }

    #[test]
    fn recent_handles_short_history() {
        let history = vec![reading(1.0), reading(2.0)];
        let shown = recent(&history, 20);
        assert_eq!(shown, vec![reading(2.0), reading(1.0)]);
        assert!(recent(&[], 20).is_empty());
    }
}
