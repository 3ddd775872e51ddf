use crate::dates::{is_sentinel, parse_wire_date};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Numbers arrive as JSON numbers or decimal strings; unparseable means absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub strategy: String,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub pnl: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub roi: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fee: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub exit_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub start_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub end_price: Option<f64>,
}

impl TradeRecord {
    pub fn pnl_value(&self) -> f64 {
        self.pnl.unwrap_or(0.0)
    }

    pub fn fee_value(&self) -> f64 {
        self.fee.unwrap_or(0.0)
    }

    /// The date the PnL is realised on: `end_date` wins over `exit_date`.
    pub fn resolved_date(&self) -> Option<NaiveDate> {
        self.end_date
            .as_deref()
            .and_then(parse_wire_date)
            .or_else(|| self.exit_date.as_deref().and_then(parse_wire_date))
    }

    pub fn trade_date(&self) -> Option<NaiveDate> {
        self.resolved_date().filter(|date| !is_sentinel(*date))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceBody {
    #[serde(default)]
    pub response: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceEnvelope {
    pub performance: PerformanceBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub cumulative_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    pub border_width: u32,
    pub tension: f64,
    pub point_radius: u32,
    pub point_hover_radius: u32,
}

impl SeriesStyle {
    pub fn strategy() -> Self {
        Self {
            border_width: 2,
            tension: 0.4,
            point_radius: 4,
            point_hover_radius: 6,
        }
    }

    pub fn aggregate() -> Self {
        Self {
            border_width: 3,
            tension: 0.4,
            point_radius: 5,
            point_hover_radius: 7,
        }
    }
}

/// A line on the PnL chart. `raw_points[i]` is the trade behind `points[i]`
/// (tooltips), and is `None` throughout the aggregate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<CumulativePoint>,
    pub color: String,
    pub raw_points: Vec<Option<TradeRecord>>,
    pub style: SeriesStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSample {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub x: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub y: String,
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub value: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatermarkResponse {
    #[serde(default)]
    pub watermarks: Vec<WatermarkSample>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub min_watermark: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub max_watermark: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkPoint {
    pub week_label: String,
    pub level: u32,
    pub count: i64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkMatrix {
    pub week_labels: Vec<String>,
    pub level_labels: Vec<String>,
    pub cells: Vec<WatermarkPoint>,
    pub max_value: i64,
}

impl WatermarkMatrix {
    pub fn cell(&self, week_label: &str, level: u32) -> Option<&WatermarkPoint> {
        self.cells
            .iter()
            .find(|cell| cell.week_label == week_label && cell.level == level)
    }
}

pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|parsed| parsed.is_finite()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Some(parsed),
                _ => {
                    debug!("Ignoring non-numeric value '{}'", trimmed);
                    None
                }
            }
        }
        _ => None,
    }
}

fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(lenient_number(&raw))
}

fn deserialize_lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    if let Some(count) = raw.as_i64() {
        return Ok(count);
    }
    Ok(lenient_number(&raw)
        .map(|parsed| parsed.round() as i64)
        .unwrap_or(0))
}

fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(lenient_text(&raw).unwrap_or_default())
}

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(lenient_text(&raw).filter(|text| !text.trim().is_empty()))
}
