use crate::error::DashboardError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub const PAGE_LENGTH: usize = 10;

pub const COLUMNS: [(&str, &str); 13] = [
    ("Symbol", "symbol"),
    ("Status", "status"),
    ("Type", "meta_type"),
    ("Side", "risk_side"),
    ("Entry Time", "entry_time"),
    ("Exit Time", "exit_time"),
    ("Profit Target", "risk_gain_target"),
    ("Mark", "risk_gain_current"),
    ("Loss Target", "risk_loss_target"),
    ("Watermark", "risk_loss_watermark"),
    ("PnL", "risk_stats_pnl"),
    ("ROI", "risk_stats_roi"),
    ("Fees", "risk_stats_fee"),
];

const RISK_SECTIONS: [&str; 3] = ["gain", "loss", "stats"];

/// Unwraps a `/universe` or `/strategy/{symbol}` body. Accepted shapes are a
/// bare array, `{ "response": [...] }` and `{ "strategies": { "response": [...] } }`.
pub fn normalize_records(url: &str, raw: Value) -> Result<Vec<Value>, DashboardError> {
    match raw {
        Value::Array(records) => Ok(records),
        Value::Object(mut body) => {
            if let Some(Value::Object(mut strategies)) = body.remove("strategies") {
                if let Some(Value::Array(records)) = strategies.remove("response") {
                    return Ok(records);
                }
            }
            if let Some(Value::Array(records)) = body.remove("response") {
                return Ok(records);
            }
            Err(DashboardError::malformed(
                url,
                "expected an array, {response: [...]} or {strategies: {response: [...]}}",
            ))
        }
        other => Err(DashboardError::malformed(
            url,
            format!("unexpected JSON {} at top level", json_kind(&other)),
        )),
    }
}

/// Lifts nested `risk` and `meta` objects into prefixed top-level keys and
/// drops the `risk`, `meta` and `account` sub-objects.
pub fn flatten_record(record: &Value) -> Map<String, Value> {
    let Some(source) = record.as_object() else {
        return Map::new();
    };
    let mut flat = source.clone();

    if let Some(risk) = source.get("risk").and_then(Value::as_object) {
        for section in RISK_SECTIONS {
            if let Some(entries) = risk.get(section).and_then(Value::as_object) {
                for (key, value) in entries {
                    flat.insert(format!("risk_{}_{}", section, key), scalar_or_json(value));
                }
            }
        }
        for (key, value) in risk {
            if !RISK_SECTIONS.contains(&key.as_str()) {
                flat.insert(format!("risk_{}", key), scalar_or_json(value));
            }
        }
    }

    if let Some(meta) = source.get("meta").and_then(Value::as_object) {
        for (key, value) in meta {
            flat.insert(format!("meta_{}", key), scalar_or_json(value));
        }
    }

    flat.remove("risk");
    flat.remove("meta");
    flat.remove("account");
    flat
}

fn scalar_or_json(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other @ (Value::Object(_) | Value::Array(_))) => other.to_string(),
        Some(Value::Null) | None => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyRow {
    pub symbol: String,
    pub status: String,
    pub meta_type: String,
    pub risk_side: String,
    pub entry_time: String,
    pub exit_time: String,
    pub risk_gain_target: String,
    pub risk_gain_current: String,
    pub risk_loss_target: String,
    pub risk_loss_watermark: String,
    pub risk_stats_pnl: String,
    pub risk_stats_roi: String,
    pub risk_stats_fee: String,
}

impl StrategyRow {
    pub fn from_flat(flat: &Map<String, Value>) -> Self {
        let field = |key: &str| display_value(flat.get(key));
        Self {
            symbol: field("symbol"),
            status: field("status"),
            meta_type: field("meta_type"),
            risk_side: field("risk_side"),
            entry_time: field("entry_time"),
            exit_time: field("exit_time"),
            risk_gain_target: field("risk_gain_target"),
            risk_gain_current: field("risk_gain_current"),
            risk_loss_target: field("risk_loss_target"),
            risk_loss_watermark: field("risk_loss_watermark"),
            risk_stats_pnl: field("risk_stats_pnl"),
            risk_stats_roi: field("risk_stats_roi"),
            risk_stats_fee: field("risk_stats_fee"),
        }
    }

    pub fn values(&self) -> [&str; 13] {
        [
            &self.symbol,
            &self.status,
            &self.meta_type,
            &self.risk_side,
            &self.entry_time,
            &self.exit_time,
            &self.risk_gain_target,
            &self.risk_gain_current,
            &self.risk_loss_target,
            &self.risk_loss_watermark,
            &self.risk_stats_pnl,
            &self.risk_stats_roi,
            &self.risk_stats_fee,
        ]
    }

    fn matches(&self, needle: &str) -> bool {
        self.values()
            .iter()
            .any(|value| value.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage<'a> {
    pub columns: Vec<&'static str>,
    pub rows: Vec<&'a StrategyRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub search: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyTable {
    rows: Vec<StrategyRow>,
    search: Option<String>,
    #[serde(skip)]
    visible: Vec<usize>,
}

impl StrategyTable {
    pub fn from_records(records: &[Value]) -> Self {
        let mut rows: Vec<StrategyRow> = records
            .iter()
            .map(|record| StrategyRow::from_flat(&flatten_record(record)))
            .collect();
        rows.sort_by(|a, b| compare_entry_time(b, a));
        let visible = (0..rows.len()).collect();
        Self {
            rows,
            search: None,
            visible,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive substring match against every column. An empty term
    /// restores all rows.
    pub fn search(&mut self, term: &str) -> usize {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            self.search = None;
            self.visible = (0..self.rows.len()).collect();
        } else {
            self.visible = self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.matches(&needle))
                .map(|(idx, _)| idx)
                .collect();
            self.search = Some(term.trim().to_string());
        }
        self.visible.len()
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &StrategyRow> {
        self.visible.iter().map(move |idx| &self.rows[*idx])
    }

    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(PAGE_LENGTH).max(1)
    }

    /// Zero-based page of the filtered rows; out-of-range pages clamp to the last one.
    pub fn page(&self, index: usize) -> TablePage<'_> {
        let total_pages = self.total_pages();
        let page = index.min(total_pages - 1);
        let rows = self
            .visible_rows()
            .skip(page * PAGE_LENGTH)
            .take(PAGE_LENGTH)
            .collect();
        TablePage {
            columns: COLUMNS.iter().map(|(title, _)| *title).collect(),
            rows,
            page,
            total_pages,
            total_rows: self.visible.len(),
            search: self.search.as_deref(),
        }
    }
}

fn compare_entry_time(a: &StrategyRow, b: &StrategyRow) -> Ordering {
    let parse = |raw: &str| DateTime::<FixedOffset>::parse_from_rfc3339(raw.trim()).ok();
    match (parse(&a.entry_time), parse(&b.entry_time)) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.entry_time.cmp(&b.entry_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strategy_json(symbol: &str, entry_time: &str, pnl: &str) -> Value {
        json!({
            "local_id": "0d4b2f3a-0000-0000-0000-000000000000",
            "symbol": symbol,
            "entry_time": entry_time,
            "exit_time": "2024-02-01T15:00:00Z",
            "status": "Closed",
            "meta": { "type": "IronCondor", "underlying": symbol, "open_price": "1.20" },
            "risk": {
                "side": "Put",
                "gain": { "open": "1.2", "current": "0.4", "target": "0.6" },
                "loss": { "target": "2.4", "watermark": "0.25", "upper": null },
                "stats": { "pnl": pnl, "roi": "12.5" }
            },
            "account": { "account_id": "acc-1" }
        })
    }

    #[test]
    fn accepts_all_three_wrapper_shapes() {
        let records = vec![json!({ "symbol": "SPY" })];
        let url = "http://localhost/universe";

        assert_eq!(normalize_records(url, json!(records.clone())).unwrap().len(), 1);
        assert_eq!(
            normalize_records(url, json!({ "response": records.clone() }))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            normalize_records(url, json!({ "strategies": { "response": records } }))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        let url = "http://localhost/universe";
        assert!(matches!(
            normalize_records(url, json!({ "rows": [] })),
            Err(DashboardError::MalformedResponse { .. })
        ));
        assert!(matches!(
            normalize_records(url, json!("nope")),
            Err(DashboardError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn flattens_risk_and_meta_sections() {
        let flat = flatten_record(&strategy_json("SPY", "2024-01-02T14:30:00Z", "42.5"));

        assert_eq!(flat["risk_side"], json!("Put"));
        assert_eq!(flat["risk_gain_target"], json!("0.6"));
        assert_eq!(flat["risk_loss_watermark"], json!("0.25"));
        assert_eq!(flat["risk_loss_upper"], Value::Null);
        assert_eq!(flat["risk_stats_pnl"], json!("42.5"));
        assert_eq!(flat["meta_type"], json!("IronCondor"));
        assert!(!flat.contains_key("risk"));
        assert!(!flat.contains_key("meta"));
        assert!(!flat.contains_key("account"));
        assert!(!flat.contains_key("risk_gain"));
        assert_eq!(flat["symbol"], json!("SPY"));
    }

    #[test]
    fn nested_values_are_stringified() {
        let flat = flatten_record(&json!({
            "risk": { "extra": { "a": 1 }, "levels": [1, 2] }
        }));
        assert_eq!(flat["risk_extra"], json!("{\"a\":1}"));
        assert_eq!(flat["risk_levels"], json!("[1,2]"));
    }

    #[test]
    fn rows_sort_newest_entry_first_and_fill_blanks() {
        let table = StrategyTable::from_records(&[
            strategy_json("AAA", "2024-01-02T14:30:00Z", "1"),
            strategy_json("BBB", "2024-01-05T14:30:00Z", "2"),
            json!({ "symbol": "CCC" }),
        ]);
        let symbols: Vec<&str> = table.visible_rows().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "AAA", "CCC"]);

        let bare = table.visible_rows().last().unwrap();
        assert_eq!(bare.risk_stats_pnl, "");
        assert_eq!(bare.values().len(), COLUMNS.len());
    }

    #[test]
    fn search_is_case_insensitive_and_resettable() {
        let mut table = StrategyTable::from_records(&[
            strategy_json("SPY", "2024-01-02T14:30:00Z", "1"),
            strategy_json("QQQ", "2024-01-03T14:30:00Z", "2"),
        ]);

        assert_eq!(table.search("spy"), 1);
        assert_eq!(table.page(0).rows[0].symbol, "SPY");
        assert_eq!(table.page(0).search, Some("spy"));

        assert_eq!(table.search("ironcondor"), 2);
        assert_eq!(table.search("nothing-matches"), 0);
        assert_eq!(table.page(0).total_rows, 0);
        assert_eq!(table.search(""), 2);
        assert_eq!(table.page(0).search, None);
    }

    #[test]
    fn pages_hold_ten_rows_and_clamp() {
        let records: Vec<Value> = (0..23)
            .map(|day| {
                strategy_json(
                    &format!("S{:02}", day),
                    &format!("2024-03-{:02}T10:00:00Z", day + 1),
                    "1",
                )
            })
            .collect();
        let table = StrategyTable::from_records(&records);

        assert_eq!(table.total_pages(), 3);
        assert_eq!(table.page(0).rows.len(), PAGE_LENGTH);
        assert_eq!(table.page(0).rows[0].symbol, "S22");
        assert_eq!(table.page(2).rows.len(), 3);
        assert_eq!(table.page(9).page, 2);
        assert_eq!(table.page(0).columns.len(), 13);
    }

    #[test]
    fn empty_table_has_one_empty_page() {
        let table = StrategyTable::from_records(&[]);
        assert!(table.is_empty());
        let page = table.page(0);
        assert_eq!(page.total_pages, 1);
        assert!(page.rows.is_empty());
    }
}
