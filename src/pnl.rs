use crate::dates::generate_date_range;
use crate::models::{ChartSeries, CumulativePoint, SeriesStyle, TradeRecord};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

pub const AGGREGATE_LABEL: &str = "agg";
pub const AGGREGATE_COLOR: &str = "#000000";

/// Strategy -> date -> PnL realised on that date.
pub type DailyStrategySeries = BTreeMap<String, BTreeMap<NaiveDate, f64>>;

type TradesByDate<'a> = BTreeMap<NaiveDate, &'a TradeRecord>;

pub struct SeriesPalette {
    rng: fastrand::Rng,
}

impl SeriesPalette {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn next_color(&mut self) -> String {
        const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        let mut color = String::with_capacity(7);
        color.push('#');
        for _ in 0..6 {
            color.push(HEX_DIGITS[self.rng.usize(..HEX_DIGITS.len())] as char);
        }
        color
    }
}

impl Default for SeriesPalette {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative PnL lines, `agg` first. Same-date trades of one strategy are
/// not summed: the last one processed wins.
pub fn build_pnl_series(
    records: &[TradeRecord],
    start: NaiveDate,
    end: NaiveDate,
    palette: &mut SeriesPalette,
) -> Vec<ChartSeries> {
    let date_range = generate_date_range(start, end);
    if date_range.is_empty() {
        debug!(
            "Empty date range {} - {}; no PnL series produced",
            start, end
        );
        return Vec::new();
    }

    let daily = daily_strategy_values(records, &date_range);
    let trades = trades_by_strategy(records);

    let mut series = Vec::with_capacity(daily.len() + 1);
    series.push(aggregate_series(&daily, &trades));

    for (strategy, values) in &daily {
        let Some(strategy_trades) = trades.get(strategy) else {
            debug!("Skipping strategy {} - no trade dates", strategy);
            continue;
        };

        let mut cumulative = 0.0;
        let mut points = Vec::with_capacity(strategy_trades.len());
        let mut raw_points = Vec::with_capacity(strategy_trades.len());
        for (date, record) in strategy_trades {
            cumulative += values.get(date).copied().unwrap_or(0.0);
            points.push(CumulativePoint {
                date: *date,
                cumulative_value: cumulative,
            });
            raw_points.push(Some((*record).clone()));
        }

        debug!(
            "Strategy {}: {} trade date(s), cumulative PnL {:.2}",
            strategy,
            points.len(),
            cumulative
        );

        series.push(ChartSeries {
            label: strategy.clone(),
            points,
            color: palette.next_color(),
            raw_points,
            style: SeriesStyle::strategy(),
        });
    }

    info!(
        "Built {} PnL series from {} record(s) over {} - {}",
        series.len(),
        records.len(),
        start,
        end
    );
    series
}

pub fn daily_strategy_values(
    records: &[TradeRecord],
    date_range: &[NaiveDate],
) -> DailyStrategySeries {
    let mut daily: DailyStrategySeries = BTreeMap::new();

    for record in records {
        daily.entry(record.strategy.clone()).or_insert_with(|| {
            date_range.iter().map(|date| (*date, 0.0)).collect()
        });
    }

    for record in records {
        let Some(date) = record.resolved_date() else {
            continue;
        };
        if let Some(values) = daily.get_mut(&record.strategy) {
            values.insert(date, record.pnl_value());
        }
    }

    daily
}

fn trades_by_strategy(records: &[TradeRecord]) -> BTreeMap<String, TradesByDate<'_>> {
    let mut trades: BTreeMap<String, TradesByDate<'_>> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.trade_date() {
            trades
                .entry(record.strategy.clone())
                .or_default()
                .insert(date, record);
        }
    }
    trades
}

fn aggregate_series(
    daily: &DailyStrategySeries,
    trades: &BTreeMap<String, TradesByDate<'_>>,
) -> ChartSeries {
    let trade_dates: BTreeSet<NaiveDate> = trades
        .values()
        .flat_map(|by_date| by_date.keys().copied())
        .collect();

    let mut cumulative = 0.0;
    let points: Vec<CumulativePoint> = trade_dates
        .into_iter()
        .map(|date| {
            let daily_total: f64 = daily
                .values()
                .map(|values| values.get(&date).copied().unwrap_or(0.0))
                .sum();
            cumulative += daily_total;
            CumulativePoint {
                date,
                cumulative_value: cumulative,
            }
        })
        .collect();

    ChartSeries {
        label: AGGREGATE_LABEL.to_string(),
        raw_points: vec![None; points.len()],
        points,
        color: AGGREGATE_COLOR.to_string(),
        style: SeriesStyle::aggregate(),
    }
}
