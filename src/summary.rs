use crate::models::TradeRecord;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Negative,
}

/// Headline numbers shown next to the PnL chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_pnl: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades with positive PnL.
    pub win_rate: f64,
    pub total_fees: f64,
    /// Fees as an absolute percentage of total PnL; undefined when PnL is zero.
    pub fee_ratio_percent: Option<f64>,
    pub trend: Trend,
    pub avg_trade_pnl: f64,
    pub median_trade_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub pnl_std_dev: f64,
}

impl PerformanceSummary {
    pub fn from_records(records: &[TradeRecord]) -> Self {
        let trade_pnls: Vec<f64> = records.iter().map(TradeRecord::pnl_value).collect();
        let total_trades = trade_pnls.len();
        let total_pnl: f64 = trade_pnls.iter().sum();
        let total_fees: f64 = records.iter().map(TradeRecord::fee_value).sum();

        let winning_trades = trade_pnls.iter().filter(|pnl| **pnl > 0.0).count();
        let losing_trades = trade_pnls.iter().filter(|pnl| **pnl < 0.0).count();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let fee_ratio_percent = if total_pnl != 0.0 {
            Some((total_fees / total_pnl * 100.0).abs())
        } else {
            None
        };

        let trend = if total_pnl > 0.0 {
            Trend::Positive
        } else {
            Trend::Negative
        };

        let best_trade = finite_or_zero(
            trade_pnls
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        );
        let worst_trade =
            finite_or_zero(trade_pnls.iter().copied().fold(f64::INFINITY, f64::min));

        let pnl_std_dev = if total_trades >= 2 {
            finite_or_zero(trade_pnls.iter().std_dev())
        } else {
            0.0
        };

        Self {
            total_pnl,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_fees,
            fee_ratio_percent,
            trend,
            avg_trade_pnl: average(&trade_pnls),
            median_trade_pnl: median(&trade_pnls),
            best_trade,
            worst_trade,
            pnl_std_dev,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn average(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in values.iter().copied() {
        if value.is_finite() {
            sum += value;
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn median(values: &[f64]) -> f64 {
    let mut filtered: Vec<f64> = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect();

    if filtered.is_empty() {
        return 0.0;
    }

    filtered.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = filtered.len() / 2;

    if filtered.len() % 2 == 0 {
        (filtered[mid - 1] + filtered[mid]) / 2.0
    } else {
        filtered[mid]
    }
}
