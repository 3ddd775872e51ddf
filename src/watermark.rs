use crate::dates::week_labels;
use crate::models::{WatermarkMatrix, WatermarkPoint, WatermarkSample};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

/// Lowest watermark level on the heatmap y-axis (inclusive).
pub const MIN_LEVEL: u32 = 20;
/// Upper bound of the y-axis (exclusive).
pub const MAX_LEVEL: u32 = 40;

pub const EMPTY_CELL_COLOR: &str = "rgba(229, 231, 235, 0.3)";

pub fn level_labels() -> Vec<String> {
    (MIN_LEVEL..MAX_LEVEL).map(|level| level.to_string()).collect()
}

/// Expands sparse `(week, level, count)` samples into the full 52 x 20 grid.
///
/// Returns `None` when there are no samples at all, so the caller can show a
/// placeholder instead of an all-zero heatmap.
pub fn build_watermark_matrix(
    samples: &[WatermarkSample],
    today: NaiveDate,
) -> Option<WatermarkMatrix> {
    if samples.is_empty() {
        return None;
    }

    let weeks = week_labels(today);
    let levels = level_labels();

    let counts: HashMap<(&str, &str), i64> = samples
        .iter()
        .map(|sample| ((sample.x.as_str(), sample.y.as_str()), sample.value))
        .collect();

    let max_value = samples
        .iter()
        .map(|sample| sample.value)
        .max()
        .unwrap_or(0)
        .max(1);

    let mut cells = Vec::with_capacity(weeks.len() * levels.len());
    let mut matched = 0usize;
    for week in &weeks {
        for (level, label) in (MIN_LEVEL..MAX_LEVEL).zip(&levels) {
            let count = match counts.get(&(week.as_str(), label.as_str())) {
                Some(count) => {
                    matched += 1;
                    *count
                }
                None => 0,
            };
            cells.push(WatermarkPoint {
                week_label: week.clone(),
                level,
                count,
                color: heat_color(count, max_value),
            });
        }
    }

    if matched < counts.len() {
        debug!(
            "{} watermark sample(s) fell outside the {}-week grid",
            counts.len() - matched,
            weeks.len()
        );
    }

    Some(WatermarkMatrix {
        week_labels: weeks,
        level_labels: levels,
        cells,
        max_value,
    })
}

/// Heat colour for a cell: light yellow through orange to deep red.
pub fn heat_color(count: i64, max_value: i64) -> String {
    if count <= 0 {
        return EMPTY_CELL_COLOR.to_string();
    }

    let intensity = (count as f64 / max_value.max(1) as f64).min(1.0);
    let adjusted = intensity.powf(0.7);

    let (green, blue) = if adjusted < 0.25 {
        let t = adjusted / 0.25;
        (255.0 - t * 30.0, 200.0 - t * 200.0)
    } else if adjusted < 0.5 {
        let t = (adjusted - 0.25) / 0.25;
        (225.0 - t * 60.0, 0.0)
    } else if adjusted < 0.75 {
        let t = (adjusted - 0.5) / 0.25;
        (165.0 - t * 65.0, 0.0)
    } else {
        let t = (adjusted - 0.75) / 0.25;
        (100.0 - t * 100.0, 0.0)
    };

    format!(
        "rgb(255, {}, {})",
        green.round() as i64,
        blue.round() as i64
    )
}
