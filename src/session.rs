use crate::client::DashboardClient;
use crate::dates::default_lookback;
use crate::error::DashboardError;
use crate::models::{ChartSeries, TradeRecord, WatermarkMatrix, WatermarkResponse};
use crate::pnl::{build_pnl_series, SeriesPalette};
use crate::records::StrategyTable;
use crate::summary::PerformanceSummary;
use crate::watermark::{build_watermark_matrix, MAX_LEVEL, MIN_LEVEL};
use chrono::NaiveDate;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const NO_DATA_MESSAGE: &str = "No data available";
pub const ERROR_LOADING_MESSAGE: &str = "Error loading data";

const DEFAULT_MIN_WATERMARK: f64 = 0.0;
const DEFAULT_MAX_WATERMARK: f64 = MAX_LEVEL as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Pnl,
    Heatmap,
    Table,
}

/// Issued by [`ChartSession::begin`]; a result is only committed while its
/// token is the newest one for that view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    kind: ViewKind,
    seq: u64,
}

impl RequestToken {
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    Pending,
    Ready(T),
    NoData,
    ErrorLoading(String),
}

impl<T> ViewState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            ViewState::NoData => Some(NO_DATA_MESSAGE),
            ViewState::ErrorLoading(_) => Some(ERROR_LOADING_MESSAGE),
            ViewState::Pending | ViewState::Ready(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub series: Vec<ChartSeries>,
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub matrix: WatermarkMatrix,
    pub min_watermark: f64,
    pub max_watermark: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub symbol: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub table: StrategyTable,
}

/// Chart and table state for one mounted dashboard view.
///
/// Cloning shares the same state. After [`unmount`](Self::unmount) every
/// later commit is ignored.
#[derive(Clone, Default)]
pub struct ChartSession {
    inner: Arc<Mutex<SessionData>>,
}

#[derive(Default)]
struct SessionData {
    mounted: bool,
    issued: [u64; 3],
    pnl: Option<ViewState<PnlView>>,
    heatmap: Option<ViewState<HeatmapView>>,
    table: Option<ViewState<TableView>>,
}

impl SessionData {
    fn slot(kind: ViewKind) -> usize {
        match kind {
            ViewKind::Pnl => 0,
            ViewKind::Heatmap => 1,
            ViewKind::Table => 2,
        }
    }

    fn accepts(&self, token: RequestToken) -> bool {
        self.mounted && self.issued[Self::slot(token.kind)] == token.seq
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub mounted: bool,
    pub pnl: ViewState<PnlView>,
    pub heatmap: ViewState<HeatmapView>,
    pub table: ViewState<TableView>,
}

impl ChartSession {
    pub fn mount() -> Self {
        debug!("Chart session mounted");
        Self {
            inner: Arc::new(Mutex::new(SessionData {
                mounted: true,
                ..Default::default()
            })),
        }
    }

    pub fn unmount(&self) {
        if let Ok(mut data) = self.inner.lock() {
            data.mounted = false;
            data.pnl = None;
            data.heatmap = None;
            data.table = None;
        }
        debug!("Chart session unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.lock().map(|data| data.mounted).unwrap_or(false)
    }

    pub fn begin(&self, kind: ViewKind) -> RequestToken {
        let seq = match self.inner.lock() {
            Ok(mut data) => {
                let slot = SessionData::slot(kind);
                data.issued[slot] += 1;
                data.issued[slot]
            }
            Err(_) => 0,
        };
        RequestToken { kind, seq }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.inner
            .lock()
            .map(|data| data.accepts(token))
            .unwrap_or(false)
    }

    pub fn commit_pnl(&self, token: RequestToken, state: ViewState<PnlView>) -> bool {
        self.commit(token, ViewKind::Pnl, |data| data.pnl = Some(state))
    }

    pub fn commit_heatmap(&self, token: RequestToken, state: ViewState<HeatmapView>) -> bool {
        self.commit(token, ViewKind::Heatmap, |data| data.heatmap = Some(state))
    }

    pub fn commit_table(&self, token: RequestToken, state: ViewState<TableView>) -> bool {
        self.commit(token, ViewKind::Table, |data| data.table = Some(state))
    }

    fn commit<F>(&self, token: RequestToken, kind: ViewKind, apply: F) -> bool
    where
        F: FnOnce(&mut SessionData),
    {
        if token.kind != kind {
            debug!("Ignoring {:?} token for the {:?} view", token.kind, kind);
            return false;
        }
        let Ok(mut data) = self.inner.lock() else {
            return false;
        };
        if !data.accepts(token) {
            debug!(
                "Dropping stale {:?} result (request #{}, latest #{}, mounted: {})",
                kind,
                token.seq,
                data.issued[SessionData::slot(kind)],
                data.mounted
            );
            return false;
        }
        apply(&mut *data);
        true
    }

    pub fn pnl(&self) -> ViewState<PnlView> {
        self.inner
            .lock()
            .ok()
            .and_then(|data| data.pnl.clone())
            .unwrap_or(ViewState::Pending)
    }

    pub fn heatmap(&self) -> ViewState<HeatmapView> {
        self.inner
            .lock()
            .ok()
            .and_then(|data| data.heatmap.clone())
            .unwrap_or(ViewState::Pending)
    }

    pub fn table(&self) -> ViewState<TableView> {
        self.inner
            .lock()
            .ok()
            .and_then(|data| data.table.clone())
            .unwrap_or(ViewState::Pending)
    }

    pub fn with_table<R>(&self, apply: impl FnOnce(&mut StrategyTable) -> R) -> Option<R> {
        let mut data = self.inner.lock().ok()?;
        let applied = match data.table.as_mut() {
            Some(ViewState::Ready(view)) => Some(apply(&mut view.table)),
            _ => None,
        };
        applied
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mounted: self.is_mounted(),
            pnl: self.pnl(),
            heatmap: self.heatmap(),
            table: self.table(),
        }
    }
}

/// Fetches `/performance` for `[from, to]` and replaces the PnL chart.
/// Returns whether the result was committed.
pub async fn update_pnl_chart(
    session: &ChartSession,
    client: &DashboardClient,
    from: NaiveDate,
    to: NaiveDate,
    palette: &mut SeriesPalette,
) -> bool {
    let token = session.begin(ViewKind::Pnl);
    let result = client.fetch_performance(from, to).await;
    let state = pnl_state(result, from, to, palette);
    session.commit_pnl(token, state)
}

pub async fn update_watermark_heatmap(
    session: &ChartSession,
    client: &DashboardClient,
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
) -> bool {
    let token = session.begin(ViewKind::Heatmap);
    let result = client.fetch_watermarks(from, to).await;
    let state = heatmap_state(result, from, to, today);
    session.commit_heatmap(token, state)
}

pub async fn render_strategy_table(
    session: &ChartSession,
    client: &DashboardClient,
    symbol: Option<&str>,
    today: NaiveDate,
    lookback_days: u32,
) -> bool {
    let token = session.begin(ViewKind::Table);
    let (from, to) = match default_lookback(today, lookback_days) {
        Ok(window) => window,
        Err(err) => {
            error!("Failed to load strategy records: {}", err);
            return session.commit_table(token, ViewState::ErrorLoading(err.to_string()));
        }
    };
    let result = client.fetch_records(symbol, from, to).await;
    let state = table_state(result, symbol, from, to);
    session.commit_table(token, state)
}

pub fn pnl_state(
    result: Result<Vec<TradeRecord>, DashboardError>,
    from: NaiveDate,
    to: NaiveDate,
    palette: &mut SeriesPalette,
) -> ViewState<PnlView> {
    let records = match result {
        Ok(records) => records,
        Err(err) => {
            error!("Failed to load PnL data: {}", err);
            return ViewState::ErrorLoading(err.to_string());
        }
    };
    if records.is_empty() {
        info!("No performance records between {} and {}", from, to);
        return ViewState::NoData;
    }

    let series = build_pnl_series(&records, from, to, palette);
    if series.is_empty() {
        info!("Empty PnL date range {} to {}", from, to);
        return ViewState::NoData;
    }
    ViewState::Ready(PnlView {
        from,
        to,
        series,
        summary: PerformanceSummary::from_records(&records),
    })
}

pub fn heatmap_state(
    result: Result<WatermarkResponse, DashboardError>,
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
) -> ViewState<HeatmapView> {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to load watermark data: {}", err);
            return ViewState::ErrorLoading(err.to_string());
        }
    };
    let Some(matrix) = build_watermark_matrix(&response.watermarks, today) else {
        info!("No watermark samples between {} and {}", from, to);
        return ViewState::NoData;
    };
    debug!(
        "Heatmap levels {}..{}, {} week(s), max count {}",
        MIN_LEVEL,
        MAX_LEVEL,
        matrix.week_labels.len(),
        matrix.max_value
    );
    ViewState::Ready(HeatmapView {
        from,
        to,
        matrix,
        min_watermark: response.min_watermark.unwrap_or(DEFAULT_MIN_WATERMARK),
        max_watermark: response.max_watermark.unwrap_or(DEFAULT_MAX_WATERMARK),
    })
}

pub fn table_state(
    result: Result<Vec<Value>, DashboardError>,
    symbol: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
) -> ViewState<TableView> {
    let records = match result {
        Ok(records) => records,
        Err(err) => {
            error!("Failed to load strategy records: {}", err);
            return ViewState::ErrorLoading(err.to_string());
        }
    };
    if records.is_empty() {
        info!(
            "No strategy records for {} between {} and {}",
            symbol.unwrap_or("universe"),
            from,
            to
        );
        return ViewState::NoData;
    }
    ViewState::Ready(TableView {
        symbol: symbol.map(str::to_string),
        from,
        to,
        table: StrategyTable::from_records(&records),
    })
}
