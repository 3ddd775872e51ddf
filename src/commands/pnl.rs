use super::print_json;
use crate::context::AppContext;
use crate::pnl::SeriesPalette;
use crate::session::{update_pnl_chart, ViewState};
use anyhow::Result;
use chrono::NaiveDate;
use log::info;

pub async fn run(
    app: &AppContext,
    from: NaiveDate,
    to: NaiveDate,
    seed: Option<u64>,
) -> Result<()> {
    info!("Building PnL chart for {} - {}", from, to);
    let mut palette = seed.map(SeriesPalette::seeded).unwrap_or_default();

    update_pnl_chart(app.session(), app.client(), from, to, &mut palette).await;

    let view = app.session().pnl();
    if let ViewState::Ready(pnl) = &view {
        info!(
            "PnL chart ready: {} series, total PnL {:.2} over {} trade(s)",
            pnl.series.len(),
            pnl.summary.total_pnl,
            pnl.summary.total_trades
        );
    }
    print_json(&view)
}
