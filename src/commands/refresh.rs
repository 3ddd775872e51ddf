use super::print_json;
use crate::context::AppContext;
use crate::pnl::SeriesPalette;
use crate::session::{update_pnl_chart, update_watermark_heatmap, HeatmapView, PnlView, ViewState};
use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

#[derive(Serialize)]
struct RefreshOutput {
    pnl: ViewState<PnlView>,
    heatmap: ViewState<HeatmapView>,
}

/// Reloads the PnL chart and the heatmap concurrently for the same range.
pub async fn run(app: &AppContext, from: NaiveDate, to: NaiveDate) -> Result<()> {
    info!("Refreshing dashboard charts for {} - {}", from, to);
    let mut palette = SeriesPalette::new();
    let session = app.session();

    let (pnl_committed, heatmap_committed) = futures::join!(
        update_pnl_chart(session, app.client(), from, to, &mut palette),
        update_watermark_heatmap(session, app.client(), from, to, app.today()),
    );
    info!(
        "Refresh complete (pnl committed: {}, heatmap committed: {})",
        pnl_committed, heatmap_committed
    );

    print_json(&RefreshOutput {
        pnl: session.pnl(),
        heatmap: session.heatmap(),
    })
}
