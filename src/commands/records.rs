use super::print_json;
use crate::context::AppContext;
use crate::session::{render_strategy_table, ViewState};
use anyhow::Result;
use log::info;

/// `page` is 1-based, as shown to users.
pub async fn run(
    app: &AppContext,
    symbol: Option<&str>,
    search: Option<&str>,
    page: usize,
) -> Result<()> {
    let lookback_days = app.settings().records_lookback_days;
    info!(
        "Loading strategy records for {} (last {} days)",
        symbol.unwrap_or("universe"),
        lookback_days
    );
    render_strategy_table(
        app.session(),
        app.client(),
        symbol,
        app.today(),
        lookback_days,
    )
    .await;

    if let Some(term) = search {
        if let Some(matches) = app.session().with_table(|table| table.search(term)) {
            info!("{} row(s) match '{}'", matches, term);
        }
    }

    match app.session().table() {
        ViewState::Ready(view) => print_json(&view.table.page(page.saturating_sub(1))),
        other => print_json(&other),
    }
}
