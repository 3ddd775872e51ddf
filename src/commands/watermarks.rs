use super::print_json;
use crate::context::AppContext;
use crate::session::update_watermark_heatmap;
use anyhow::Result;
use chrono::NaiveDate;
use log::info;

pub async fn run(app: &AppContext, from: NaiveDate, to: NaiveDate) -> Result<()> {
    info!("Building watermark heatmap for {} - {}", from, to);
    update_watermark_heatmap(app.session(), app.client(), from, to, app.today()).await;
    print_json(&app.session().heatmap())
}
