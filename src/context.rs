use crate::client::DashboardClient;
use crate::config::DashboardSettings;
use crate::session::ChartSession;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::info;

/// Shared state handed to every command: validated settings, the HTTP client
/// and the chart session the command renders into.
#[derive(Clone)]
pub struct AppContext {
    settings: DashboardSettings,
    client: DashboardClient,
    session: ChartSession,
}

impl AppContext {
    pub fn initialize(settings: DashboardSettings) -> Result<Self> {
        let client = DashboardClient::new(&settings.base_url, Some(settings.request_timeout))?;
        info!(
            "Using dashboard API at {} (timeout {}s)",
            client.base_url(),
            settings.request_timeout.as_secs()
        );
        Ok(Self {
            settings,
            client,
            session: ChartSession::mount(),
        })
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }

    pub fn session(&self) -> &ChartSession {
        &self.session
    }

    /// Local calendar date anchoring the heatmap and the records lookback.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
