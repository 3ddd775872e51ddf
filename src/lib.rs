pub mod app_url;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod models;
pub mod pnl;
pub mod records;
pub mod session;
pub mod summary;
pub mod watermark;

pub use client::DashboardClient;
pub use error::DashboardError;
pub use session::{ChartSession, ViewState};
