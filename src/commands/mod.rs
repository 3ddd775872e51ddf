pub mod pnl;
pub mod records;
pub mod refresh;
pub mod watermarks;

use anyhow::{Context, Result};
use serde::Serialize;

/// Views are emitted on stdout as pretty JSON; logs go to stderr.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize view as JSON")?;
    println!("{}", rendered);
    Ok(())
}
