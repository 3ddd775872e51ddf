use thiserror::Error;

/// Failures surfaced at the fetch boundary and while reading settings.
///
/// An empty but well-formed dataset is not an error; callers model it as a
/// view state instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The request could not be sent, or the server answered with a non-2xx status.
    #[error("request to {url} failed{}: {details}", status_suffix(.status))]
    NetworkFailure {
        url: String,
        status: Option<u16>,
        details: String,
    },

    /// The body parsed, but matched none of the accepted response shapes.
    #[error("malformed response from {url}: {details}")]
    MalformedResponse { url: String, details: String },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

impl DashboardError {
    pub fn network<U: Into<String>, D: Into<String>>(
        url: U,
        status: Option<u16>,
        details: D,
    ) -> Self {
        DashboardError::NetworkFailure {
            url: url.into(),
            status,
            details: details.into(),
        }
    }

    pub fn malformed<U: Into<String>, D: Into<String>>(url: U, details: D) -> Self {
        DashboardError::MalformedResponse {
            url: url.into(),
            details: details.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, DashboardError::NetworkFailure { .. })
    }
}
