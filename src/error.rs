use thiserror::Error;

/// Errors surfaced by the dataset store and the filter engine.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The source could not be fetched or read at all (missing file, network
    /// or HTTP failure, broken container, unsupported format).
    #[error("tips data unavailable from {origin}: {source}")]
    DataUnavailable {
        /// File path or URL the data was requested from.
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The source was read but yields no usable dataset.
    #[error("tips data failed integrity checks: {message}")]
    DataIntegrity { message: String },

    /// A bill range whose low bound is above its high bound.
    #[error("invalid bill range: low bound {lo} is above high bound {hi}")]
    InvalidRange { lo: f64, hi: f64 },
}

impl DashboardError {
    pub(crate) fn unavailable(
        origin: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DashboardError::DataUnavailable {
            origin: origin.into(),
            source: source.into(),
        }
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        DashboardError::DataIntegrity {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
