use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Step of the pipeline in which a failure happened.
///
/// Reported alongside the class code so that a failed multi-request aggregation
/// can be diagnosed without a backtrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading or parsing the dataset description and legend properties
    Metadata,
    /// Masking the raster to the region of interest
    Clip,
    /// Server-side reduction (pixel counts, histograms)
    Reduce,
    /// Requesting map tiles for display
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Metadata => "metadata",
            Stage::Clip => "clip",
            Stage::Reduce => "reduce",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Failure talking to the remote raster platform or the geocoder
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("platform returned error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlatformError {
    /// Map a reqwest error, keeping timeouts distinct so callers can tell them apart.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            PlatformError::Timeout(timeout)
        } else if err.is_decode() {
            PlatformError::Decode(err.to_string())
        } else {
            PlatformError::Http(err)
        }
    }
}

/// Errors raised by legend resolution, clipping, aggregation and export
#[derive(Debug, Error)]
pub enum CorineError {
    #[error("malformed legend metadata: {0}")]
    MalformedMetadata(String),

    #[error("region does not intersect the coverage of {dataset}: no valid pixels after clipping")]
    EmptyRegion { dataset: String },

    #[error("{} failed at stage {stage}: {source}", describe_code(.code))]
    Aggregation {
        code: Option<i64>,
        stage: Stage,
        #[source]
        source: PlatformError,
    },

    #[error("could not resolve place {query:?}: {reason}")]
    Geocode { query: String, reason: String },

    #[error("export failed: {0}")]
    Export(String),

    #[error("no region of interest set")]
    MissingRegion,

    #[error("no results available, call run() first")]
    NotRun,
}

fn describe_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => format!("class {}", code),
        None => "request".to_string(),
    }
}

impl CorineError {
    /// Wrap a platform failure for the given stage, without a class code.
    pub fn platform(stage: Stage, source: PlatformError) -> Self {
        CorineError::Aggregation {
            code: None,
            stage,
            source,
        }
    }

    /// Wrap a platform failure raised while reducing one class.
    pub fn class(code: i64, stage: Stage, source: PlatformError) -> Self {
        CorineError::Aggregation {
            code: Some(code),
            stage,
            source,
        }
    }
}

pub type CorineResult<T> = std::result::Result<T, CorineError>;
