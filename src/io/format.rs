//! Text or JSON output selection and the `--json` envelope.

use std::time::Duration;

use serde::Serialize;

use crate::error::IndexError;
use crate::io::exit_code::ExitCode;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    #[must_use]
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Envelope printed by `--json` commands.
///
/// Successful runs carry `data`; failures carry `message` and the recovery
/// hints of the underlying [`IndexError`]. `code` and `exit_code` mirror what
/// the process reports to the shell.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub ok: bool,
    pub code: String,
    pub exit_code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            code: "OK".to_string(),
            exit_code: ExitCode::Success as u8,
            data: Some(data),
            message: None,
            suggestions: Vec::new(),
            version: env!("CARGO_PKG_VERSION"),
            elapsed_ms: None,
        }
    }

    /// Records how long the command took.
    #[must_use]
    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

impl JsonResponse<()> {
    pub fn failure(error: &IndexError) -> Self {
        Self {
            ok: false,
            code: error.status_code(),
            exit_code: ExitCode::from_error(error) as u8,
            data: None,
            message: Some(error.to_string()),
            suggestions: error.recovery_suggestions(),
            version: env!("CARGO_PKG_VERSION"),
            elapsed_ms: None,
        }
    }
}
