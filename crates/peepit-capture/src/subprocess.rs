//! Subprocess execution for the native `peepit` helper
//!
//! Every invocation passes `--json-output`, so the helper reports both
//! success and failure through a JSON envelope on stdout:
//!
//! ```json
//! {"success": true, "data": {...}, "messages": [], "debug_logs": [], "error": null}
//! ```

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::process::Command;

use crate::error::{CaptureError, Result};
use crate::types::{CaptureRequest, HelperOutput, WindowDetail};

/// Default wall-clock limit for a single helper invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Handle to the native helper executable
#[derive(Debug, Clone)]
pub struct PeepItCli {
    program: PathBuf,
    timeout: Duration,
}

impl PeepItCli {
    /// Create a handle for the helper at `program`
    ///
    /// A bare name such as `peepit` is resolved through `PATH` at spawn time.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the helper with `args` and decode its envelope
    pub async fn run<T: DeserializeOwned>(&self, args: &[String]) -> Result<HelperOutput<T>> {
        tracing::debug!(program = %self.program.display(), ?args, "Invoking peepit helper");

        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CaptureError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        parse_envelope(&output.stdout, &output.stderr, output.status.code())
    }
}

/// Arguments for an `image` invocation
pub fn image_args(request: &CaptureRequest) -> Vec<String> {
    let mut args = vec!["image".to_string()];
    args.extend(request.target.cli_args());
    args.extend([
        "--path".to_string(),
        request.path.display().to_string(),
        "--format".to_string(),
        request.format.as_str().to_string(),
        "--capture-focus".to_string(),
        request.focus.as_str().to_string(),
        "--json-output".to_string(),
    ]);
    args
}

/// Arguments for a `list apps` invocation
pub fn list_apps_args() -> Vec<String> {
    ["list", "apps", "--json-output"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Arguments for a `list windows` invocation
pub fn list_windows_args(app: &str, details: &[WindowDetail]) -> Vec<String> {
    let mut args = vec![
        "list".to_string(),
        "windows".to_string(),
        "--app".to_string(),
        app.to_string(),
    ];
    if !details.is_empty() {
        let joined: Vec<&str> = details.iter().map(WindowDetail::as_str).collect();
        args.push("--include-details".to_string());
        args.push(joined.join(","));
    }
    args.push("--json-output".to_string());
    args
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    debug_logs: Vec<String>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Decode the helper's stdout into a typed result
///
/// The envelope takes precedence over the exit status: the helper exits
/// non-zero on failure but still prints a structured error on stdout.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    stdout: &[u8],
    stderr: &[u8],
    exit_code: Option<i32>,
) -> Result<HelperOutput<T>> {
    let envelope: Envelope = match serde_json::from_slice(stdout) {
        Ok(envelope) => envelope,
        Err(e) => {
            if exit_code == Some(0) {
                return Err(CaptureError::InvalidOutput(e.to_string()));
            }
            let stderr = String::from_utf8_lossy(stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(CaptureError::CommandFailed {
                code: exit_code.unwrap_or(-1),
                stderr,
            });
        }
    };

    for line in &envelope.debug_logs {
        tracing::debug!(helper_log = %line, "peepit helper debug output");
    }

    if !envelope.success {
        let (message, code, details) = match envelope.error {
            Some(error) => (error.message, error.code, error.details),
            None => (
                "peepit helper reported a failure without a message".to_string(),
                None,
                None,
            ),
        };
        return Err(CaptureError::Reported {
            message,
            code,
            details,
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| CaptureError::InvalidOutput("envelope is missing `data`".to_string()))?;
    let data = serde_json::from_value(data).map_err(|e| CaptureError::InvalidOutput(e.to_string()))?;

    Ok(HelperOutput {
        data,
        messages: envelope.messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::CaptureTarget;
    use crate::types::{ApplicationList, CaptureData, CaptureFocus, ImageFormat};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_args() {
        let request = CaptureRequest {
            target: CaptureTarget::Application {
                app: "Safari".into(),
            },
            path: PathBuf::from("/tmp/shots"),
            format: ImageFormat::Jpg,
            focus: CaptureFocus::Background,
        };
        assert_eq!(
            image_args(&request),
            vec![
                "image",
                "--app",
                "Safari",
                "--mode",
                "multi",
                "--path",
                "/tmp/shots",
                "--format",
                "jpg",
                "--capture-focus",
                "background",
                "--json-output",
            ]
        );
    }

    #[test]
    fn test_list_windows_args_without_details() {
        assert_eq!(
            list_windows_args("Notes", &[]),
            vec!["list", "windows", "--app", "Notes", "--json-output"]
        );
    }

    #[test]
    fn test_list_windows_args_with_details() {
        assert_eq!(
            list_windows_args("Notes", &[WindowDetail::Ids, WindowDetail::Bounds]),
            vec![
                "list",
                "windows",
                "--app",
                "Notes",
                "--include-details",
                "ids,bounds",
                "--json-output",
            ]
        );
    }

    #[test]
    fn test_parse_successful_envelope() {
        let stdout = br#"{
            "success": true,
            "data": {"saved_files": [{"path": "/tmp/a.png", "item_label": "Screen 1"}]},
            "messages": ["Captured 1 image"],
            "debug_logs": ["resolved screen 0"]
        }"#;
        let output: HelperOutput<CaptureData> = parse_envelope(stdout, b"", Some(0)).unwrap();
        assert_eq!(output.data.saved_files.len(), 1);
        assert_eq!(output.messages, vec!["Captured 1 image".to_string()]);
    }

    #[test]
    fn test_parse_reported_failure_with_nonzero_exit() {
        let stdout = br#"{
            "success": false,
            "error": {"message": "Application 'Nope' not found", "code": "APP_NOT_FOUND"}
        }"#;
        let err = parse_envelope::<ApplicationList>(stdout, b"", Some(1)).unwrap_err();
        match err {
            CaptureError::Reported { message, code, .. } => {
                assert_eq!(message, "Application 'Nope' not found");
                assert_eq!(code.as_deref(), Some("APP_NOT_FOUND"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_with_nonzero_exit_reports_stderr() {
        let err = parse_envelope::<ApplicationList>(b"", b"permission denied\n", Some(2)).unwrap_err();
        match err {
            CaptureError::CommandFailed { code, stderr } => {
                assert_eq!(code, 2);
                assert_eq!(stderr, "permission denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_with_zero_exit_is_invalid_output() {
        let err = parse_envelope::<ApplicationList>(b"not json", b"", Some(0)).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidOutput(_)));
    }

    #[test]
    fn test_parse_success_without_data_is_invalid_output() {
        let err = parse_envelope::<ApplicationList>(br#"{"success": true}"#, b"", Some(0)).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidOutput(_)));
    }
}
