//! Tests that run a stand-in helper executable
//!
//! The fake helper is a small shell script that prints a canned envelope,
//! so these only run on unix hosts.

use std::path::PathBuf;
use std::time::Duration;

use peepit_capture::{
    CaptureBridge, CaptureError, CaptureFocus, CaptureRequest, CaptureTarget, ImageFormat,
    PeepItCli, WindowDetail,
};
use pretty_assertions::assert_eq;

#[cfg(unix)]
fn fake_helper(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("peepit");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_list_applications_decodes_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let helper = fake_helper(
        &dir,
        r#"cat <<'EOF'
{"success": true, "data": {"applications": [
  {"app_name": "Finder", "bundle_id": "com.apple.finder", "pid": 101, "is_active": true, "window_count": 2},
  {"app_name": "Notes", "pid": 202, "window_count": 0}
]}, "messages": [], "debug_logs": ["enumerated 2 apps"]}
EOF"#,
    );

    let cli = PeepItCli::new(helper);
    let output = cli.list_applications().await.unwrap();

    assert_eq!(output.data.applications.len(), 2);
    assert_eq!(output.data.applications[0].app_name, "Finder");
    assert!(output.data.applications[0].is_active);
    assert_eq!(output.data.applications[1].bundle_id, None);
}

#[cfg(unix)]
#[tokio::test]
async fn test_helper_receives_expected_arguments() {
    let dir = tempfile::tempdir().unwrap();
    // Echo argv back as the single saved file's label
    let helper = fake_helper(
        &dir,
        r#"printf '{"success": true, "data": {"saved_files": [{"path": "/tmp/x.png", "item_label": "%s"}]}}' "$*""#,
    );

    let request = CaptureRequest {
        target: CaptureTarget::WindowIndex {
            app: "Notes".into(),
            index: 1,
        },
        path: PathBuf::from("/tmp/out"),
        format: ImageFormat::Png,
        focus: CaptureFocus::Auto,
    };
    let output = PeepItCli::new(helper).capture(&request).await.unwrap();

    assert_eq!(
        output.data.saved_files[0].item_label.as_deref(),
        Some(
            "image --app Notes --mode window --window-index 1 --path /tmp/out --format png --capture-focus auto --json-output"
        )
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_reported_failure_surfaces_helper_message() {
    let dir = tempfile::tempdir().unwrap();
    let helper = fake_helper(
        &dir,
        r#"echo '{"success": false, "error": {"message": "Application not found: Nope", "code": "APP_NOT_FOUND"}}'
exit 1"#,
    );

    let err = PeepItCli::new(helper)
        .list_windows("Nope", &[WindowDetail::Ids])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Application not found: Nope");
}

#[cfg(unix)]
#[tokio::test]
async fn test_crash_without_envelope_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let helper = fake_helper(&dir, "echo 'screen recording permission denied' >&2\nexit 3");

    let err = PeepItCli::new(helper).list_applications().await.unwrap_err();

    match err {
        CaptureError::CommandFailed { code, stderr } => {
            assert_eq!(code, 3);
            assert_eq!(stderr, "screen recording permission denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_helper_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let helper = fake_helper(&dir, "sleep 5");

    let err = PeepItCli::new(helper)
        .with_timeout(Duration::from_millis(200))
        .list_applications()
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::Timeout { .. }));
}

#[tokio::test]
async fn test_missing_helper_is_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let cli = PeepItCli::new(dir.path().join("does-not-exist"));

    let err = cli.list_applications().await.unwrap_err();

    assert!(matches!(err, CaptureError::Spawn { .. }));
    assert!(err.to_string().starts_with("Failed to launch peepit helper"));
}
