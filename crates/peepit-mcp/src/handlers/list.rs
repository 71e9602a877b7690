//! `list` tool

use std::fmt::Write as _;

use peepit_capture::{ApplicationList, WindowDetail, WindowInfo, WindowList};

use crate::Result;
use crate::dispatcher::ToolContext;
use crate::tools::ToolResult;
use crate::validation::{ListArgs, ListItemType};

pub async fn handle(args: ListArgs, ctx: &ToolContext) -> Result<ToolResult> {
    let text = match args.item_type {
        ListItemType::ServerStatus => return Ok(ToolResult::text(ctx.status())),
        ListItemType::RunningApplications => {
            let output = ctx.capture.list_applications().await?;
            let mut text = format_applications(&output.data);
            append_messages(&mut text, &output.messages);
            text
        }
        ListItemType::ApplicationWindows => {
            // Validation guarantees an app for window listings
            let app = args.app.as_deref().unwrap_or_default();
            let output = ctx
                .capture
                .list_windows(app, &args.include_window_details)
                .await?;
            let mut text = format_windows(&output.data, &args.include_window_details);
            append_messages(&mut text, &output.messages);
            text
        }
    };
    Ok(ToolResult::text(text))
}

fn append_messages(text: &mut String, messages: &[String]) {
    if !messages.is_empty() {
        text.push_str("\n\nMessages: ");
        text.push_str(&messages.join("; "));
    }
}

pub(crate) fn format_applications(list: &ApplicationList) -> String {
    let mut text = format!("Found {} running applications:\n", list.applications.len());
    for (i, app) in list.applications.iter().enumerate() {
        let _ = write!(text, "\n{}. {}", i + 1, app.app_name);
        if let Some(bundle_id) = &app.bundle_id {
            let _ = write!(text, " ({})", bundle_id);
        }
        let _ = write!(text, " - PID: {}", app.pid);
        if app.is_active {
            text.push_str(" [ACTIVE]");
        }
        let _ = write!(text, " - Windows: {}", app.window_count);
    }
    text
}

pub(crate) fn format_windows(list: &WindowList, details: &[WindowDetail]) -> String {
    let app = &list.target_application_info;
    let mut text = format!(
        "Found {} windows for application: {}",
        list.windows.len(),
        app.app_name
    );
    if let Some(bundle_id) = &app.bundle_id {
        let _ = write!(text, " ({})", bundle_id);
    }
    let _ = write!(text, " - PID: {}", app.pid);

    if !list.windows.is_empty() {
        text.push_str("\n\nWindows:");
        for (i, window) in list.windows.iter().enumerate() {
            let _ = write!(text, "\n{}. \"{}\"", i + 1, window.window_title);
            text.push_str(&window_detail_suffix(window, details));
        }
    }
    text
}

fn window_detail_suffix(window: &WindowInfo, details: &[WindowDetail]) -> String {
    let mut suffix = String::new();
    for detail in details {
        match detail {
            WindowDetail::Ids => {
                if let Some(id) = window.window_id {
                    let _ = write!(suffix, " [ID: {}]", id);
                }
            }
            WindowDetail::OffScreen => {
                if let Some(on_screen) = window.is_on_screen {
                    suffix.push_str(if on_screen { " [ON-SCREEN]" } else { " [OFF-SCREEN]" });
                }
            }
            WindowDetail::Bounds => {
                if let Some(b) = window.bounds {
                    let _ = write!(suffix, " [{},{} {}x{}]", b.x, b.y, b.width, b.height);
                }
            }
        }
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use peepit_capture::{ApplicationInfo, TargetApplicationInfo, WindowBounds};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_applications() {
        let list = ApplicationList {
            applications: vec![
                ApplicationInfo {
                    app_name: "Finder".into(),
                    bundle_id: Some("com.apple.finder".into()),
                    pid: 101,
                    is_active: true,
                    window_count: 2,
                },
                ApplicationInfo {
                    app_name: "helperd".into(),
                    bundle_id: None,
                    pid: 7,
                    is_active: false,
                    window_count: 0,
                },
            ],
        };
        assert_eq!(
            format_applications(&list),
            "Found 2 running applications:\n\
             \n1. Finder (com.apple.finder) - PID: 101 [ACTIVE] - Windows: 2\
             \n2. helperd - PID: 7 - Windows: 0"
        );
    }

    #[test]
    fn test_format_windows_with_details() {
        let list = WindowList {
            target_application_info: TargetApplicationInfo {
                app_name: "Notes".into(),
                bundle_id: Some("com.apple.Notes".into()),
                pid: 42,
            },
            windows: vec![WindowInfo {
                window_title: "Groceries".into(),
                window_id: Some(7),
                window_index: Some(0),
                bounds: Some(WindowBounds {
                    x: 0,
                    y: 25,
                    width: 800,
                    height: 600,
                }),
                is_on_screen: Some(false),
            }],
        };
        assert_eq!(
            format_windows(
                &list,
                &[WindowDetail::Ids, WindowDetail::OffScreen, WindowDetail::Bounds]
            ),
            "Found 1 windows for application: Notes (com.apple.Notes) - PID: 42\n\
             \nWindows:\
             \n1. \"Groceries\" [ID: 7] [OFF-SCREEN] [0,25 800x600]"
        );
    }

    #[test]
    fn test_format_windows_without_details_hides_extras() {
        let list = WindowList {
            target_application_info: TargetApplicationInfo {
                app_name: "Notes".into(),
                bundle_id: None,
                pid: 42,
            },
            windows: vec![WindowInfo {
                window_title: "Groceries".into(),
                window_id: Some(7),
                window_index: None,
                bounds: None,
                is_on_screen: None,
            }],
        };
        assert_eq!(
            format_windows(&list, &[]),
            "Found 1 windows for application: Notes - PID: 42\n\nWindows:\n1. \"Groceries\""
        );
    }
}
