//! Capture target parsing
//!
//! Agents describe what to capture with a single `app_target` string:
//!
//! | input                         | meaning                              |
//! |-------------------------------|--------------------------------------|
//! | absent or empty               | every screen                         |
//! | `screen:N`                    | screen with index `N`                |
//! | `frontmost`                   | the frontmost window                 |
//! | `Safari`                      | every window of an application       |
//! | `Safari:WINDOW_TITLE:Apple`   | the window whose title contains text |
//! | `Safari:WINDOW_INDEX:0`       | the window with the given index      |

use std::fmt;

const SCREEN_PREFIX: &str = "screen:";
const WINDOW_TITLE_MARKER: &str = ":WINDOW_TITLE:";
const WINDOW_INDEX_MARKER: &str = ":WINDOW_INDEX:";

/// What a capture should include
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    AllScreens,
    Screen(u32),
    Frontmost,
    Application { app: String },
    WindowTitle { app: String, title: String },
    WindowIndex { app: String, index: u32 },
}

impl CaptureTarget {
    /// Parse an `app_target` string
    ///
    /// Parsing is lenient: a malformed screen or window index degrades to the
    /// broader target (all screens, all windows of the app) with a warning.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            None | Some("") => return CaptureTarget::AllScreens,
            Some(raw) => raw,
        };

        if let Some(index) = raw.strip_prefix(SCREEN_PREFIX) {
            return match index.trim().parse::<u32>() {
                Ok(index) => CaptureTarget::Screen(index),
                Err(_) => {
                    tracing::warn!(app_target = raw, "Invalid screen index, capturing all screens");
                    CaptureTarget::AllScreens
                }
            };
        }

        if raw.eq_ignore_ascii_case("frontmost") {
            return CaptureTarget::Frontmost;
        }

        if let Some((app, title)) = raw.split_once(WINDOW_TITLE_MARKER) {
            return CaptureTarget::WindowTitle {
                app: app.to_string(),
                title: title.to_string(),
            };
        }

        if let Some((app, index)) = raw.split_once(WINDOW_INDEX_MARKER) {
            return match index.trim().parse::<u32>() {
                Ok(index) => CaptureTarget::WindowIndex {
                    app: app.to_string(),
                    index,
                },
                Err(_) => {
                    tracing::warn!(
                        app_target = raw,
                        "Invalid window index, capturing all windows of the application"
                    );
                    CaptureTarget::Application {
                        app: app.to_string(),
                    }
                }
            };
        }

        CaptureTarget::Application {
            app: raw.to_string(),
        }
    }

    /// Helper arguments selecting this target
    pub fn cli_args(&self) -> Vec<String> {
        let index_text;
        let args: Vec<&str> = match self {
            CaptureTarget::AllScreens => vec!["--mode", "screen"],
            CaptureTarget::Screen(index) => {
                index_text = index.to_string();
                vec!["--mode", "screen", "--screen-index", index_text.as_str()]
            }
            CaptureTarget::Frontmost => vec!["--mode", "frontmost"],
            CaptureTarget::Application { app } => vec!["--app", app.as_str(), "--mode", "multi"],
            CaptureTarget::WindowTitle { app, title } => vec![
                "--app",
                app.as_str(),
                "--mode",
                "window",
                "--window-title",
                title.as_str(),
            ],
            CaptureTarget::WindowIndex { app, index } => {
                index_text = index.to_string();
                vec![
                    "--app",
                    app.as_str(),
                    "--mode",
                    "window",
                    "--window-index",
                    index_text.as_str(),
                ]
            }
        };
        args.into_iter().map(String::from).collect()
    }
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTarget::AllScreens => write!(f, "all screens"),
            CaptureTarget::Screen(index) => write!(f, "screen {}", index),
            CaptureTarget::Frontmost => write!(f, "frontmost window"),
            CaptureTarget::Application { app } => write!(f, "all windows of {}", app),
            CaptureTarget::WindowTitle { app, title } => {
                write!(f, "window '{}' of {}", title, app)
            }
            CaptureTarget::WindowIndex { app, index } => {
                write!(f, "window #{} of {}", index, app)
            }
        }
    }
}
