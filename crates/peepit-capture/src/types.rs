//! Shared types for helper requests and results

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::target::CaptureTarget;

/// File format the helper writes captures in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the helper may bring the target to the foreground before capturing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFocus {
    Background,
    #[default]
    Auto,
    Foreground,
}

impl CaptureFocus {
    pub const ALL: [CaptureFocus; 3] = [
        CaptureFocus::Background,
        CaptureFocus::Auto,
        CaptureFocus::Foreground,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureFocus::Background => "background",
            CaptureFocus::Auto => "auto",
            CaptureFocus::Foreground => "foreground",
        }
    }
}

/// Optional per-window details for window listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowDetail {
    OffScreen,
    Bounds,
    Ids,
}

impl WindowDetail {
    pub const ALL: [WindowDetail; 3] = [WindowDetail::OffScreen, WindowDetail::Bounds, WindowDetail::Ids];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowDetail::OffScreen => "off_screen",
            WindowDetail::Bounds => "bounds",
            WindowDetail::Ids => "ids",
        }
    }
}

impl FromStr for WindowDetail {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|detail| detail.as_str() == s)
            .ok_or_else(|| format!("Unknown window detail: {}", s))
    }
}

/// A single capture invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// What to capture
    pub target: CaptureTarget,
    /// File or directory the helper writes into
    pub path: PathBuf,
    /// File format
    pub format: ImageFormat,
    /// Focus behaviour
    pub focus: CaptureFocus,
}

/// Decoded helper result together with its informational messages
#[derive(Debug, Clone, PartialEq)]
pub struct HelperOutput<T> {
    pub data: T,
    pub messages: Vec<String>,
}

/// A file written by a capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFile {
    pub path: PathBuf,
    #[serde(default)]
    pub item_label: Option<String>,
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub window_id: Option<u32>,
    #[serde(default)]
    pub window_index: Option<u32>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl SavedFile {
    /// Label used when presenting this file to a user
    pub fn label(&self) -> &str {
        self.window_title
            .as_deref()
            .or(self.item_label.as_deref())
            .unwrap_or("capture")
    }
}

/// `data` payload of a capture envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureData {
    #[serde(default)]
    pub saved_files: Vec<SavedFile>,
}

/// A running application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub app_name: String,
    #[serde(default)]
    pub bundle_id: Option<String>,
    pub pid: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub window_count: u32,
}

/// `data` payload of a `list apps` envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<ApplicationInfo>,
}

/// Window position and size in screen points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A single window of an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub window_title: String,
    #[serde(default)]
    pub window_id: Option<u32>,
    #[serde(default)]
    pub window_index: Option<u32>,
    #[serde(default)]
    pub bounds: Option<WindowBounds>,
    #[serde(default)]
    pub is_on_screen: Option<bool>,
}

/// The application a window listing refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetApplicationInfo {
    pub app_name: String,
    #[serde(default)]
    pub bundle_id: Option<String>,
    pub pid: i32,
}

/// `data` payload of a `list windows` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowList {
    pub target_application_info: TargetApplicationInfo,
    #[serde(default)]
    pub windows: Vec<WindowInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_detail_parse() {
        assert_eq!("off_screen".parse::<WindowDetail>().unwrap(), WindowDetail::OffScreen);
        assert!("OFF_SCREEN".parse::<WindowDetail>().is_err());
    }

    #[test]
    fn test_saved_file_label_prefers_window_title() {
        let file = SavedFile {
            path: PathBuf::from("/tmp/a.png"),
            item_label: Some("Safari".into()),
            window_title: Some("Apple".into()),
            window_id: None,
            window_index: None,
            mime_type: None,
        };
        assert_eq!(file.label(), "Apple");
    }

    #[test]
    fn test_window_list_deserialize() {
        let json = r#"{
            "target_application_info": {"app_name": "Notes", "bundle_id": "com.apple.Notes", "pid": 42},
            "windows": [
                {"window_title": "Groceries", "window_id": 7, "bounds": {"x": 0, "y": 25, "width": 800, "height": 600}}
            ]
        }"#;
        let list: WindowList = serde_json::from_str(json).unwrap();
        assert_eq!(list.target_application_info.pid, 42);
        assert_eq!(list.windows.len(), 1);
        assert_eq!(list.windows[0].window_id, Some(7));
        assert!(list.windows[0].is_on_screen.is_none());
    }
}
