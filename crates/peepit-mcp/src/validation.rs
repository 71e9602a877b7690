//! Argument validation
//!
//! [`validate`] turns a tool name and its untyped argument object into a
//! typed [`ToolArguments`] value or a [`ValidationError`]. Every violated
//! constraint produces one issue message; cross-field rules are only checked
//! once each field is valid on its own.
//!
//! Issue messages never contain `", "` because they are joined with that
//! separator when reported.

use peepit_ai::{ProviderChoice, ProviderKind};
use peepit_capture::{CaptureFocus, ImageFormat, WindowDetail};
use serde_json::{Map, Value};

/// Output format requested from the `image` tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    /// Return the capture inline as Base64
    Data,
}

impl OutputFormat {
    /// Format the helper writes to disk
    pub fn file_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png | OutputFormat::Data => ImageFormat::Png,
            OutputFormat::Jpg => ImageFormat::Jpg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArgs {
    pub app_target: Option<String>,
    pub path: Option<String>,
    pub question: Option<String>,
    pub format: OutputFormat,
    /// Caller's `format` value when it was not recognised and PNG was used
    pub original_format: Option<String>,
    pub capture_focus: CaptureFocus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub choice: ProviderChoice,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeArgs {
    pub image_path: String,
    pub question: String,
    pub provider_config: ProviderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListItemType {
    RunningApplications,
    ApplicationWindows,
    ServerStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    pub item_type: ListItemType,
    pub app: Option<String>,
    pub include_window_details: Vec<WindowDetail>,
}

/// Validated arguments, tagged by tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolArguments {
    Image(ImageArgs),
    Analyze(AnalyzeArgs),
    List(ListArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments: {}", issues.join(", "))]
    Invalid { issues: Vec<String> },
}

const PROVIDER_TYPES: [(&str, ProviderChoice); 3] = [
    ("auto", ProviderChoice::Auto),
    ("ollama", ProviderChoice::Specific(ProviderKind::Ollama)),
    ("openai", ProviderChoice::Specific(ProviderKind::OpenAi)),
];

const ITEM_TYPES: [(&str, ListItemType); 3] = [
    ("running_applications", ListItemType::RunningApplications),
    ("application_windows", ListItemType::ApplicationWindows),
    ("server_status", ListItemType::ServerStatus),
];

type Parser = fn(&mut Fields<'_>) -> Option<ToolArguments>;

/// Validate `raw` against the schema of `tool_name`
///
/// `null` arguments are treated as an empty object.
pub fn validate(tool_name: &str, raw: &Value) -> Result<ToolArguments, ValidationError> {
    let parser: Parser = match tool_name {
        "image" => parse_image,
        "analyze" => parse_analyze,
        "list" => parse_list,
        _ => {
            return Err(ValidationError::UnknownTool {
                name: tool_name.to_string(),
            });
        }
    };

    let empty = Map::new();
    let map = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::Invalid {
                issues: vec![format!(
                    "arguments must be an object (got {})",
                    value_type_name(other)
                )],
            });
        }
    };

    let mut fields = Fields::new(map, "");
    match parser(&mut fields) {
        Some(args) if fields.issues.is_empty() => Ok(args),
        _ => Err(ValidationError::Invalid {
            issues: fields.issues,
        }),
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn choice_list<T>(choices: &[(&str, T)]) -> String {
    choices
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|")
}

/// Field reader that collects issues instead of failing fast
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: &'static str,
    issues: Vec<String>,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, prefix: &'static str) -> Self {
        Self {
            map,
            prefix,
            issues: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn issue(&mut self, key: &str, problem: impl std::fmt::Display) {
        self.issues.push(format!("{}{} {}", self.prefix, key, problem));
    }

    fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.issue(key, format!("must be a string (got {})", value_type_name(other)));
                None
            }
        }
    }

    fn required_string(&mut self, key: &str) -> Option<String> {
        match self.get(key) {
            None => {
                self.issue(key, "is required");
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.issue(key, "must not be empty");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.issue(key, format!("must be a string (got {})", value_type_name(other)));
                None
            }
        }
    }

    /// An empty string counts as absent
    fn optional_enum<T: Copy>(&mut self, key: &str, choices: &[(&str, T)]) -> Option<T> {
        let raw = self.optional_string(key)?;
        if raw.is_empty() {
            return None;
        }
        match choices.iter().find(|(name, _)| *name == raw) {
            Some((_, value)) => Some(*value),
            None => {
                self.issue(key, format!("must be one of {}", choice_list(choices)));
                None
            }
        }
    }

    /// Lenient `format`: unknown strings become PNG and are remembered
    fn image_format(&mut self) -> (OutputFormat, Option<String>) {
        let raw = match self.get("format") {
            None => return (OutputFormat::Png, None),
            Some(Value::String(raw)) => raw,
            Some(other) => {
                let problem = format!("must be a string (got {})", value_type_name(other));
                self.issue("format", problem);
                return (OutputFormat::Png, None);
            }
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "png" => (OutputFormat::Png, None),
            "jpg" | "jpeg" => (OutputFormat::Jpg, None),
            "data" => (OutputFormat::Data, None),
            _ => (OutputFormat::Png, Some(raw.clone())),
        }
    }

    fn provider_config(&mut self) -> ProviderConfig {
        let map = match self.get("provider_config") {
            None => return ProviderConfig::default(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                let problem = format!("must be an object (got {})", value_type_name(other));
                self.issue("provider_config", problem);
                return ProviderConfig::default();
            }
        };

        let mut nested = Fields::new(map, "provider_config.");
        let choice = nested
            .optional_enum("type", &PROVIDER_TYPES)
            .unwrap_or_default();
        let model = non_blank(nested.optional_string("model"));
        self.issues.append(&mut nested.issues);

        ProviderConfig { choice, model }
    }

    fn window_details(&mut self) -> Vec<WindowDetail> {
        let key = "include_window_details";
        let items = match self.get(key) {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.issue(key, format!("must be an array (got {})", value_type_name(other)));
                return Vec::new();
            }
        };

        let mut details = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let element = format!("{}[{}]", key, i);
            match item {
                Value::String(s) => match s.parse::<WindowDetail>() {
                    Ok(detail) if !details.contains(&detail) => details.push(detail),
                    Ok(_) => {}
                    Err(_) => {
                        let allowed = WindowDetail::ALL.map(|d| d.as_str()).join("|");
                        self.issue(&element, format!("must be one of {}", allowed));
                    }
                },
                other => {
                    let problem = format!("must be a string (got {})", value_type_name(other));
                    self.issue(&element, problem);
                }
            }
        }
        details
    }
}

fn parse_image(f: &mut Fields<'_>) -> Option<ToolArguments> {
    let app_target = f.optional_string("app_target");
    let path = non_blank(f.optional_string("path"));
    let question = non_blank(f.optional_string("question"));
    let (format, original_format) = f.image_format();
    let focus_choices = CaptureFocus::ALL.map(|focus| (focus.as_str(), focus));
    let capture_focus = f
        .optional_enum("capture_focus", &focus_choices)
        .unwrap_or_default();

    f.is_clean().then(|| {
        ToolArguments::Image(ImageArgs {
            app_target,
            path,
            question,
            format,
            original_format,
            capture_focus,
        })
    })
}

fn parse_analyze(f: &mut Fields<'_>) -> Option<ToolArguments> {
    let image_path = f.required_string("image_path");
    let question = f.required_string("question");
    let provider_config = f.provider_config();

    Some(ToolArguments::Analyze(AnalyzeArgs {
        image_path: image_path?,
        question: question?,
        provider_config,
    }))
}

fn parse_list(f: &mut Fields<'_>) -> Option<ToolArguments> {
    let item_type = f.optional_enum("item_type", &ITEM_TYPES);
    let app = non_blank(f.optional_string("app"));
    let include_window_details = f.window_details();

    if !f.is_clean() {
        return None;
    }

    let item_type = item_type.unwrap_or(if app.is_some() {
        ListItemType::ApplicationWindows
    } else {
        ListItemType::RunningApplications
    });

    if item_type == ListItemType::ApplicationWindows && app.is_none() {
        f.issue("app", "is required when item_type is application_windows");
    }
    if !include_window_details.is_empty() && item_type != ListItemType::ApplicationWindows {
        f.issue(
            "include_window_details",
            "is only valid when item_type is application_windows",
        );
    }

    Some(ToolArguments::List(ListArgs {
        item_type,
        app,
        include_window_details,
    }))
}
