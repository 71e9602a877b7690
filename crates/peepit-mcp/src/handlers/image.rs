//! `image` tool

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use peepit_ai::{ProviderChoice, load_image};
use peepit_capture::{CaptureRequest, CaptureTarget, SavedFile};

use crate::Result;
use crate::config::expand_home;
use crate::dispatcher::ToolContext;
use crate::tools::{ToolContent, ToolResult};
use crate::validation::{ImageArgs, OutputFormat};

pub async fn handle(args: ImageArgs, ctx: &ToolContext) -> Result<ToolResult> {
    if let Some(original) = &args.original_format {
        tracing::warn!(requested = %original, "Unrecognized image format, capturing as PNG");
    }

    let target = CaptureTarget::parse(args.app_target.as_deref());
    let inline_only = args.path.is_none()
        && (args.format == OutputFormat::Data || args.question.is_some());

    // Captures nobody asked to keep live in a directory removed on return
    let scratch = if inline_only {
        Some(tempfile::Builder::new().prefix("peepit-capture-").tempdir()?)
    } else {
        None
    };
    let save_path = match (&scratch, &args.path) {
        (Some(dir), _) => dir.path().to_path_buf(),
        (None, Some(path)) => expand_home(path),
        (None, None) => ctx
            .config
            .default_save_path
            .clone()
            .unwrap_or_else(std::env::temp_dir),
    };

    let request = CaptureRequest {
        target,
        path: save_path,
        format: args.format.file_format(),
        focus: args.capture_focus,
    };
    tracing::info!(target = %request.target, path = %request.path.display(), "Capturing");
    let output = ctx.capture.capture(&request).await?;
    let files = &output.data.saved_files;

    let mut summary = Vec::new();
    if let Some(original) = &args.original_format {
        summary.push(format!(
            "Invalid format '{}' was provided. Automatically using PNG format instead.",
            original
        ));
    }
    summary.push(format!(
        "Captured {} image(s) of {}.",
        files.len(),
        request.target
    ));
    if scratch.is_none() && !files.is_empty() {
        summary.push("Saved files:".to_string());
        summary.extend(
            files
                .iter()
                .map(|file| format!("- {}: {}", file.label(), file.path.display())),
        );
    }
    summary.extend(output.messages.iter().cloned());

    let mut content = vec![ToolContent::text(summary.join("\n"))];

    if let Some(question) = &args.question {
        content.extend(analyze_files(files, question, ctx).await?);
    }

    if args.format == OutputFormat::Data {
        for file in files {
            content.push(inline_image(file, &request).await?);
        }
    }

    Ok(ToolResult::success(content))
}

async fn analyze_files(
    files: &[SavedFile],
    question: &str,
    ctx: &ToolContext,
) -> Result<Vec<ToolContent>> {
    let providers = ctx.configured_providers();
    let mut content = Vec::with_capacity(files.len());
    for file in files {
        let image = load_image(&file.path).await?;
        let analysis = ctx
            .ai
            .analyze(&providers, ProviderChoice::Auto, None, &image, question)
            .await?;
        let heading = if files.len() == 1 {
            "Analysis".to_string()
        } else {
            format!("Analysis of {}", file.label())
        };
        content.push(ToolContent::text(format!(
            "{} ({}/{}):\n{}",
            heading, analysis.provider, analysis.model, analysis.text
        )));
    }
    Ok(content)
}

async fn inline_image(file: &SavedFile, request: &CaptureRequest) -> Result<ToolContent> {
    let bytes = tokio::fs::read(&file.path).await?;
    let mime_type = file
        .mime_type
        .clone()
        .or_else(|| mime_type_for(&file.path).map(String::from))
        .unwrap_or_else(|| request.format.mime_type().to_string());
    Ok(ToolContent::Image {
        data: STANDARD.encode(bytes),
        mime_type,
    })
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}
