//! `analyze` tool

use std::time::Instant;

use peepit_ai::load_image;

use crate::Result;
use crate::config::expand_home;
use crate::dispatcher::ToolContext;
use crate::tools::{ToolContent, ToolResult};
use crate::validation::AnalyzeArgs;

pub async fn handle(args: AnalyzeArgs, ctx: &ToolContext) -> Result<ToolResult> {
    let path = expand_home(&args.image_path);
    let image = load_image(&path).await?;

    let started = Instant::now();
    let analysis = ctx
        .ai
        .analyze(
            &ctx.configured_providers(),
            args.provider_config.choice,
            args.provider_config.model.as_deref(),
            &image,
            &args.question,
        )
        .await?;
    let elapsed = started.elapsed().as_secs_f64();

    tracing::info!(
        image = %path.display(),
        provider = %analysis.provider,
        model = %analysis.model,
        elapsed_secs = elapsed,
        "Image analyzed"
    );

    Ok(ToolResult::success(vec![
        ToolContent::text(analysis.text),
        ToolContent::text(format!(
            "Analyzed image with {}/{} in {:.2}s.",
            analysis.provider, analysis.model, elapsed
        )),
    ]))
}
