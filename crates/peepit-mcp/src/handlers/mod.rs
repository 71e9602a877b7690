//! Tool handlers

pub mod analyze;
pub mod image;
pub mod list;

use crate::Result;
use crate::dispatcher::ToolContext;
use crate::tools::ToolResult;
use crate::validation::ToolArguments;

/// Run the handler for already-validated arguments
pub async fn run(args: ToolArguments, ctx: &ToolContext) -> Result<ToolResult> {
    match args {
        ToolArguments::Image(args) => image::handle(args, ctx).await,
        ToolArguments::Analyze(args) => analyze::handle(args, ctx).await,
        ToolArguments::List(args) => list::handle(args, ctx).await,
    }
}
