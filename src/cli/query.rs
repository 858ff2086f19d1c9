//! One-shot query command

use tokio_util::sync::CancellationToken;

use crate::cache::CycleOutcome;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::{Error, Result};
use crate::output::{ErrorBody, content_type, render};
use crate::query::{Params, find_images};

/// Refresh the cache once, then print the images matching `raw_query`.
///
/// With JSON output a failed query also prints an error body, shaped like
/// the results, before the error is returned.
pub async fn run(ctx: CommandContext, raw_query: &str) -> Result<()> {
    match execute(&ctx, raw_query).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            if ctx.format == OutputFormat::Json {
                println!("{}", error_body(&err)?);
            }
            Err(err)
        }
    }
}

async fn execute(ctx: &CommandContext, raw_query: &str) -> Result<String> {
    // Reject a bad query before touching the upstream services.
    let params = Params::decode(raw_query, ctx.cache.state_tag())?;

    if let CycleOutcome::Completed { images } = ctx.cache.refresh(CancellationToken::new()).await {
        log::debug!("Cache loaded with {} images", images);
    }

    let images = find_images(&ctx.cache, &params)?;
    log::debug!(
        "Rendering {} results as {}",
        images.len(),
        content_type(params.callback.as_deref())
    );

    Ok(render(&images, ctx.format, &params, ctx.cache.state_tag())?)
}

fn error_body(err: &Error) -> Result<String> {
    Ok(serde_json::to_string(&ErrorBody::from(err))?)
}
