//! Long-running refresh loop

use tokio_util::sync::CancellationToken;

use crate::cache::Shutdown;
use crate::cli::CommandContext;
use crate::error::Result;
use crate::output::formatters::format_duration;

/// Keep the cache refreshed until Ctrl-C.
pub async fn run(ctx: CommandContext) -> Result<()> {
    let token = CancellationToken::new();
    let cache = ctx.cache.clone();

    log::info!(
        "Refreshing {} accounts across {} regions every {}",
        cache.config().owner_ids().len(),
        cache.regions().len(),
        format_duration(cache.config().ttl())
    );

    let runner = {
        let cache = cache.clone();
        let token = token.clone();
        tokio::spawn(async move { cache.run(token).await })
    };

    let warm = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache.warmed().await;
            log::info!("Serving {} images", cache.snapshot().len());
        })
    };

    tokio::signal::ctrl_c().await?;
    log::info!("Interrupted, shutting down");
    token.cancel();
    warm.abort();

    match runner.await {
        Ok(result) => {
            let shutdown: Shutdown = result?;
            log::info!("Cache shut down ({:?})", shutdown);
            Ok(())
        }
        Err(err) => Err(std::io::Error::other(err).into()),
    }
}
