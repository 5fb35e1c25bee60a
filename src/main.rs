use anyhow::Result;
use likebot::config::{Config, ProviderKind};
use likebot::engine::pacing::HumanPacing;
use likebot::links;
use likebot::pipeline::{Outcome, RunSummary, TerminationReason, TraversalLoop};
use likebot::provider::{instagram::Instagram, tiktok::TikTok, ProviderAdapter};
use likebot::session::BrowserSession;
use likebot::view::cdp::CdpView;
use std::path::Path;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("likebot=info")),
        )
        .init();

    let config = Config::load_or_default(Path::new("config.toml"))?;

    let links = links::load_links(&config.links).await?;
    if links.is_empty() {
        tracing::error!(file = %config.links.file, "no valid links to process");
        return Ok(());
    }

    // Ctrl-C flips the stop flag; the loop observes it at round and item
    // boundaries so a mutation is never cancelled mid-flight.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("stop requested, finishing the current item");
            let _ = stop_tx.send(true);
        }
    });

    let session = BrowserSession::launch(&config.session).await?;

    let result = match config.provider {
        ProviderKind::Tiktok => run(&TikTok, &session, &config, &links, stop_rx).await,
        ProviderKind::Instagram => run(&Instagram, &session, &config, &links, stop_rx).await,
    };

    session.close().await?;

    let summary = result?;
    tracing::info!(
        processed = summary.links_processed,
        skipped = summary.links_skipped,
        items_seen = summary.total_seen,
        items_acted = summary.total_acted,
        "run complete"
    );
    Ok(())
}

async fn run<A: ProviderAdapter<CdpView>>(
    adapter: &A,
    session: &BrowserSession,
    config: &Config,
    links: &[String],
    stop: watch::Receiver<bool>,
) -> Result<RunSummary> {
    let probe = adapter.login_probe();
    session
        .ensure_logged_in(adapter.origin(), &probe, &config.session)
        .await?;

    let pacing = Box::new(HumanPacing::new(config.pacing.clone()));
    let mut traversal = TraversalLoop::new(session.view(), adapter, config, pacing, stop.clone());

    let mut summary = RunSummary::default();
    let total = links.len();
    for (index, link) in links.iter().enumerate() {
        if *stop.borrow() {
            tracing::info!(remaining = total - index, "stopping before next link");
            break;
        }

        // A challenge-blocked link still yields an outcome so the
        // aggregate counts cover every link in the input.
        if let Err(e) = session.resolve_challenge(&probe, &config.session).await {
            tracing::warn!(link, error = %e, "challenge unresolved, skipping link");
            summary.record(&Outcome {
                link: link.clone(),
                items_seen: 0,
                items_acted: 0,
                reason: TerminationReason::Aborted,
            });
            continue;
        }

        let outcome = traversal.run_link(link).await;
        tracing::info!(
            link = %outcome.link,
            items_seen = outcome.items_seen,
            items_acted = outcome.items_acted,
            reason = ?outcome.reason,
            progress = %format!("{}/{}", index + 1, total),
            "link finished"
        );
        summary.record(&outcome);

        if index + 1 < total {
            traversal.pause_between_links().await;
        }
    }

    Ok(summary)
}
