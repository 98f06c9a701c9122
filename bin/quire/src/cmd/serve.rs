//! Serve command - preview server that rebuilds on change

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use axum::Router;
use color_eyre::eyre::{Result, WrapErr};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use quire_generator::{BuildSummary, Builder};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::services::ServeDir;

use super::build::{BuildArgs, print_summary};

/// Quiet period after the last change before rebuilding.
const DEBOUNCE_MS: u64 = 200;

/// Run the serve command.
///
/// Builds once, then serves the output directory and rebuilds whenever a
/// source directory or the configuration file changes.
pub async fn run(config_path: &Path, port: u16, args: BuildArgs) -> Result<()> {
    tracing::info!(?config_path, port, "Starting preview server");

    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);
    let output_dir = config.build.output_dir.clone();
    let watched = [
        config.build.content_dir.clone(),
        config.build.layouts_dir.clone(),
        config.build.static_dir.clone(),
        config_path.to_path_buf(),
    ];

    let summary = rebuild(config_path.to_path_buf(), args.clone())
        .await
        .wrap_err("Initial build failed")?;
    print_summary(&summary, &output_dir);

    let (tx, rx) = mpsc::channel::<()>(16);
    let ignored = output_dir.canonicalize().unwrap_or_else(|_| output_dir.clone());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            let relevant = matches!(
                event.kind,
                EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_))
                    | EventKind::Create(_)
                    | EventKind::Remove(_)
            );
            if relevant && !event.paths.iter().all(|p| p.starts_with(&ignored)) {
                signal_change(&tx);
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for path in &watched {
        if path.exists() {
            watcher
                .watch(path, RecursiveMode::Recursive)
                .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Watching");
        }
    }

    tokio::spawn(rebuild_loop(rx, config_path.to_path_buf(), args, output_dir.clone()));

    let app = Router::new().fallback_service(ServeDir::new(&output_dir));
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Preview server running at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    // Keep watcher alive
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Queue a rebuild without blocking the watcher thread. A full channel
/// already guarantees a pending rebuild, so the event can be dropped.
fn signal_change(tx: &mpsc::Sender<()>) {
    if tx.try_send(()).is_err() {
        tracing::trace!("rebuild already pending");
    }
}

/// Rebuild after each burst of change events.
async fn rebuild_loop(
    mut rx: mpsc::Receiver<()>,
    config_path: PathBuf,
    args: BuildArgs,
    output_dir: PathBuf,
) {
    while rx.recv().await.is_some() {
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
        while rx.try_recv().is_ok() {}

        println!();
        println!("  Change detected, rebuilding...");

        match rebuild(config_path.clone(), args.clone()).await {
            Ok(summary) => print_summary(&summary, &output_dir),
            Err(e) => {
                tracing::error!("Rebuild failed: {e:#}");
                eprintln!("  ✗ Rebuild failed: {e:#}");
            }
        }
    }
}

/// Reload the configuration and build on the blocking pool.
async fn rebuild(config_path: PathBuf, args: BuildArgs) -> Result<BuildSummary> {
    tokio::task::spawn_blocking(move || {
        let mut config = super::load_config(&config_path)?;
        args.apply(&mut config);
        Builder::new(config).build().wrap_err("Build failed")
    })
    .await
    .wrap_err("Build task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_change_does_not_block_when_full() {
        let (tx, mut rx) = mpsc::channel::<()>(1);

        signal_change(&tx);
        signal_change(&tx);
        signal_change(&tx);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
