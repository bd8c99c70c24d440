//! Watch command - relay new files until interrupted.

use std::sync::Arc;

use anyhow::{Context, bail};
use console::style;
use tokio_util::sync::CancellationToken;

use crate::cli::WatchArgs;
use crate::config::Settings;
use crate::watcher::{HttpTransport, NameMatcher, RelayWatcher};

/// Apply CLI overrides on top of the loaded settings.
pub fn apply_overrides(mut config: Settings, args: &WatchArgs) -> Settings {
    if let Some(dir) = &args.dir {
        config.watch_dir = dir.clone();
    }
    if let Some(url) = &args.url {
        config.upload.url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.upload.timeout_secs = timeout;
    }
    config
}

fn print_banner(config: &Settings) {
    let matcher = NameMatcher::new();
    let rule = "=".repeat(60);

    println!("{rule}");
    println!("   {}", style("DOWNLOADS FOLDER RELAY").cyan().bold());
    println!("{rule}");
    println!("Folder:   {}", config.watch_dir.display());
    println!("API URL:  {}", config.upload.url);
    println!("Pattern:  {}", matcher.describe());
    println!("Examples: {}", matcher.examples().join(", "));
    println!("{rule}");
    println!(
        "\n{} Press Ctrl+C to stop.\n",
        style("Relay started!").green().bold()
    );
}

/// Run the watch command.
pub async fn run(args: WatchArgs, config: Settings) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args);
    print_banner(&config);

    if !config.watch_dir.is_dir() {
        tracing::error!(
            "[relay] watch folder not found: {}",
            config.watch_dir.display()
        );
        bail!("watch folder not found: {}", config.watch_dir.display());
    }

    let transport = HttpTransport::new(config.upload.url.clone(), config.upload.timeout())
        .context("create upload client")?;

    let watcher = RelayWatcher::builder()
        .dir(config.watch_dir.clone())
        .transport(Arc::new(transport))
        .field_name(config.upload.field_name.clone())
        .settle_delay(config.stability.settle_delay())
        .probe_interval(config.stability.probe_interval())
        .build()
        .context("create file watcher")?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => crate::log_event!("relay", "interrupt received"),
            Err(e) => tracing::error!("[relay] failed to listen for ctrl+c: {e}"),
        }
        signal_token.cancel();
    });

    watcher.watch(shutdown).await.context("watch folder")?;

    crate::log_event!("relay", "finished");
    Ok(())
}
