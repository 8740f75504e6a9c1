//! Demo of publishing logs while the broker configuration hot-reloads.
//!
//! This demo shows how to:
//! - Configure the logger from a file that is watched for changes
//! - Keep logging while the file is edited
//! - Subscribe to configuration change notifications
//!
//! Run with: cargo run --example hot_reload
//!
//! While running, try editing demos/config/logging.yaml (change the topic or
//! the source) and watch where the next records go.

use mqtt_hotlog::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Hot Reload Demo ===\n");

    let config_path = "demos/config/logging.yaml";
    if !std::path::Path::new(config_path).exists() {
        std::fs::create_dir_all("demos/config").map_err(|source| LoggerError::WatcherIo {
            path: config_path.into(),
            source,
        })?;
        std::fs::write(
            config_path,
            r#"topic: logs/demo
broker: localhost
port: 1883
source: hot-reload-demo
"#,
        )
        .map_err(|source| LoggerError::WatcherIo {
            path: config_path.into(),
            source,
        })?;
        println!("Created {}", config_path);
    }

    let logger = Logger::builder()
        .poll_interval(Duration::from_millis(500))
        .on_error(|err| println!("[Error] {}", err))
        .build()?;
    logger.configure(ConfigOrigin::file(config_path)).await?;

    println!("{}\n", logger.describe());

    let reload_count = Arc::new(AtomicUsize::new(0));
    let reload_count_clone = Arc::clone(&reload_count);
    let _subscription = logger.subscribe(move |snapshot| {
        let count = reload_count_clone.fetch_add(1, Ordering::SeqCst) + 1;
        println!("\n[Event] Configuration reloaded (reload #{})", count);
        println!("{}\n", snapshot);
    });

    println!(
        "===> Try editing {} to redirect the logs! <===",
        config_path
    );
    println!("Press Ctrl+C to exit\n");

    let mut tick: u64 = 0;
    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        tick += 1;

        logger.log_with(
            "INFO",
            "heartbeat",
            &serde_json::json!({ "tick": tick, "reloads": reload_count.load(Ordering::SeqCst) }),
        )?;

        let stats = logger.stats();
        println!(
            "[Status] dispatched: {}, delivered: {}, failed: {}",
            stats.dispatched, stats.delivered, stats.failed
        );
    }
}
