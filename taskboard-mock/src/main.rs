//! `taskboard-mock`: a stand-in for the task/user REST API.
//!
//! Serves `/users` and `/tasks` from memory so the console client can be run
//! without a real backend. With `--touch-first-on-get` (the default) task 1
//! is restamped on every list, which makes an edit of that row go into
//! conflict on the client's next poll.
//!
//! ```bash
//! # demo data on 127.0.0.1:4200
//! cargo run --bin taskboard-mock
//!
//! # empty board, no simulated writer
//! cargo run --bin taskboard-mock -- --bind 127.0.0.1:8080 --empty --touch-first-on-get false
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_mock::config::{MockCliArgs, MockConfig};
use taskboard_mock::server;

#[tokio::main]
async fn main() {
    let cli = MockCliArgs::parse();
    let config = match MockConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("taskboard-mock: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let db = Arc::new(config.database());
    tracing::info!(
        seed = config.seed,
        touch_first_on_get = config.touch_first_on_get,
        "mock data ready"
    );

    let (addr, handle) = match server::start_server_with_db(&config.bind_addr.to_string(), db).await
    {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, error = %e, "cannot bind mock API");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "mock API serving /users and /tasks");

    if let Err(e) = handle.await {
        tracing::error!(error = %e, "mock API task ended abnormally");
    }
}
