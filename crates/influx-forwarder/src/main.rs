// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use influx_agent::{config::AgentConfig, logfile_agent::LogfileAgent};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("INFLUX_AGENT_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,reqwest=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match AgentConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config on influx forwarder startup: {e}");
            return;
        }
    };

    let agent = match LogfileAgent::from_config(&config).await {
        Ok(agent) => agent,
        Err(e) => {
            error!("Error when starting logfile agent: {e}");
            return;
        }
    };
    info!(
        "Forwarding records from {} to {}:{}/{}",
        agent.path().display(),
        config.host,
        config.port,
        config.database
    );

    let (errors_tx, mut errors_rx) = mpsc::unbounded_channel();
    let cancel_token = CancellationToken::new();
    let agent_task = tokio::spawn(agent.run(errors_tx, cancel_token.clone()));

    // Failures are already logged by the agent, keep a count for the shutdown summary.
    let error_counter = tokio::spawn(async move {
        let mut reported = 0u64;
        while errors_rx.recv().await.is_some() {
            reported += 1;
        }
        reported
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
    }
    info!("Shutting down influx forwarder");
    cancel_token.cancel();

    if let Err(e) = agent_task.await {
        error!("Logfile agent task failed: {e}");
    }
    match error_counter.await {
        Ok(reported) => info!("Influx forwarder stopped, {reported} errors reported"),
        Err(e) => error!("Error counter task failed: {e}"),
    }
}
