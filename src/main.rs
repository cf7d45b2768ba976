// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kudo_test_tools::config::Config;
use kudo_test_tools::constants::wait;
use kudo_test_tools::debug::collect_artifacts;
use kudo_test_tools::kudo::get_instance;
use kudo_test_tools::types::kudo::ExecutionStatus;
use kudo_test_tools::Client;

#[derive(Parser, Debug)]
#[command(name = "kudo-test-tools", version, about = "Helpers for testing KUDO operators")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump the namespaced resources of a namespace into $TEST_ARTIFACTS_DIRECTORY
    CollectArtifacts {
        #[arg(short, long)]
        namespace: String,
    },
    /// Wait for a plan of a KUDO instance to reach a status
    WaitPlan {
        #[arg(short, long)]
        namespace: String,
        #[arg(short, long)]
        instance: String,
        #[arg(short, long, default_value = "deploy")]
        plan: String,
        #[arg(short, long, default_value = "COMPLETE")]
        status: ExecutionStatus,
        /// Timeout in seconds
        #[arg(long, default_value_t = wait::COMPLETE_TIMEOUT_SECS)]
        timeout: u64,
        /// Poll interval in seconds
        #[arg(
            long,
            default_value_t = wait::COMPLETE_POLL_INTERVAL_SECS,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    let client = Client::try_default(config).await?;

    match cli.command {
        Command::CollectArtifacts { namespace } => {
            collect_artifacts(&client, &mut std::io::stdout(), &namespace).await?;
        }
        Command::WaitPlan {
            namespace,
            instance,
            plan,
            status,
            timeout,
            interval,
        } => {
            let mut instance = get_instance(&client, &instance, &namespace).await?;
            instance
                .wait_for_plan_status(
                    &plan,
                    status,
                    Duration::from_secs(timeout),
                    Duration::from_secs(interval),
                )
                .await?;
            info!("Plan {} reached {}", plan, status);
        }
    }

    Ok(())
}
