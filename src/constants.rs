// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Environment variables read by [`crate::config::Config::from_env`]
pub mod env {
    pub const KUBECONFIG: &str = "KUBECONFIG";
    /// Path or name of the kubectl binary
    pub const KUBECTL_PATH: &str = "KUBECTL_PATH";
    /// Base directory for debug artifacts of failed tests
    pub const TEST_ARTIFACTS_DIRECTORY: &str = "TEST_ARTIFACTS_DIRECTORY";
}

/// kubectl binary used when KUBECTL_PATH is not set
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Plan wait defaults
pub mod wait {
    /// Timeout for a plan to reach IN_PROGRESS
    pub const IN_PROGRESS_TIMEOUT_SECS: u64 = 30;
    pub const IN_PROGRESS_POLL_INTERVAL_SECS: u64 = 3;
    /// Timeout for a plan to reach COMPLETE
    pub const COMPLETE_TIMEOUT_SECS: u64 = 5 * 60;
    pub const COMPLETE_POLL_INTERVAL_SECS: u64 = 10;
}

/// Poll interval used while waiting for workload readiness
pub const READY_POLL_INTERVAL_SECS: u64 = 2;
