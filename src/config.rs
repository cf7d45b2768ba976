// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as vars, DEFAULT_KUBECTL};
use std::env;
use std::path::PathBuf;

/// Test tooling configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Kubeconfig to connect with, inferred by kube when unset
    pub kubeconfig: Option<PathBuf>,
    /// kubectl binary used by the artifact collector and the KUDO plugin calls
    pub kubectl_path: String,
    /// Base directory for debug artifacts, collection is disabled when unset
    pub artifacts_directory: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kubeconfig: None,
            kubectl_path: DEFAULT_KUBECTL.to_string(),
            artifacts_directory: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Config {
            kubeconfig: non_empty(vars::KUBECONFIG).map(PathBuf::from),
            kubectl_path: non_empty(vars::KUBECTL_PATH)
                .unwrap_or_else(|| DEFAULT_KUBECTL.to_string()),
            artifacts_directory: non_empty(vars::TEST_ARTIFACTS_DIRECTORY).map(PathBuf::from),
        }
    }
}
