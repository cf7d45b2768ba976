// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Collection of debugging artifacts for failed tests.
//!
//! The namespaced resources of a test namespace are dumped as YAML with
//! kubectl, one file per API group, into a timestamped directory below
//! `$TEST_ARTIFACTS_DIRECTORY`.

use crate::client::Client;
use crate::cmd::{Cmd, CmdOutput};
use crate::constants::env::TEST_ARTIFACTS_DIRECTORY;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Runs kubectl for the collector, replaced by a fake in tests
pub trait CommandRunner: Send + Sync {
    fn output<'a>(&'a self, command: &'a Cmd) -> BoxFuture<'a, Result<CmdOutput>>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn output<'a>(&'a self, command: &'a Cmd) -> BoxFuture<'a, Result<CmdOutput>> {
        command.output().boxed()
    }
}

/// Collects the namespaced resources of a namespace into the artifacts directory
pub struct ArtifactCollector {
    artifacts_directory: Option<PathBuf>,
    kubectl_path: String,
    kubeconfig_path: Option<PathBuf>,
    runner: Box<dyn CommandRunner>,
    now: fn() -> DateTime<Utc>,
}

/// Collect debugging artifacts from a namespace.
///
/// Typically called when a test failed. Errors are also written to `writer`,
/// so the result only needs inspecting when the caller wants to act on it.
pub async fn collect_artifacts(
    client: &Client,
    writer: &mut impl Write,
    namespace: &str,
) -> Result<()> {
    ArtifactCollector::new(client)
        .collect(writer, namespace)
        .await
}

/// Resources grouped by API group, the core group is the empty string
fn group_resources(resources: &str) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for resource in resources.lines().filter(|l| !l.is_empty()) {
        let group = resource
            .split_once('.')
            .map(|(_, group)| group)
            .unwrap_or_default();
        groups
            .entry(group.to_string())
            .or_default()
            .push(resource.to_string());
    }

    for resources in groups.values_mut() {
        resources.sort();
    }

    groups
}

fn file_name(group: &str) -> String {
    if group.is_empty() {
        "resources.yaml".to_string()
    } else {
        format!("resources-{}.yaml", group)
    }
}

impl ArtifactCollector {
    pub fn new(client: &Client) -> Self {
        let config = client.config();

        ArtifactCollector {
            artifacts_directory: config.artifacts_directory.clone(),
            kubectl_path: config.kubectl_path.clone(),
            kubeconfig_path: client.kubeconfig_path().map(Path::to_path_buf),
            runner: Box::new(ProcessRunner),
            now: Utc::now,
        }
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Collect the resources, writing progress and errors to `writer`
    #[instrument(skip(self, writer))]
    pub async fn collect(&self, writer: &mut impl Write, namespace: &str) -> Result<()> {
        let result = self.collect_namespaced_resources(writer, namespace).await;
        if let Err(e) = &result {
            warn!("Collecting artifacts failed: {}", e);
            let _ = writeln!(writer, "collection of resources for debugging failed: {}", e);
        }
        result
    }

    fn kubectl<I, S>(&self, arguments: I) -> Cmd
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kubeconfig = self
            .kubeconfig_path
            .iter()
            .flat_map(|path| ["--kubeconfig".to_string(), path.display().to_string()]);

        Cmd::new(&self.kubectl_path)
            .with_arguments(kubeconfig)
            .with_arguments(arguments)
    }

    async fn collect_namespaced_resources(
        &self,
        writer: &mut impl Write,
        namespace: &str,
    ) -> Result<()> {
        let base = self
            .artifacts_directory
            .as_ref()
            .ok_or(Error::EnvNotSet(TEST_ARTIFACTS_DIRECTORY))?;

        let _ = writeln!(writer, "collecting namespaced resources for debugging...");

        let api_resources = self.kubectl([
            "api-resources",
            "--verbs=list",
            "--namespaced=true",
            "-o",
            "name",
        ]);
        let output = self.runner.output(&api_resources).await.map_err(|e| {
            Error::ArtifactsError(format!("fetching API resource types failed: {}", e))
        })?;
        let _ = writer.write_all(&output.stderr);
        if !output.success() {
            return Err(Error::ArtifactsError(format!(
                "fetching API resource types failed: {}",
                output.status()
            )));
        }

        let directory = base.join(format!(
            "{}-{}",
            namespace,
            (self.now)().format(TIMESTAMP_FORMAT)
        ));
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            Error::ArtifactsError(format!("creating \"{}\" failed: {}", directory.display(), e))
        })?;

        let groups = group_resources(&output.stdout_lossy());
        debug!("Collecting {} resource groups into {}", groups.len(), directory.display());

        let collected = join_all(groups.iter().map(|(group, resources)| {
            self.collect_resources(namespace, directory.join(file_name(group)), resources)
        }))
        .await;

        for messages in collected {
            let _ = writer.write_all(&messages);
        }

        Ok(())
    }

    /// Dump a group of resources into `path`, returning what should be
    /// reported to the writer. Files without content are not kept.
    async fn collect_resources(
        &self,
        namespace: &str,
        path: PathBuf,
        resources: &[String],
    ) -> Vec<u8> {
        let names = resources.join(",");
        let command = self.kubectl([
            "get",
            names.as_str(),
            "--namespace",
            namespace,
            "--ignore-not-found",
            "-o",
            "yaml",
        ]);

        let mut messages = Vec::new();
        let output = match self.runner.output(&command).await {
            Ok(output) => output,
            Err(e) => {
                let _ = writeln!(messages, "fetching {} failed: {}", names, e);
                return messages;
            }
        };

        messages.extend_from_slice(&output.stderr);
        if !output.success() {
            let _ = writeln!(messages, "fetching {} failed: {}", names, output.status());
        }

        if !output.stdout.is_empty() {
            if let Err(e) = tokio::fs::write(&path, &output.stdout).await {
                let _ = writeln!(messages, "writing \"{}\" failed: {}", path.display(), e);
            }
        }

        messages
    }
}
