// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod wrapper with log and exec helpers

use crate::cmd::{Cmd, CmdOutput};
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{AttachParams, LogParams};
use kube::ResourceExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, instrument};

kube_wrapper! {
    /// Pod wraps a Kubernetes Pod.
    namespaced Pod(corev1::Pod) as "pod" {
        new: new_pod,
        get: get_pod,
        list: list_pods,
    }
}

impl Pod {
    /// Current logs of a container
    pub async fn container_logs(&self, container: &str) -> Result<String> {
        let params = LogParams {
            container: Some(container.to_string()),
            ..Default::default()
        };

        self.api()
            .logs(&self.name_any(), &params)
            .await
            .map_err(|e| {
                Error::kube(
                    format!("failed to get logs of container {} of {}", container, self.describe()),
                    e,
                )
            })
    }

    /// Run a command in a container, capturing its output.
    ///
    /// Fails if the command exits with a non-zero status.
    #[instrument(skip(self, command), fields(pod = %self.name_any(), command = %command))]
    pub async fn container_exec(&self, container: &str, command: &Cmd) -> Result<CmdOutput> {
        let params = AttachParams::default()
            .container(container)
            .stdin(command.stdin().is_some())
            .stdout(true)
            .stderr(true);

        let argv: Vec<String> = std::iter::once(command.program().to_string())
            .chain(command.arguments().iter().cloned())
            .collect();

        let mut process = self
            .api()
            .exec(&self.name_any(), argv, &params)
            .await
            .map_err(|e| {
                Error::kube(
                    format!("failed to exec in container {} of {}", container, self.describe()),
                    e,
                )
            })?;

        if let (Some(input), Some(mut stdin)) = (command.stdin(), process.stdin()) {
            stdin.write_all(input).await?;
            stdin.shutdown().await?;
        }

        let status = process.take_status();
        let (stdout, stderr) = tokio::join!(read_all(process.stdout()), read_all(process.stderr()));
        let status = match status {
            Some(status) => status.await,
            None => None,
        };

        let output = CmdOutput {
            code: exit_code(status.as_ref()),
            stdout: stdout?,
            stderr: stderr?,
        };
        debug!("Exec finished with {}", output.status());

        if !output.success() {
            return Err(Error::CommandError {
                command: format!("{} in container {} of {}", command, container, self.describe()),
                message: format!("{}: {}", output.status(), output.stderr_lossy().trim()),
            });
        }

        Ok(output)
    }
}

async fn read_all(reader: Option<impl AsyncRead + Unpin>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Exit code reported by the exec status channel.
///
/// Failures carry the code as an `ExitCode` cause, anything unparseable is
/// treated as a generic failure.
fn exit_code(status: Option<&Status>) -> Option<i32> {
    let status = status?;
    if status.status.as_deref() == Some("Success") {
        return Some(0);
    }

    let code = status
        .details
        .as_ref()
        .and_then(|d| d.causes.as_ref())
        .and_then(|causes| {
            causes
                .iter()
                .find(|c| c.reason.as_deref() == Some("ExitCode"))
                .and_then(|c| c.message.as_deref())
                .and_then(|m| m.parse().ok())
        });

    Some(code.unwrap_or(1))
}
