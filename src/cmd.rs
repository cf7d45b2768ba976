// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! A small builder around `tokio::process::Command`.
//!
//! ```ignore
//! let output = Cmd::new("echo")
//!     .with_arguments(["-n", "Hello, World!"])
//!     .output()
//!     .await?;
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A command line to run, with optional environment and stdin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    arguments: Vec<String>,
    environment: BTreeMap<String, String>,
    stdin: Option<Vec<u8>>,
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Describes how the command ended, e.g. `exit status 1`
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Cmd {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append arguments to the command
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    /// Add environment variables on top of the inherited environment
    pub fn with_environment<I, K, V>(mut self, environment: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(environment.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub(crate) fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    /// Run the command and capture stdout and stderr.
    ///
    /// A non-zero exit status is not an error here, inspect [`CmdOutput::success`].
    pub async fn output(&self) -> Result<CmdOutput> {
        debug!("Running {}", self);

        let mut command = Command::new(&self.program);
        command
            .args(&self.arguments)
            .envs(&self.environment)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn().map_err(|e| self.error(e.to_string()))?;

        if let (Some(input), Some(mut pipe)) = (self.stdin.as_ref(), child.stdin.take()) {
            pipe.write_all(input)
                .await
                .map_err(|e| self.error(format!("writing stdin: {}", e)))?;
            // closing stdin lets the child see EOF
            drop(pipe);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.error(e.to_string()))?;

        Ok(CmdOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run the command, failing on a non-zero exit status
    pub async fn run(&self) -> Result<CmdOutput> {
        let output = self.output().await?;
        if !output.success() {
            return Err(self.error(format!(
                "{}: {}",
                output.status(),
                output.stderr_lossy().trim()
            )));
        }
        Ok(output)
    }

    fn error(&self, message: String) -> Error {
        Error::CommandError {
            command: self.to_string(),
            message,
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for argument in &self.arguments {
            write!(f, " {}", argument)?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arguments() {
        const TEST: &str = "Hello, World!";

        let output = Cmd::new("echo")
            .with_arguments(["-n", TEST])
            .run()
            .await
            .unwrap();

        assert_eq!(output.stdout_lossy(), TEST);
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_environment() {
        let output = Cmd::new("sh")
            .with_arguments(["-c", "printf %s \"$GREETING\""])
            .with_environment([("GREETING", "hi")])
            .run()
            .await
            .unwrap();

        assert_eq!(output.stdout_lossy(), "hi");
    }

    #[tokio::test]
    async fn test_stdin() {
        let output = Cmd::new("cat").with_stdin("piped").run().await.unwrap();
        assert_eq!(output.stdout_lossy(), "piped");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let cmd = Cmd::new("sh").with_arguments(["-c", "echo oops >&2; exit 3"]);

        let output = cmd.output().await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.status(), "exit status 3");

        let err = cmd.run().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "command `sh -c echo oops >&2; exit 3` failed: exit status 3: oops"
        );
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = Cmd::new("definitely-not-a-real-binary").output().await.unwrap_err();
        assert!(matches!(err, Error::CommandError { .. }));
    }
}
