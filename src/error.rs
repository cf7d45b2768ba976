// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::kudo::PlanStatusTimeout;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{message}: {source}")]
    Kube {
        message: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error(transparent)]
    PlanStatusTimeout(#[from] PlanStatusTimeout),

    #[error("timed out waiting for deletion of {namespace}/{name} after {seconds} seconds")]
    DeletionTimeout {
        namespace: String,
        name: String,
        seconds: u64,
    },

    #[error("waiting for deletion of {namespace}/{name} failed: {source}")]
    DeletionWatch {
        namespace: String,
        name: String,
        #[source]
        source: kube_runtime::wait::Error,
    },

    #[error("timed out waiting for {resource} to become ready after {seconds} seconds")]
    ReadyTimeout { resource: String, seconds: u64 },

    #[error("poll interval must be greater than zero")]
    InvalidInterval,

    #[error("command `{command}` failed: {message}")]
    CommandError { command: String, message: String },

    #[error("${0} not set")]
    EnvNotSet(&'static str),

    #[error("{0}")]
    ArtifactsError(String),

    #[error("Certificate generation failed: {0}")]
    CertificateError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn kube(message: impl Into<String>, source: kube::Error) -> Self {
        Error::Kube {
            message: message.into(),
            source,
        }
    }

    /// True for errors describing an elapsed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::PlanStatusTimeout(_)
                | Error::DeletionTimeout { .. }
                | Error::ReadyTimeout { .. }
        )
    }

    /// Timeouts are worth retrying, everything else is not.
    pub fn is_temporary(&self) -> bool {
        self.is_timeout()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Kube {
                source: kube::Error::Api(err),
                ..
            } if err.code == 404
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
