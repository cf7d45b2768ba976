// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::client::Client;
use crate::error::Result;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::instrument;

kube_wrapper! {
    /// Secret wraps a Kubernetes Secret.
    namespaced Secret(corev1::Secret) as "secret" {
        new: new_secret,
        get: get_secret,
        list: list_secrets,
    }
}

/// Builder for a secret, started with [`create_secret`].
///
/// ```ignore
/// let secret = create_secret("credentials")
///     .with_namespace("test")
///     .with_data([("password", b"hunter2".to_vec())].into())
///     .run(&client)
///     .await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretBuilder {
    name: String,
    namespace: Option<String>,
    data: BTreeMap<String, Vec<u8>>,
    type_: Option<String>,
}

/// Start building a secret with the given name
pub fn create_secret(name: impl Into<String>) -> SecretBuilder {
    SecretBuilder {
        name: name.into(),
        ..Default::default()
    }
}

impl SecretBuilder {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add data entries, later keys overwrite earlier ones
    pub fn with_data(mut self, data: BTreeMap<String, Vec<u8>>) -> Self {
        self.data.extend(data);
        self
    }

    /// Secret type, e.g. `kubernetes.io/tls`
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    fn build(self) -> corev1::Secret {
        corev1::Secret {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                ..Default::default()
            },
            data: Some(
                self.data
                    .into_iter()
                    .map(|(k, v)| (k, ByteString(v)))
                    .collect(),
            ),
            type_: self.type_,
            ..Default::default()
        }
    }

    #[instrument(skip_all, fields(name = %self.name))]
    pub async fn run(self, client: &Client) -> Result<Secret> {
        new_secret(client, self.build()).await
    }
}
