// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::client::Client;
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1 as corev1;
use kube::api::{DeleteParams, ObjectMeta, PostParams};
use tracing::{debug, info, instrument};

kube_wrapper! {
    /// Namespace wraps a Kubernetes Namespace.
    cluster Namespace(corev1::Namespace) as "namespace" {
        new: new_namespace,
        get: get_namespace,
        list: list_namespaces,
    }
}

fn namespace_object(name: &str) -> corev1::Namespace {
    corev1::Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Create a namespace
#[instrument(skip(client))]
pub async fn create_namespace(client: &Client, name: &str) -> Result<()> {
    let namespaces = client.cluster_api::<corev1::Namespace>();

    namespaces
        .create(&PostParams::default(), &namespace_object(name))
        .await
        .map_err(|e| Error::kube(format!("failed to create namespace {}", name), e))?;
    info!("Namespace {} created", name);

    Ok(())
}

/// Delete a namespace
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, name: &str) -> Result<()> {
    let namespaces = client.cluster_api::<corev1::Namespace>();

    namespaces
        .delete(name, &DeleteParams::default())
        .await
        .map_err(|e| Error::kube(format!("failed to delete namespace {}", name), e))?;
    info!("Namespace {} deleted", name);

    Ok(())
}

/// Ensure a namespace exists in the cluster, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, name: &str) -> Result<()> {
    match get_namespace(client, name).await {
        Ok(_) => {
            debug!("Namespace {} already exists", name);
            Ok(())
        }
        Err(e) if e.is_not_found() => create_namespace(client, name).await,
        Err(e) => Err(e),
    }
}
