// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster connection shared by the Kubernetes and KUDO wrappers

use crate::config::Config;
use crate::error::{Error, Result};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client as KubeClient, Config as KConfig, Resource,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A kube client together with the kubeconfig it was created from.
///
/// The kubeconfig path is handed to kubectl when shelling out, so it is empty
/// for in-cluster clients.
#[derive(Clone)]
pub struct Client {
    kube: KubeClient,
    kubeconfig_path: Option<PathBuf>,
    config: Config,
}

impl Client {
    /// Create a client from a kubeconfig file
    #[instrument(skip(config), fields(kubeconfig = %kubeconfig_path.display()))]
    pub async fn new_for_config(kubeconfig_path: &Path, config: Config) -> Result<Self> {
        // relative certificate and key paths resolve against the file's directory
        let kubeconfig = Kubeconfig::read_from(kubeconfig_path).map_err(|e| {
            Error::KubeconfigError(format!(
                "Failed to read {}: {}",
                kubeconfig_path.display(),
                e
            ))
        })?;

        let kube = create_client_from_kubeconfig(kubeconfig).await?;
        info!("Connected to cluster using {}", kubeconfig_path.display());

        Ok(Client {
            kube,
            kubeconfig_path: Some(kubeconfig_path.to_path_buf()),
            config,
        })
    }

    /// Create a client from the service account Kubernetes mounts into pods
    pub fn new_in_cluster(config: Config) -> Result<Self> {
        let c = KConfig::incluster().map_err(|e| {
            Error::KubeconfigError(format!("Failed to load in-cluster config: {}", e))
        })?;

        let kube = KubeClient::try_from(c)
            .map_err(|e| Error::KubeconfigError(format!("Failed to create client: {}", e)))?;

        Ok(Client {
            kube,
            kubeconfig_path: None,
            config,
        })
    }

    /// Use the kubeconfig from the configuration, falling back to kube's inference
    pub async fn try_default(config: Config) -> Result<Self> {
        if let Some(path) = config.kubeconfig.clone() {
            return Self::new_for_config(&path, config).await;
        }

        debug!("No kubeconfig configured, inferring client configuration");
        let c = KConfig::infer()
            .await
            .map_err(|e| Error::KubeconfigError(format!("Failed to infer config: {}", e)))?;

        let kube = KubeClient::try_from(c)
            .map_err(|e| Error::KubeconfigError(format!("Failed to create client: {}", e)))?;

        Ok(Client {
            kube,
            kubeconfig_path: None,
            config,
        })
    }

    /// Wrap an existing kube client
    pub fn from_kube(kube: KubeClient, config: Config) -> Self {
        Client {
            kube,
            kubeconfig_path: None,
            config,
        }
    }

    pub fn with_kubeconfig_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig_path = Some(path.into());
        self
    }

    pub fn kube(&self) -> KubeClient {
        self.kube.clone()
    }

    pub fn kubeconfig_path(&self) -> Option<&Path> {
        self.kubeconfig_path.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_namespace(&self) -> &str {
        self.kube.default_namespace()
    }

    /// Namespaced API, using the client's default namespace for empty or missing ones
    pub(crate) fn namespaced_api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Api::namespaced(self.kube(), ns),
            None => Api::default_namespaced(self.kube()),
        }
    }

    pub(crate) fn cluster_api<K>(&self) -> Api<K>
    where
        K: Resource,
        K::DynamicType: Default,
    {
        Api::all(self.kube())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("kubeconfig_path", &self.kubeconfig_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Create a Kubernetes client from a loaded kubeconfig
async fn create_client_from_kubeconfig(kubeconfig: Kubeconfig) -> Result<KubeClient> {
    let client_config = KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::KubeconfigError(format!("Failed to create config: {}", e)))?;

    KubeClient::try_from(client_config)
        .map_err(|e| Error::KubeconfigError(format!("Failed to create client: {}", e)))
}
