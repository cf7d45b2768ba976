// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::constants::READY_POLL_INTERVAL_SECS;
use crate::error::{Error, Result};
use k8s_openapi::api::apps::v1 as appsv1;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

kube_wrapper! {
    /// StatefulSet wraps a Kubernetes StatefulSet.
    namespaced StatefulSet(appsv1::StatefulSet) as "statefulset" {
        new: new_stateful_set,
        get: get_stateful_set,
        list: list_stateful_sets,
    }
}

impl StatefulSet {
    /// Desired replicas, Kubernetes defaults an unset count to 1
    pub fn desired_replicas(&self) -> i32 {
        self.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1)
    }

    pub fn ready_replicas(&self) -> i32 {
        self.status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
    }

    /// Refresh until all desired replicas report ready or `timeout` elapses
    #[instrument(skip(self), fields(statefulset = %self.describe()))]
    pub async fn wait_for_ready_replicas(&mut self, timeout: Duration) -> Result<()> {
        self.wait_ready(timeout, Duration::from_secs(READY_POLL_INTERVAL_SECS))
            .await
    }

    async fn wait_ready(&mut self, timeout: Duration, interval: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            self.update().await?;
            let (ready, desired) = (self.ready_replicas(), self.desired_replicas());
            if ready == desired {
                debug!("All {} replicas ready", desired);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::ReadyTimeout {
                    resource: self.describe(),
                    seconds: timeout.as_secs(),
                });
            }
            debug!("{} of {} replicas ready", ready, desired);
            sleep(interval.min(deadline - now)).await;
        }
    }
}
