// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! KUDO instances and waiting for their plans

use super::options::{WaitConfig, WaitOption};
use super::PlanStatusTimeout;
use crate::client::Client;
use crate::constants::wait;
use crate::error::{Error, Result};
use crate::kubernetes::wrapper::describe;
use crate::types::kudo::{self as kudov1beta1, ExecutionStatus, PlanStatus};
use kube::api::{ListParams, PostParams};
use kube::{Api, ResourceExt};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// The plan run and status a wait call last matched
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlanCheck {
    uid: String,
    status: ExecutionStatus,
}

/// Instance wraps a KUDO instance.
#[derive(Clone)]
pub struct Instance {
    inner: kudov1beta1::Instance,
    last_plan_check: Option<PlanCheck>,
    client: Client,
}

/// Retrieve a KUDO instance in a namespace
pub async fn get_instance(client: &Client, name: &str, namespace: &str) -> Result<Instance> {
    let api: Api<kudov1beta1::Instance> = client.namespaced_api(Some(namespace));
    let instance = api.get(name).await.map_err(|e| {
        Error::kube(
            format!("failed to get {}", describe("instance", name, Some(namespace))),
            e,
        )
    })?;

    Ok(Instance::from_parts(client.clone(), instance))
}

/// List all KUDO instances in a namespace
pub async fn list_instances(client: &Client, namespace: &str) -> Result<Vec<Instance>> {
    let api: Api<kudov1beta1::Instance> = client.namespaced_api(Some(namespace));
    let list = api.list(&ListParams::default()).await.map_err(|e| {
        Error::kube(format!("failed to list instances in namespace {}", namespace), e)
    })?;

    Ok(list
        .items
        .into_iter()
        .map(|item| Instance::from_parts(client.clone(), item))
        .collect())
}

fn current_plan_status_uid<'a>(instance: &'a kudov1beta1::Instance, plan: &str) -> &'a str {
    plan_status(instance, plan).map_or("", |ps| ps.uid.as_str())
}

fn plan_status<'a>(instance: &'a kudov1beta1::Instance, plan: &str) -> Option<&'a PlanStatus> {
    instance.status.as_ref()?.plan_status.get(plan)
}

/// Status of a plan together with the most detailed message available.
///
/// A plan that never ran has no entry, it is reported as NEVER_RUN. Fatal
/// errors usually only carry a message on a phase or step, so those are
/// searched when the plan itself has none.
pub(crate) fn current_plan_status_and_message(
    instance: &kudov1beta1::Instance,
    plan: &str,
) -> (ExecutionStatus, String) {
    let Some(ps) = plan_status(instance, plan) else {
        return (ExecutionStatus::NeverRun, String::new());
    };

    if ps.status != ExecutionStatus::FatalError || !ps.message.is_empty() {
        return (ps.status, ps.message.clone());
    }

    for phase in &ps.phases {
        if phase.status != ExecutionStatus::FatalError {
            continue;
        }
        if !phase.message.is_empty() {
            return (ps.status, phase.message.clone());
        }
        if let Some(step) = phase
            .steps
            .iter()
            .find(|s| s.status == ExecutionStatus::FatalError)
        {
            return (ps.status, step.message.clone());
        }
    }

    (ps.status, ps.message.clone())
}

impl Instance {
    pub(crate) fn from_parts(client: Client, inner: kudov1beta1::Instance) -> Self {
        Instance {
            inner,
            last_plan_check: None,
            client,
        }
    }

    pub fn into_inner(self) -> kudov1beta1::Instance {
        self.inner
    }

    fn api(&self) -> Api<kudov1beta1::Instance> {
        self.client.namespaced_api(self.inner.namespace().as_deref())
    }

    fn describe(&self) -> String {
        let namespace = self.inner.namespace().unwrap_or_default();
        describe("instance", &self.inner.name_any(), Some(namespace.as_str()))
    }

    /// Status entry of a plan, `None` if the plan never ran
    pub fn plan_status(&self, plan: &str) -> Option<&PlanStatus> {
        plan_status(&self.inner, plan)
    }

    /// Status and most detailed message of a plan
    pub fn plan_status_and_message(&self, plan: &str) -> (ExecutionStatus, String) {
        current_plan_status_and_message(&self.inner, plan)
    }

    /// Refresh the instance with its current state on the cluster
    pub async fn update(&mut self) -> Result<()> {
        let update = self
            .api()
            .get(&self.inner.name_any())
            .await
            .map_err(|e| Error::kube(format!("failed to update {}", self.describe()), e))?;
        self.inner = update;

        Ok(())
    }

    /// Merge parameters into the existing ones and update the instance on the
    /// cluster. Changed parameters can trigger plans.
    #[instrument(skip(self, parameters), fields(instance = %self.describe()))]
    pub async fn update_parameters(&mut self, parameters: BTreeMap<String, String>) -> Result<()> {
        self.update().await?;

        let mut current = self.inner.clone();
        current
            .spec
            .parameters
            .get_or_insert_with(BTreeMap::new)
            .extend(parameters);

        let updated = self
            .api()
            .replace(&current.name_any(), &PostParams::default(), &current)
            .await
            .map_err(|e| {
                Error::kube(
                    format!("failed to update parameters of {}", self.describe()),
                    e,
                )
            })?;
        self.inner = updated;
        info!("Updated parameters of {}", self.describe());

        Ok(())
    }

    /// Wait for a plan to reach a status.
    ///
    /// The instance is refreshed on every tick of `interval` until the plan
    /// has `status`. A plan run is identified by the UID of its status; runs
    /// without a UID are not considered, and neither is the run this instance
    /// last matched for the same status. The first refresh happens one
    /// interval after the call.
    ///
    /// Fails with [`PlanStatusTimeout`] when `timeout` elapses first, or with
    /// the refresh error. A zero `interval` is rejected.
    #[instrument(skip(self), fields(instance = %self.describe()))]
    pub async fn wait_for_plan_status(
        &mut self,
        plan: &str,
        status: ExecutionStatus,
        timeout: Duration,
        interval: Duration,
    ) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let deadline = sleep(timeout);
        tokio::pin!(deadline);

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    let (actual_status, message) = current_plan_status_and_message(&self.inner, plan);
                    return Err(PlanStatusTimeout {
                        plan: plan.to_string(),
                        expected_status: status,
                        actual_status,
                        message,
                    }
                    .into());
                }
                _ = ticker.tick() => {
                    self.update().await?;

                    let uid = current_plan_status_uid(&self.inner, plan);
                    if uid.is_empty() || self.is_checked(uid, status) {
                        continue;
                    }

                    let (current, _) = current_plan_status_and_message(&self.inner, plan);
                    if current == status {
                        debug!("Plan {} reached {} in run {}", plan, status, uid);
                        self.last_plan_check = Some(PlanCheck {
                            uid: uid.to_string(),
                            status,
                        });
                        return Ok(());
                    }
                }
            }
        }
    }

    fn is_checked(&self, uid: &str, status: ExecutionStatus) -> bool {
        self.last_plan_check
            .as_ref()
            .is_some_and(|check| check.uid == uid && check.status == status)
    }

    /// Wait for a plan to be in progress.
    ///
    /// Waits 30 seconds unless overridden with [`super::wait_timeout`].
    pub async fn wait_for_plan_in_progress(
        &mut self,
        plan: &str,
        options: &[WaitOption],
    ) -> Result<()> {
        let config = WaitConfig::new(Duration::from_secs(wait::IN_PROGRESS_TIMEOUT_SECS))
            .with_options(options);

        self.wait_for_plan_status(
            plan,
            ExecutionStatus::InProgress,
            config.timeout,
            Duration::from_secs(wait::IN_PROGRESS_POLL_INTERVAL_SECS),
        )
        .await
    }

    /// Wait for a plan to complete.
    ///
    /// Waits 5 minutes unless overridden with [`super::wait_timeout`].
    pub async fn wait_for_plan_complete(&mut self, plan: &str, options: &[WaitOption]) -> Result<()> {
        let config = WaitConfig::new(Duration::from_secs(wait::COMPLETE_TIMEOUT_SECS))
            .with_options(options);

        self.wait_for_plan_status(
            plan,
            ExecutionStatus::Complete,
            config.timeout,
            Duration::from_secs(wait::COMPLETE_POLL_INTERVAL_SECS),
        )
        .await
    }
}

impl Deref for Instance {
    type Target = kudov1beta1::Instance;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("inner", &self.inner)
            .field("last_plan_check", &self.last_plan_check)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner && self.last_plan_check == other.last_plan_check
    }
}
