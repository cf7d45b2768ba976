// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Installing, upgrading and removing KUDO operator packages.
//!
//! Package resolution and installation are done by the `kudo` kubectl plugin,
//! this module only drives it and loads the resulting cluster resources.

use super::instance::{get_instance, Instance};
use crate::client::Client;
use crate::cmd::Cmd;
use crate::error::{Error, Result};
use crate::kubernetes::wrapper::describe;
use crate::types::kudo as kudov1beta1;
use k8s_openapi::NamespaceResourceScope;
use kube::api::DeleteParams;
use kube::{Api, Resource, ResourceExt};
use kube_runtime::wait::{await_condition, conditions};
use semver::Version;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The cluster resources KUDO installed for an operator package.
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub instance: Instance,
    pub operator_version: kudov1beta1::OperatorVersion,
    pub operator: kudov1beta1::Operator,
    client: Client,
}

/// Load the instance, operator version and operator that belong together
#[instrument(skip(client))]
pub async fn load_operator(
    client: &Client,
    name: &str,
    instance: &str,
    namespace: &str,
) -> Result<Operator> {
    let instance = get_instance(client, instance, namespace).await?;

    let ov_name = &instance.spec.operator_version.name;
    let operator_version = client
        .namespaced_api::<kudov1beta1::OperatorVersion>(Some(namespace))
        .get(ov_name)
        .await
        .map_err(|e| {
            Error::kube(
                format!(
                    "failed to get {}",
                    describe("operatorversion", ov_name, Some(namespace))
                ),
                e,
            )
        })?;

    let operator_name = &operator_version.spec.operator.name;
    let operator = client
        .namespaced_api::<kudov1beta1::Operator>(Some(namespace))
        .get(operator_name)
        .await
        .map_err(|e| {
            Error::kube(
                format!(
                    "failed to get {}",
                    describe("operator", operator_name, Some(namespace))
                ),
                e,
            )
        })?;

    Ok(Operator {
        name: name.to_string(),
        instance,
        operator_version,
        operator,
        client: client.clone(),
    })
}

/// Options passed through to `kubectl kudo install`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub skip_instance: bool,
    pub create_namespace: bool,
    /// Let the plugin wait for the deploy plan, up to the given time
    pub wait: Option<Duration>,
}

/// Builder for an operator installation, started with [`install_operator`].
///
/// ```ignore
/// let operator = install_operator("kafka")
///     .with_namespace("kafka")
///     .with_instance("kafka-instance")
///     .with_app_version(Version::new(2, 4, 0))
///     .run(&client)
///     .await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorBuilder {
    name: String,
    namespace: String,
    instance: String,
    operator_version: Option<Version>,
    app_version: Option<Version>,
    parameters: BTreeMap<String, String>,
    options: InstallOptions,
}

/// Start installing a KUDO operator package
pub fn install_operator(operator: impl Into<String>) -> OperatorBuilder {
    OperatorBuilder {
        name: operator.into(),
        ..Default::default()
    }
}

impl OperatorBuilder {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn with_operator_version(mut self, version: Version) -> Self {
        self.operator_version = Some(version);
        self
    }

    /// Version of the application bundled by the operator
    pub fn with_app_version(mut self, version: Version) -> Self {
        self.app_version = Some(version);
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    fn arguments(&self, kubeconfig: Option<&Path>) -> Vec<String> {
        let mut args = kubeconfig_arguments(kubeconfig);
        args.extend(["kudo".to_string(), "install".to_string(), self.name.clone()]);
        push_flag(&mut args, "--namespace", &self.namespace);
        push_flag(&mut args, "--instance", &self.instance);
        push_versions(
            &mut args,
            self.operator_version.as_ref(),
            self.app_version.as_ref(),
        );
        push_parameters(&mut args, &self.parameters);

        if self.options.skip_instance {
            args.push("--skip-instance".to_string());
        }
        if self.options.create_namespace {
            args.push("--create-namespace".to_string());
        }
        if let Some(wait) = self.options.wait {
            args.push("--wait".to_string());
            args.push(format!("--wait-time={}", wait.as_secs()));
        }

        args
    }

    /// Install the operator and load the installed resources
    #[instrument(skip_all, fields(operator = %self.name, instance = %self.instance))]
    pub async fn run(self, client: &Client) -> Result<Operator> {
        Cmd::new(&client.config().kubectl_path)
            .with_arguments(self.arguments(client.kubeconfig_path()))
            .run()
            .await?;
        info!("Installed operator {}", self.name);

        load_operator(client, &self.name, &self.instance, &self.namespace).await
    }
}

/// Builder for an operator upgrade, started with [`upgrade_operator`].
///
/// ```ignore
/// upgrade_operator()
///     .to_app_version(Version::new(1, 0, 1))
///     .run(&mut operator)
///     .await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpgradeBuilder {
    name: Option<String>,
    operator_version: Option<Version>,
    app_version: Option<Version>,
    parameters: BTreeMap<String, String>,
}

/// Start upgrading an installed operator
pub fn upgrade_operator() -> UpgradeBuilder {
    UpgradeBuilder::default()
}

impl UpgradeBuilder {
    /// Upgrade using another package than the installed one
    pub fn with_operator(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_operator_version(mut self, version: Version) -> Self {
        self.operator_version = Some(version);
        self
    }

    pub fn to_app_version(mut self, version: Version) -> Self {
        self.app_version = Some(version);
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    fn arguments(&self, operator: &Operator, kubeconfig: Option<&Path>) -> Vec<String> {
        let name = self.name.as_deref().unwrap_or(&operator.name);

        let mut args = kubeconfig_arguments(kubeconfig);
        args.extend(["kudo".to_string(), "upgrade".to_string(), name.to_string()]);
        push_flag(
            &mut args,
            "--namespace",
            &operator.instance.namespace().unwrap_or_default(),
        );
        push_flag(&mut args, "--instance", &operator.instance.name_any());
        push_versions(
            &mut args,
            self.operator_version.as_ref(),
            self.app_version.as_ref(),
        );
        push_parameters(&mut args, &self.parameters);

        args
    }

    /// Upgrade the operator, reloading its resources in place
    #[instrument(skip_all, fields(operator = %operator.name))]
    pub async fn run(self, operator: &mut Operator) -> Result<()> {
        let client = operator.client.clone();

        Cmd::new(&client.config().kubectl_path)
            .with_arguments(self.arguments(operator, client.kubeconfig_path()))
            .run()
            .await?;
        info!("Upgraded operator {}", operator.name);

        let name = operator.name.clone();
        let instance = operator.instance.name_any();
        let namespace = operator.instance.namespace().unwrap_or_default();
        *operator = load_operator(&client, &name, &instance, &namespace).await?;

        Ok(())
    }
}

fn kubeconfig_arguments(kubeconfig: Option<&Path>) -> Vec<String> {
    match kubeconfig {
        Some(path) => vec!["--kubeconfig".to_string(), path.display().to_string()],
        None => Vec::new(),
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

fn push_versions(args: &mut Vec<String>, operator_version: Option<&Version>, app_version: Option<&Version>) {
    if let Some(version) = operator_version {
        push_flag(args, "--operator-version", &version.to_string());
    }
    if let Some(version) = app_version {
        push_flag(args, "--app-version", &version.to_string());
    }
}

fn push_parameters(args: &mut Vec<String>, parameters: &BTreeMap<String, String>) {
    for (key, value) in parameters {
        args.push("-p".to_string());
        args.push(format!("{}={}", key, value));
    }
}

impl Operator {
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Remove the instance, operator version and operator.
    ///
    /// Don't use this when several instances share the operator version.
    pub async fn uninstall(&self) -> Result<()> {
        self.uninstall_wait_for_deletion(Duration::ZERO).await
    }

    /// Like [`Operator::uninstall`], but with foreground deletion and waiting
    /// up to `timeout` for each resource to disappear before deleting the
    /// next one. Deleting in order keeps the operator version around until
    /// its instance is gone. A zero timeout does not wait.
    #[instrument(skip(self), fields(operator = %self.name))]
    pub async fn uninstall_wait_for_deletion(&self, timeout: Duration) -> Result<()> {
        let instance: &kudov1beta1::Instance = &self.instance;

        self.delete_and_wait("instance", instance, timeout).await?;
        self.delete_and_wait("operatorversion", &self.operator_version, timeout)
            .await?;
        self.delete_and_wait("operator", &self.operator, timeout)
            .await?;
        info!("Uninstalled operator {}", self.name);

        Ok(())
    }

    async fn delete_and_wait<K>(&self, label: &str, object: &K, timeout: Duration) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned
            + Send
            + Sync
            + 'static,
    {
        let name = object.name_any();
        let namespace = object.namespace().unwrap_or_default();
        let api: Api<K> = self.client.namespaced_api(Some(&namespace));

        let params = if timeout.is_zero() {
            DeleteParams::default()
        } else {
            DeleteParams::foreground()
        };

        api.delete(&name, &params).await.map_err(|e| {
            Error::kube(
                format!(
                    "failed to delete {}",
                    describe(label, &name, Some(namespace.as_str()))
                ),
                e,
            )
        })?;
        debug!("Deleted {} {}", label, name);

        if timeout.is_zero() {
            return Ok(());
        }

        let uid = object.uid().unwrap_or_default();
        match tokio::time::timeout(timeout, await_condition(api, &name, conditions::is_deleted(&uid)))
            .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(source)) => Err(Error::DeletionWatch {
                namespace,
                name,
                source,
            }),
            Err(_) => Err(Error::DeletionTimeout {
                namespace,
                name,
                seconds: timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{list_json, object_json, MockService};
    use serde_json::{json, Value};

    const BASE: &str = "/apis/kudo.dev/v1beta1/namespaces/kafka";

    fn instance() -> Value {
        let mut instance = object_json("kudo.dev/v1beta1", "Instance", "kafka-instance", "kafka");
        instance["spec"] = json!({ "operatorVersion": { "name": "kafka-1.2.0" } });
        instance
    }

    fn operator_version() -> Value {
        let mut ov = object_json("kudo.dev/v1beta1", "OperatorVersion", "kafka-1.2.0", "kafka");
        ov["spec"] = json!({ "operator": { "name": "kafka" }, "version": "1.2.0" });
        ov
    }

    fn operator() -> Value {
        object_json("kudo.dev/v1beta1", "Operator", "kafka", "kafka")
    }

    fn operator_mock() -> MockService {
        MockService::new()
            .on_get(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .on_get(
                &format!("{}/operatorversions/kafka-1.2.0", BASE),
                200,
                &operator_version().to_string(),
            )
            .on_get(&format!("{}/operators/kafka", BASE), 200, &operator().to_string())
    }

    #[tokio::test]
    async fn test_load_operator() {
        let client = operator_mock().into_test_client();

        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        assert_eq!(operator.name, "kafka");
        assert_eq!(operator.instance.name_any(), "kafka-instance");
        assert_eq!(operator.operator_version.spec.version.as_deref(), Some("1.2.0"));
        assert_eq!(operator.operator.name_any(), "kafka");
    }

    #[tokio::test]
    async fn test_load_operator_missing_operator_version() {
        let client = MockService::new()
            .on_get(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .into_test_client();

        let err = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err
            .to_string()
            .starts_with("failed to get operatorversion kafka-1.2.0 in namespace kafka: "));
    }

    #[test]
    fn test_install_arguments() {
        let args = install_operator("kafka")
            .with_namespace("kafka")
            .with_instance("kafka-instance")
            .with_app_version(Version::new(2, 4, 0))
            .with_parameters(BTreeMap::from([("BROKER_COUNT".to_string(), "3".to_string())]))
            .with_options(InstallOptions {
                create_namespace: true,
                wait: Some(Duration::from_secs(300)),
                ..Default::default()
            })
            .arguments(Some(Path::new("/tmp/kubeconfig")));

        assert_eq!(
            args,
            [
                "--kubeconfig",
                "/tmp/kubeconfig",
                "kudo",
                "install",
                "kafka",
                "--namespace",
                "kafka",
                "--instance",
                "kafka-instance",
                "--app-version",
                "2.4.0",
                "-p",
                "BROKER_COUNT=3",
                "--create-namespace",
                "--wait",
                "--wait-time=300",
            ]
        );
    }

    #[test]
    fn test_install_arguments_minimal() {
        let args = install_operator("zookeeper")
            .with_operator_version(Version::new(0, 3, 0))
            .with_options(InstallOptions {
                skip_instance: true,
                ..Default::default()
            })
            .arguments(None);

        assert_eq!(
            args,
            [
                "kudo",
                "install",
                "zookeeper",
                "--operator-version",
                "0.3.0",
                "--skip-instance",
            ]
        );
    }

    #[tokio::test]
    async fn test_upgrade_arguments() {
        let client = operator_mock().into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        let args = upgrade_operator()
            .to_operator_version(Version::new(1, 3, 0))
            .arguments(&operator, None);
        assert_eq!(
            args,
            [
                "kudo",
                "upgrade",
                "kafka",
                "--namespace",
                "kafka",
                "--instance",
                "kafka-instance",
                "--operator-version",
                "1.3.0",
            ]
        );

        let args = upgrade_operator()
            .with_operator("./kafka-operator")
            .arguments(&operator, None);
        assert_eq!(args[2], "./kafka-operator");
    }

    #[tokio::test]
    async fn test_uninstall_deletes_in_order() {
        let mock = operator_mock()
            .on_delete(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .on_delete(
                &format!("{}/operatorversions/kafka-1.2.0", BASE),
                200,
                &operator_version().to_string(),
            )
            .on_delete(&format!("{}/operators/kafka", BASE), 200, &operator().to_string());
        let requests = mock.requests();
        let client = mock.into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        operator.uninstall().await.unwrap();

        let requests = requests.lock().unwrap();
        let deletes: Vec<&str> = requests
            .iter()
            .filter(|r| r.method == "DELETE")
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(
            deletes,
            [
                "/apis/kudo.dev/v1beta1/namespaces/kafka/instances/kafka-instance",
                "/apis/kudo.dev/v1beta1/namespaces/kafka/operatorversions/kafka-1.2.0",
                "/apis/kudo.dev/v1beta1/namespaces/kafka/operators/kafka",
            ]
        );
        assert!(requests
            .iter()
            .filter(|r| r.method == "DELETE")
            .all(|r| !r.body.contains("Foreground")));
    }

    #[tokio::test]
    async fn test_uninstall_stops_at_first_failure() {
        let mock = operator_mock();
        let requests = mock.requests();
        let client = mock.into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        let err = operator.uninstall().await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err
            .to_string()
            .starts_with("failed to delete instance kafka-instance in namespace kafka: "));
        let requests = requests.lock().unwrap();
        assert_eq!(requests.iter().filter(|r| r.method == "DELETE").count(), 1);
    }

    #[tokio::test]
    async fn test_uninstall_wait_for_deletion_uses_foreground() {
        let empty = |kind: &str| {
            json!({
                "apiVersion": "kudo.dev/v1beta1",
                "kind": format!("{}List", kind),
                "metadata": { "resourceVersion": "2" },
                "items": []
            })
            .to_string()
        };
        let mock = operator_mock()
            .on_delete(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .on_delete(
                &format!("{}/operatorversions/kafka-1.2.0", BASE),
                200,
                &operator_version().to_string(),
            )
            .on_delete(&format!("{}/operators/kafka", BASE), 200, &operator().to_string())
            .on_get(&format!("{}/instances", BASE), 200, &empty("Instance"))
            .on_get(&format!("{}/operatorversions", BASE), 200, &empty("OperatorVersion"))
            .on_get(&format!("{}/operators", BASE), 200, &empty("Operator"));
        let requests = mock.requests();
        let client = mock.into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        operator
            .uninstall_wait_for_deletion(Duration::from_secs(5))
            .await
            .unwrap();

        let requests = requests.lock().unwrap();
        let deletes: Vec<_> = requests.iter().filter(|r| r.method == "DELETE").collect();
        assert_eq!(deletes.len(), 3);
        assert!(deletes
            .iter()
            .all(|r| r.body.contains("\"propagationPolicy\":\"Foreground\"")));
    }

    #[tokio::test]
    async fn test_uninstall_wait_for_deletion_times_out() {
        let instances = format!("{}/instances", BASE);
        let mock = operator_mock()
            .on_delete(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .on_get(
                &instances,
                200,
                &list_json("kudo.dev/v1beta1", "Instance", vec![instance()]),
            )
            .on_get(
                &instances,
                200,
                &json!({ "type": "MODIFIED", "object": instance() }).to_string(),
            );
        let requests = mock.requests();
        let client = mock.into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        let err = operator
            .uninstall_wait_for_deletion(Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            &err,
            Error::DeletionTimeout { namespace, name, .. }
                if namespace == "kafka" && name == "kafka-instance"
        ));
        let requests = requests.lock().unwrap();
        let deletes: Vec<&str> = requests
            .iter()
            .filter(|r| r.method == "DELETE")
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(
            deletes,
            ["/apis/kudo.dev/v1beta1/namespaces/kafka/instances/kafka-instance"]
        );
    }

    #[tokio::test]
    async fn test_uninstall_wait_for_deletion_watch_failure() {
        let forbidden = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "instances.kudo.dev is forbidden",
            "reason": "Forbidden",
            "code": 403
        });
        let mock = operator_mock()
            .on_delete(&format!("{}/instances/kafka-instance", BASE), 200, &instance().to_string())
            .on_get(&format!("{}/instances", BASE), 403, &forbidden.to_string());
        let requests = mock.requests();
        let client = mock.into_test_client();
        let operator = load_operator(&client, "kafka", "kafka-instance", "kafka")
            .await
            .unwrap();

        let err = operator
            .uninstall_wait_for_deletion(Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(!err.is_timeout());
        assert!(matches!(
            &err,
            Error::DeletionWatch { name, .. } if name == "kafka-instance"
        ));
        let requests = requests.lock().unwrap();
        assert_eq!(requests.iter().filter(|r| r.method == "DELETE").count(), 1);
    }
}
