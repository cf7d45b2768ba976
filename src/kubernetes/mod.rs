// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Wrappers for Kubernetes objects.

#[macro_use]
pub(crate) mod wrapper;

pub mod namespaces;
pub mod pod;
pub mod resources;
pub mod secret;
pub mod statefulset;

pub use namespaces::{
    create_namespace, delete_namespace, ensure_namespace_exists, get_namespace, list_namespaces,
    new_namespace, Namespace,
};
pub use pod::{get_pod, list_pods, new_pod, Pod};
pub use resources::{
    get_persistent_volume_claim, get_role, get_role_binding, get_service,
    list_persistent_volume_claims, list_role_bindings, list_roles, list_services,
    new_persistent_volume_claim, new_role, new_role_binding, new_service, PersistentVolumeClaim,
    Role, RoleBinding, Service,
};
pub use secret::{create_secret, get_secret, list_secrets, new_secret, Secret, SecretBuilder};
pub use statefulset::{get_stateful_set, list_stateful_sets, new_stateful_set, StatefulSet};
