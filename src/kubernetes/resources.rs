// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Wrappers that need nothing beyond the generated CRUD operations.

use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::rbac::v1 as rbacv1;

kube_wrapper! {
    /// Service wraps a Kubernetes Service.
    namespaced Service(corev1::Service) as "service" {
        new: new_service,
        get: get_service,
        list: list_services,
    }
}

kube_wrapper! {
    /// Role wraps a Kubernetes Role.
    namespaced Role(rbacv1::Role) as "role" {
        new: new_role,
        get: get_role,
        list: list_roles,
    }
}

kube_wrapper! {
    /// RoleBinding wraps a Kubernetes RoleBinding.
    namespaced RoleBinding(rbacv1::RoleBinding) as "rolebinding" {
        new: new_role_binding,
        get: get_role_binding,
        list: list_role_bindings,
    }
}

kube_wrapper! {
    /// PersistentVolumeClaim wraps a Kubernetes PersistentVolumeClaim.
    namespaced PersistentVolumeClaim(corev1::PersistentVolumeClaim) as "persistentvolumeclaim" {
        new: new_persistent_volume_claim,
        get: get_persistent_volume_claim,
        list: list_persistent_volume_claims,
    }
}
