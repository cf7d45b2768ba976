// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generator for the CRUD wrappers around Kubernetes objects.
//!
//! Every wrapped type gets the same set of operations:
//!
//! ```ignore
//! kube_wrapper! {
//!     /// Service wraps a Kubernetes Service.
//!     namespaced Service(k8s_openapi::api::core::v1::Service) as "service" {
//!         new: new_service,
//!         get: get_service,
//!         list: list_services,
//!     }
//! }
//! ```
//!
//! expands to a `Service` struct that derefs to the API object and has
//! `delete`, `update` and `save`, plus the free functions `new_service`,
//! `get_service` and `list_services`. Cluster-scoped types use `cluster`
//! instead of `namespaced` and lose the namespace arguments.

/// Describe an object for error messages, e.g. `service web in namespace test`
pub(crate) fn describe(label: &str, name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("{} {} in namespace {}", label, name, namespace),
        None => format!("{} {}", label, name),
    }
}

macro_rules! kube_wrapper {
    (
        $(#[$meta:meta])*
        namespaced $wrapper:ident($object:ty) as $label:literal {
            new: $new_fn:ident,
            get: $get_fn:ident,
            list: $list_fn:ident $(,)?
        }
    ) => {
        kube_wrapper!(@common $(#[$meta])* $wrapper($object) as $label);

        impl $wrapper {
            fn api(&self) -> ::kube::Api<$object> {
                self.client
                    .namespaced_api(::kube::ResourceExt::namespace(&self.inner).as_deref())
            }

            fn describe(&self) -> String {
                let namespace = ::kube::ResourceExt::namespace(&self.inner).unwrap_or_default();
                $crate::kubernetes::wrapper::describe(
                    $label,
                    &::kube::ResourceExt::name_any(&self.inner),
                    Some(namespace.as_str()),
                )
            }
        }

        #[doc = concat!("Create a ", $label, " on the cluster and wrap the created object.")]
        pub async fn $new_fn(
            client: &$crate::client::Client,
            object: $object,
        ) -> $crate::error::Result<$wrapper> {
            let namespace = ::kube::ResourceExt::namespace(&object);
            let api: ::kube::Api<$object> = client.namespaced_api(namespace.as_deref());
            let created = api
                .create(&::kube::api::PostParams::default(), &object)
                .await
                .map_err(|e| {
                    $crate::error::Error::kube(
                        format!(
                            "failed to create {}",
                            $crate::kubernetes::wrapper::describe(
                                $label,
                                &::kube::ResourceExt::name_any(&object),
                                Some(namespace.as_deref().unwrap_or(client.default_namespace())),
                            )
                        ),
                        e,
                    )
                })?;
            ::tracing::debug!("Created {} {}", $label, ::kube::ResourceExt::name_any(&created));

            Ok($wrapper::from_parts(client.clone(), created))
        }

        #[doc = concat!("Get a ", $label, " in a namespace.")]
        pub async fn $get_fn(
            client: &$crate::client::Client,
            name: &str,
            namespace: &str,
        ) -> $crate::error::Result<$wrapper> {
            let api: ::kube::Api<$object> = client.namespaced_api(Some(namespace));
            let object = api.get(name).await.map_err(|e| {
                $crate::error::Error::kube(
                    format!(
                        "failed to get {}",
                        $crate::kubernetes::wrapper::describe($label, name, Some(namespace))
                    ),
                    e,
                )
            })?;

            Ok($wrapper::from_parts(client.clone(), object))
        }

        #[doc = concat!("List all ", $label, "s in a namespace.")]
        pub async fn $list_fn(
            client: &$crate::client::Client,
            namespace: &str,
        ) -> $crate::error::Result<Vec<$wrapper>> {
            let api: ::kube::Api<$object> = client.namespaced_api(Some(namespace));
            let list = api
                .list(&::kube::api::ListParams::default())
                .await
                .map_err(|e| {
                    $crate::error::Error::kube(
                        format!("failed to list {}s in namespace {}", $label, namespace),
                        e,
                    )
                })?;

            Ok(list
                .items
                .into_iter()
                .map(|item| $wrapper::from_parts(client.clone(), item))
                .collect())
        }
    };

    (
        $(#[$meta:meta])*
        cluster $wrapper:ident($object:ty) as $label:literal {
            new: $new_fn:ident,
            get: $get_fn:ident,
            list: $list_fn:ident $(,)?
        }
    ) => {
        kube_wrapper!(@common $(#[$meta])* $wrapper($object) as $label);

        impl $wrapper {
            fn api(&self) -> ::kube::Api<$object> {
                self.client.cluster_api()
            }

            fn describe(&self) -> String {
                $crate::kubernetes::wrapper::describe(
                    $label,
                    &::kube::ResourceExt::name_any(&self.inner),
                    None,
                )
            }
        }

        #[doc = concat!("Create a ", $label, " on the cluster and wrap the created object.")]
        pub async fn $new_fn(
            client: &$crate::client::Client,
            object: $object,
        ) -> $crate::error::Result<$wrapper> {
            let api: ::kube::Api<$object> = client.cluster_api();
            let created = api
                .create(&::kube::api::PostParams::default(), &object)
                .await
                .map_err(|e| {
                    $crate::error::Error::kube(
                        format!(
                            "failed to create {}",
                            $crate::kubernetes::wrapper::describe(
                                $label,
                                &::kube::ResourceExt::name_any(&object),
                                None,
                            )
                        ),
                        e,
                    )
                })?;
            ::tracing::debug!("Created {} {}", $label, ::kube::ResourceExt::name_any(&created));

            Ok($wrapper::from_parts(client.clone(), created))
        }

        #[doc = concat!("Get a ", $label, ".")]
        pub async fn $get_fn(
            client: &$crate::client::Client,
            name: &str,
        ) -> $crate::error::Result<$wrapper> {
            let api: ::kube::Api<$object> = client.cluster_api();
            let object = api.get(name).await.map_err(|e| {
                $crate::error::Error::kube(
                    format!(
                        "failed to get {}",
                        $crate::kubernetes::wrapper::describe($label, name, None)
                    ),
                    e,
                )
            })?;

            Ok($wrapper::from_parts(client.clone(), object))
        }

        #[doc = concat!("List all ", $label, "s.")]
        pub async fn $list_fn(
            client: &$crate::client::Client,
        ) -> $crate::error::Result<Vec<$wrapper>> {
            let api: ::kube::Api<$object> = client.cluster_api();
            let list = api
                .list(&::kube::api::ListParams::default())
                .await
                .map_err(|e| $crate::error::Error::kube(format!("failed to list {}s", $label), e))?;

            Ok(list
                .items
                .into_iter()
                .map(|item| $wrapper::from_parts(client.clone(), item))
                .collect())
        }
    };

    (@common $(#[$meta:meta])* $wrapper:ident($object:ty) as $label:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $wrapper {
            inner: $object,
            client: $crate::client::Client,
        }

        impl $wrapper {
            pub(crate) fn from_parts(client: $crate::client::Client, inner: $object) -> Self {
                Self { inner, client }
            }

            /// The client this object was loaded with
            pub fn client(&self) -> &$crate::client::Client {
                &self.client
            }

            pub fn into_inner(self) -> $object {
                self.inner
            }

            #[doc = concat!("Delete the ", $label, " from the cluster.")]
            pub async fn delete(&self) -> $crate::error::Result<()> {
                self.api()
                    .delete(
                        &::kube::ResourceExt::name_any(&self.inner),
                        &::kube::api::DeleteParams::default(),
                    )
                    .await
                    .map_err(|e| {
                        $crate::error::Error::kube(format!("failed to delete {}", self.describe()), e)
                    })?;
                ::tracing::debug!("Deleted {}", self.describe());

                Ok(())
            }

            #[doc = concat!("Refresh the ", $label, " with its current state on the cluster.")]
            pub async fn update(&mut self) -> $crate::error::Result<()> {
                let update = self
                    .api()
                    .get(&::kube::ResourceExt::name_any(&self.inner))
                    .await
                    .map_err(|e| {
                        $crate::error::Error::kube(format!("failed to update {}", self.describe()), e)
                    })?;
                self.inner = update;

                Ok(())
            }

            #[doc = concat!("Replace the ", $label, " on the cluster with the local state.")]
            pub async fn save(&mut self) -> $crate::error::Result<()> {
                let update = self
                    .api()
                    .replace(
                        &::kube::ResourceExt::name_any(&self.inner),
                        &::kube::api::PostParams::default(),
                        &self.inner,
                    )
                    .await
                    .map_err(|e| {
                        $crate::error::Error::kube(format!("failed to save {}", self.describe()), e)
                    })?;
                self.inner = update;

                Ok(())
            }
        }

        impl ::std::ops::Deref for $wrapper {
            type Target = $object;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl ::std::ops::DerefMut for $wrapper {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.inner
            }
        }

        impl ::std::fmt::Debug for $wrapper {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(stringify!($wrapper)).field(&self.inner).finish()
            }
        }

        /// Wrappers compare by object, the client is ignored
        impl PartialEq for $wrapper {
            fn eq(&self, other: &Self) -> bool {
                self.inner == other.inner
            }
        }
    };
}
