// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secrets holding self-signed TLS certificates

use crate::client::Client;
use crate::error::{Error, Result};
use crate::kubernetes::{create_secret, Secret};
use chrono::{DateTime, Datelike, Utc};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Data key of the PEM certificate
pub const TLS_CERT_KEY: &str = "tls.crt";
/// Data key of the PEM private key
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";
const VALIDITY_YEARS: i32 = 10;

/// Builder for a certificate secret, started with [`create_cert_secret`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertSecretBuilder {
    name: String,
    namespace: Option<String>,
    common_name: String,
}

/// Start building a secret with a self-signed CA certificate and its key
pub fn create_cert_secret(name: impl Into<String>) -> CertSecretBuilder {
    CertSecretBuilder {
        name: name.into(),
        ..Default::default()
    }
}

impl CertSecretBuilder {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    #[instrument(skip_all, fields(name = %self.name))]
    pub async fn run(self, client: &Client) -> Result<Secret> {
        let data = self_signed_ca(&self.common_name, Utc::now())?;

        let mut secret = create_secret(self.name)
            .with_data(data)
            .with_type(SECRET_TYPE_TLS);
        if let Some(namespace) = self.namespace {
            secret = secret.with_namespace(namespace);
        }

        secret.run(client).await
    }
}

/// Generate a CA certificate valid for ten years from `now`, returned as
/// secret data
fn self_signed_ca(common_name: &str, now: DateTime<Utc>) -> Result<BTreeMap<String, Vec<u8>>> {
    let key_pair = KeyPair::generate().map_err(|e| Error::CertificateError(e.to_string()))?;

    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::KeyCertSign,
    ];
    // day is capped so the date also exists ten years later
    let (month, day) = (now.month() as u8, now.day().min(28) as u8);
    params.not_before = rcgen::date_time_ymd(now.year(), month, day);
    params.not_after = rcgen::date_time_ymd(now.year() + VALIDITY_YEARS, month, day);

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| Error::CertificateError(e.to_string()))?;
    debug!("Generated self-signed certificate for {}", common_name);

    Ok(BTreeMap::from([
        (TLS_CERT_KEY.to_string(), cert.pem().into_bytes()),
        (
            TLS_PRIVATE_KEY_KEY.to_string(),
            key_pair.serialize_pem().into_bytes(),
        ),
    ]))
}
