// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod client;
pub mod cmd;
pub mod config;
pub mod constants;
pub mod debug;
pub mod error;
pub mod kubernetes;
pub mod kudo;
pub mod tls;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::Client;
pub use error::{Error, Result};
