// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helpers for KUDO operators and their instances.

pub mod instance;
pub mod operator;
pub mod options;

pub use instance::{get_instance, list_instances, Instance};
pub use operator::{
    install_operator, load_operator, upgrade_operator, InstallOptions, Operator, OperatorBuilder,
    UpgradeBuilder,
};
pub use options::{wait_timeout, WaitConfig, WaitOption};

use crate::types::kudo::ExecutionStatus;
use thiserror::Error;

/// Returned when a plan did not reach the expected status in time.
///
/// `actual_status` and `message` describe the last state seen before the
/// deadline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("timed out waiting for plan {plan} to have {expected_status} status; current plan status is {actual_status} with message \"{message}\"")]
pub struct PlanStatusTimeout {
    pub plan: String,
    pub expected_status: ExecutionStatus,
    pub actual_status: ExecutionStatus,
    pub message: String,
}

impl PlanStatusTimeout {
    pub fn is_timeout(&self) -> bool {
        true
    }

    pub fn is_temporary(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_status_timeout_message() {
        let err = PlanStatusTimeout {
            plan: "deploy".to_string(),
            expected_status: ExecutionStatus::Complete,
            actual_status: ExecutionStatus::FatalError,
            message: "pod kafka-0 crashlooping".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "timed out waiting for plan deploy to have COMPLETE status; current plan status is FATAL_ERROR with message \"pod kafka-0 crashlooping\""
        );
        assert!(err.is_timeout());
        assert!(err.is_temporary());
    }
}
