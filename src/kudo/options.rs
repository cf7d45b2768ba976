// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

/// Changes a [`WaitConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOption {
    Timeout(Duration),
}

/// Override the timeout of an instance wait call
pub fn wait_timeout(timeout: Duration) -> WaitOption {
    WaitOption::Timeout(timeout)
}

/// Settings of an instance wait call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration) -> Self {
        WaitConfig { timeout }
    }

    /// Apply options in order, later ones win
    pub fn with_options(mut self, options: &[WaitOption]) -> Self {
        for option in options {
            match option {
                WaitOption::Timeout(timeout) => self.timeout = *timeout,
            }
        }
        self
    }
}
