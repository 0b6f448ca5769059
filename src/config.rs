use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LifecycleError, Result};

/// lifecycle engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub expiration: ExpirationConfig,
    pub settlement: SettlementConfig,
}

/// expiration monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// leases with this many days or fewer left are expiring soon
    pub expiring_window_days: u32,
    /// notice thresholds in days, strictly descending
    pub notice_thresholds: Vec<u32>,
    /// expire sent quotations past their validity date during the scan
    pub expire_quotations: bool,
}

/// deposit settlement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// net refunds with a larger magnitude need a manager
    pub approval_threshold: Money,
    /// penalty cap in months when the lease clause names none
    pub early_termination_cap_months: u32,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            expiring_window_days: 60,
            notice_thresholds: vec![60, 30, 14],
            expire_quotations: true,
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            approval_threshold: Money::from_decimal(dec!(5000)),
            early_termination_cap_months: 2,
        }
    }
}

impl LifecycleConfig {
    /// load from json, missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LifecycleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// pretty json for logging and fixtures
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_approval_threshold(mut self, threshold: Money) -> Self {
        self.settlement.approval_threshold = threshold;
        self
    }

    pub fn with_early_termination_cap(mut self, months: u32) -> Self {
        self.settlement.early_termination_cap_months = months;
        self
    }

    pub fn with_notice_thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.expiration.notice_thresholds = thresholds;
        self
    }

    pub fn with_expiring_window(mut self, days: u32) -> Self {
        self.expiration.expiring_window_days = days;
        self
    }

    /// check internal consistency
    pub fn validate(&self) -> Result<()> {
        let thresholds = &self.expiration.notice_thresholds;

        if thresholds.is_empty() {
            return Err(LifecycleError::InvalidConfiguration {
                message: "at least one notice threshold is required".to_string(),
            });
        }

        if thresholds.windows(2).any(|w| w[0] <= w[1]) {
            return Err(LifecycleError::InvalidConfiguration {
                message: format!("notice thresholds must be strictly descending: {thresholds:?}"),
            });
        }

        // a threshold outside the window could never be crossed by a scanned lease
        if thresholds[0] > self.expiration.expiring_window_days {
            return Err(LifecycleError::InvalidConfiguration {
                message: format!(
                    "threshold {} exceeds expiring window of {} days",
                    thresholds[0], self.expiration.expiring_window_days
                ),
            });
        }

        if self.settlement.approval_threshold.is_negative() {
            return Err(LifecycleError::InvalidConfiguration {
                message: "approval threshold cannot be negative".to_string(),
            });
        }

        Ok(())
    }
}
