//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The core never reads environment variables itself: binaries read
//! them and hand the raw values to the `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_OVERDUE_GRACE_MINUTES, MAX_OVERDUE_GRACE_MINUTES};
use crate::risk::RiskConvention;
use crate::{CoreError, CoreResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    overdue_grace_minutes: u32,
    risk_convention: RiskConvention,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the grace period exceeds one day.
    pub fn new(overdue_grace_minutes: u32, risk_convention: RiskConvention) -> CoreResult<Self> {
        if overdue_grace_minutes > MAX_OVERDUE_GRACE_MINUTES {
            return Err(CoreError::InvalidConfig(format!(
                "overdue grace of {overdue_grace_minutes} minutes exceeds {MAX_OVERDUE_GRACE_MINUTES}"
            )));
        }

        Ok(Self {
            overdue_grace_minutes,
            risk_convention,
        })
    }

    pub fn overdue_grace_minutes(&self) -> u32 {
        self.overdue_grace_minutes
    }

    pub fn risk_convention(&self) -> RiskConvention {
        self.risk_convention
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            overdue_grace_minutes: DEFAULT_OVERDUE_GRACE_MINUTES,
            risk_convention: RiskConvention::default(),
        }
    }
}

/// Parse the overdue grace period from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_OVERDUE_GRACE_MINUTES`].
pub fn overdue_grace_minutes_from_env_value(value: Option<String>) -> CoreResult<u32> {
    match non_blank(value) {
        None => Ok(DEFAULT_OVERDUE_GRACE_MINUTES),
        Some(v) => v.parse::<u32>().map_err(|_| {
            CoreError::InvalidConfig(format!(
                "overdue grace must be a whole number of minutes, got '{v}'"
            ))
        }),
    }
}

/// Parse the risk-tier convention from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the dual-window convention.
pub fn risk_convention_from_env_value(value: Option<String>) -> CoreResult<RiskConvention> {
    non_blank(value)
        .map(|v| v.parse::<RiskConvention>())
        .transpose()
        .map(Option::unwrap_or_default)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset_or_blank() {
        assert_eq!(overdue_grace_minutes_from_env_value(None).expect("default"), 30);
        assert_eq!(
            overdue_grace_minutes_from_env_value(Some("  ".into())).expect("default"),
            30
        );
        assert_eq!(
            risk_convention_from_env_value(None).expect("default"),
            RiskConvention::DualWindow
        );
    }

    #[test]
    fn parses_explicit_values() {
        assert_eq!(
            overdue_grace_minutes_from_env_value(Some(" 45 ".into())).expect("parse"),
            45
        );
        assert_eq!(
            risk_convention_from_env_value(Some("twelve-month-only".into())).expect("parse"),
            RiskConvention::TwelveMonthOnly
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            overdue_grace_minutes_from_env_value(Some("half an hour".into())),
            Err(CoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            risk_convention_from_env_value(Some("weekly".into())),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn grace_is_bounded() {
        assert!(CoreConfig::new(1440, RiskConvention::DualWindow).is_ok());
        assert!(matches!(
            CoreConfig::new(1441, RiskConvention::DualWindow),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_config() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.overdue_grace_minutes(), 30);
        assert_eq!(cfg.risk_convention(), RiskConvention::DualWindow);
    }
}
