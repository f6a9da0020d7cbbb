//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_approval(config)?;
    validate_budget(config)?;
    validate_audit(config)?;
    validate_keys(config)?;
    Ok(())
}

/// Upper bound on the ticket timeout (one day).
const MAX_TICKET_TIMEOUT_SECS: u64 = 86_400;

fn validate_approval(config: &Config) -> ConfigResult<()> {
    let secs = config.approval.ticket_timeout_secs;
    if secs == 0 || secs > MAX_TICKET_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError {
            field: "approval.ticket_timeout_secs".to_owned(),
            message: format!("must be between 1 and {MAX_TICKET_TIMEOUT_SECS}, got {secs}"),
        });
    }
    Ok(())
}

fn validate_budget(config: &Config) -> ConfigResult<()> {
    let b = &config.budget;

    // A trial principal must never have more headroom than a paid one.
    check_ordering(
        "budget.trial.max_tasks_per_day",
        b.trial.max_tasks_per_day.map(u64::from),
        b.paid.max_tasks_per_day.map(u64::from),
    )?;
    check_ordering(
        "budget.trial.max_spend_cents_per_day",
        b.trial.max_spend_cents_per_day,
        b.paid.max_spend_cents_per_day,
    )?;
    check_ordering(
        "budget.trial.max_requests_per_minute",
        b.trial.max_requests_per_minute.map(u64::from),
        b.paid.max_requests_per_minute.map(u64::from),
    )?;
    Ok(())
}

fn check_ordering(field: &str, trial: Option<u64>, paid: Option<u64>) -> ConfigResult<()> {
    match (trial, paid) {
        // An uncapped trial next to a capped paid tier is inverted.
        (None, Some(_)) => Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: "trial tier is uncapped while paid tier is capped".to_owned(),
        }),
        (Some(t), Some(p)) if t > p => Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!("trial cap {t} exceeds paid cap {p}"),
        }),
        _ => Ok(()),
    }
}

fn validate_audit(config: &Config) -> ConfigResult<()> {
    if config.audit.storage != "memory" {
        return Err(ConfigError::ValidationError {
            field: "audit.storage".to_owned(),
            message: format!(
                "unsupported storage backend {:?}; expected \"memory\"",
                config.audit.storage
            ),
        });
    }
    Ok(())
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    if config.keys.rotation_interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "keys.rotation_interval_secs".to_owned(),
            message: "must be nonzero".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.approval.ticket_timeout_secs = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_trial_caps_above_paid_rejected() {
        let mut config = Config::default();
        config.budget.trial.max_spend_cents_per_day = Some(200_000);
        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. })
                if field == "budget.trial.max_spend_cents_per_day"
        ));
    }

    #[test]
    fn test_uncapped_trial_with_capped_paid_rejected() {
        let mut config = Config::default();
        config.budget.trial.max_requests_per_minute = None;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_storage_backend_rejected() {
        let mut config = Config::default();
        config.audit.storage = "postgres".into();
        assert!(validate(&config).is_err());
    }
}
