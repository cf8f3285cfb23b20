//! Auto-approval configuration.
//!
//! Built once (at process start or on explicit reload) from environment
//! variables and handed by reference into the policy and the engine.
//! Immutable during a single evaluation.

use std::env;

use crate::error::{ConfigError, Result};

/// Recognized environment variables.
const AUTO_CONFIRM_APPOINTMENTS: &str = "AUTO_CONFIRM_APPOINTMENTS";
const AUTO_ONBOARD_PATIENTS: &str = "AUTO_ONBOARD_PATIENTS";
const AUTO_REMINDERS_ENABLED: &str = "AUTO_REMINDERS_ENABLED";
const REMINDER_HOURS_24: &str = "REMINDER_HOURS_24";
const REMINDER_HOURS_2: &str = "REMINDER_HOURS_2";
const AUTO_APPROVE_MAX_PER_HOUR: &str = "AUTO_APPROVE_MAX_PER_HOUR";
const AUTO_APPROVE_URGENCY_OVERRIDE: &str = "AUTO_APPROVE_URGENCY_OVERRIDE";

/// Process-wide auto-approval flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoApprovalConfig {
    /// Auto-approve appointment confirmations and reschedule
    /// confirmations.
    pub auto_confirm_appointments: bool,

    /// Auto-approve patient welcome messages.
    pub auto_onboard_patients: bool,

    /// Auto-approve appointment reminders.
    pub auto_reminders_enabled: bool,

    /// Reminder timing sub-flags. Consumed by the reminder scheduler
    /// collaborator, carried here so one struct describes the whole
    /// auto-send surface.
    pub reminder_hours_24: bool,
    pub reminder_hours_2: bool,

    /// Safety cap: maximum auto-approvals per rolling hour.
    pub max_per_hour: u32,

    /// When true, elevated urgency no longer blocks auto-approval.
    pub urgency_override_enabled: bool,
}

impl Default for AutoApprovalConfig {
    fn default() -> Self {
        Self {
            auto_confirm_appointments: true,
            auto_onboard_patients: true,
            auto_reminders_enabled: true,
            reminder_hours_24: true,
            reminder_hours_2: true,
            max_per_hour: 50,
            urgency_override_enabled: false,
        }
    }
}

impl AutoApprovalConfig {
    /// Build the configuration from environment variables, using the
    /// defaults above for anything unset.
    ///
    /// A present-but-invalid value is a [`ConfigError`], never a silent
    /// default: the caller is expected to deny auto-approval until the
    /// configuration is fixed.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            auto_confirm_appointments: env_bool(
                AUTO_CONFIRM_APPOINTMENTS,
                d.auto_confirm_appointments,
            )?,
            auto_onboard_patients: env_bool(AUTO_ONBOARD_PATIENTS, d.auto_onboard_patients)?,
            auto_reminders_enabled: env_bool(AUTO_REMINDERS_ENABLED, d.auto_reminders_enabled)?,
            reminder_hours_24: env_bool(REMINDER_HOURS_24, d.reminder_hours_24)?,
            reminder_hours_2: env_bool(REMINDER_HOURS_2, d.reminder_hours_2)?,
            max_per_hour: env_u32(AUTO_APPROVE_MAX_PER_HOUR, d.max_per_hour)?,
            urgency_override_enabled: env_bool(
                AUTO_APPROVE_URGENCY_OVERRIDE,
                d.urgency_override_enabled,
            )?,
        })
    }
}

fn env_bool(var: &'static str, default: bool) -> Result<bool> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var,
                value: raw,
                expected: "boolean (true/false)",
            }),
        },
    }
}

fn env_u32(var: &'static str, default: u32) -> Result<u32> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue {
                var,
                value: raw,
                expected: "non-negative integer",
            }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
