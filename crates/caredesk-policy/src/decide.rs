//! The pure auto-approval decision function.
//!
//! Rules are evaluated in order, first match wins:
//!
//! 1. Elevated urgency (urgent/emergency) denies — unless the urgency
//!    override is enabled, in which case evaluation falls through.
//! 2. High patient risk denies.
//! 3. An unrecognized action type denies (fail safe).
//! 4. The four auto-approvable categories approve when their toggle is
//!    enabled: appointment confirmation / reschedule confirmation
//!    (appointments toggle), patient welcome (onboarding toggle),
//!    appointment reminder (reminders toggle).
//! 5. Everything else denies.
//!
//! The hourly cap lives in [`crate::RateLimiter`], applied by the
//! engine after a positive verdict; this function stays side-effect
//! free and deterministic.

use serde::{Deserialize, Serialize};

use caredesk_record::{ActionType, RiskCategory, Urgency};

use crate::config::AutoApprovalConfig;

/// The outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the record may skip human review.
    pub approve: bool,
    /// Why — always populated, on both approve and deny paths, so the
    /// decision can be audited later.
    pub reason: String,
}

impl Verdict {
    fn approve(reason: impl Into<String>) -> Self {
        Self {
            approve: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            approve: false,
            reason: reason.into(),
        }
    }
}

/// Decide whether an action of this type/urgency/risk may bypass human
/// review under `config`.
pub fn decide(
    action_type: &ActionType,
    urgency: Urgency,
    risk: RiskCategory,
    config: &AutoApprovalConfig,
) -> Verdict {
    if urgency.is_elevated() && !config.urgency_override_enabled {
        return Verdict::deny(format!("urgency override: {urgency} requires human review"));
    }

    if risk == RiskCategory::High {
        return Verdict::deny("high patient risk requires human review");
    }

    if !action_type.is_recognized() {
        return Verdict::deny(format!("unknown type `{action_type}`"));
    }

    match action_type {
        ActionType::AppointmentConfirmation | ActionType::AppointmentRescheduleConfirmation
            if config.auto_confirm_appointments =>
        {
            Verdict::approve(format!("{action_type} is auto-approvable (appointments enabled)"))
        }
        ActionType::PatientWelcome if config.auto_onboard_patients => {
            Verdict::approve("patient_welcome is auto-approvable (onboarding enabled)")
        }
        ActionType::AppointmentReminder if config.auto_reminders_enabled => {
            Verdict::approve("appointment_reminder is auto-approvable (reminders enabled)")
        }
        _ => Verdict::deny(format!("{action_type} requires human review")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
