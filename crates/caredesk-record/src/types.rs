//! Metadata enums for action records.
//!
//! Every enum here crosses the frontmatter boundary as a string, so each
//! carries `as_str`/`parse` pairs alongside its serde implementation. The
//! action type is a closed set: a string outside it parses into
//! [`ActionType::Unknown`] rather than failing, and the policy layer
//! treats `Unknown` as an explicit deny.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Action type
// ---------------------------------------------------------------------------

/// The category of real-world action a record represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    // -- Practice workflow categories ---------------------------------------
    AppointmentConfirmation,
    AppointmentReminder,
    PatientWelcome,
    AppointmentRescheduleConfirmation,
    PrescriptionSend,
    DiagnosisSend,
    TreatmentPlanSend,
    LabResultsSend,
    MedicalAdviceSend,
    EmergencySend,
    BillingInvoiceSend,
    PaymentRequestSend,

    // -- Channel categories --------------------------------------------------
    Email,
    Whatsapp,
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
    Generic,

    /// A type string outside the recognized set, preserved verbatim.
    /// Captured at parse time so the policy can deny it explicitly
    /// instead of erroring deep in the pipeline.
    Unknown(String),
}

impl ActionType {
    /// The string form used in frontmatter and API payloads.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AppointmentConfirmation => "appointment_confirmation",
            Self::AppointmentReminder => "appointment_reminder",
            Self::PatientWelcome => "patient_welcome",
            Self::AppointmentRescheduleConfirmation => "appointment_reschedule_confirmation",
            Self::PrescriptionSend => "prescription_send",
            Self::DiagnosisSend => "diagnosis_send",
            Self::TreatmentPlanSend => "treatment_plan_send",
            Self::LabResultsSend => "lab_results_send",
            Self::MedicalAdviceSend => "medical_advice_send",
            Self::EmergencySend => "emergency_send",
            Self::BillingInvoiceSend => "billing_invoice_send",
            Self::PaymentRequestSend => "payment_request_send",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Generic => "generic",
            Self::Unknown(s) => s,
        }
    }

    /// Parse from the string form. Never fails: unrecognized strings map
    /// to [`ActionType::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s {
            "appointment_confirmation" => Self::AppointmentConfirmation,
            "appointment_reminder" => Self::AppointmentReminder,
            "patient_welcome" => Self::PatientWelcome,
            "appointment_reschedule_confirmation" => Self::AppointmentRescheduleConfirmation,
            "prescription_send" => Self::PrescriptionSend,
            "diagnosis_send" => Self::DiagnosisSend,
            "treatment_plan_send" => Self::TreatmentPlanSend,
            "lab_results_send" => Self::LabResultsSend,
            "medical_advice_send" => Self::MedicalAdviceSend,
            "emergency_send" => Self::EmergencySend,
            "billing_invoice_send" => Self::BillingInvoiceSend,
            "payment_request_send" => Self::PaymentRequestSend,
            "email" => Self::Email,
            "whatsapp" => Self::Whatsapp,
            "linkedin" => Self::Linkedin,
            "twitter" => Self::Twitter,
            "facebook" => Self::Facebook,
            "instagram" => Self::Instagram,
            "generic" => Self::Generic,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this type is in the recognized (closed) set.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

/// How time-critical an action is. Urgent and emergency records never
/// auto-approve unless the urgency override is explicitly configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "urgent" => Some(Self::Urgent),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }

    /// True for urgent or emergency.
    pub fn is_elevated(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Patient risk category
// ---------------------------------------------------------------------------

/// Domain-specific risk band attached by the producer. Optional; records
/// without one default to low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a record reached the Done folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Executed,
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "executed" => Some(Self::Executed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
