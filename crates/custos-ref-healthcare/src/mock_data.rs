//! Simulated clinical activity for the CUSTOS reference scenarios.
//!
//! All data in this module is hardcoded and fictional.  It stands in for the
//! stream of actions a hospital's clinical systems would report to the audit
//! trail in a production deployment.

use custos_contracts::record::{ActionType, ClientContext, RecordFields};

// ── Actors ────────────────────────────────────────────────────────────────────

pub const ENDOCRINOLOGIST: &str = "dr_rivera";
pub const WARD_NURSE: &str = "nurse_okafor";
pub const LAB_SYSTEM: &str = "lab_interface";

/// Actor id the access gateway records when it cannot authenticate a caller.
pub const UNAUTHORIZED: &str = "unauthorized";

pub const PATIENT_RECORD: &str = "patient_data";

// ── Glucose monitoring (mock) ─────────────────────────────────────────────────

/// One patient's glucose monitoring over a morning: admission, a lab result,
/// two bedside updates and a chart review.
pub fn glucose_monitoring(patient_id: &str) -> Vec<RecordFields> {
    vec![
        RecordFields::new(ENDOCRINOLOGIST, ActionType::Create, PATIENT_RECORD, patient_id)
            .with_description("Admission: type 2 diabetes, glucose monitoring ordered")
            .with_values(None, Some("glucose: pending".into())),
        RecordFields::new(LAB_SYSTEM, ActionType::Update, PATIENT_RECORD, patient_id)
            .with_description("Fasting plasma glucose received from lab")
            .with_values(
                Some("glucose: pending".into()),
                Some("glucose: 110 mg/dL".into()),
            ),
        RecordFields::new(WARD_NURSE, ActionType::Update, PATIENT_RECORD, patient_id)
            .with_description("Bedside capillary glucose, pre-lunch")
            .with_values(
                Some("glucose: 110 mg/dL".into()),
                Some("glucose: 105 mg/dL".into()),
            )
            .with_client(ward_terminal("ward-3b-04")),
        RecordFields::new(WARD_NURSE, ActionType::Update, PATIENT_RECORD, patient_id)
            .with_description("Bedside capillary glucose, post-lunch")
            .with_values(
                Some("glucose: 105 mg/dL".into()),
                Some("glucose: 142 mg/dL".into()),
            )
            .with_client(ward_terminal("ward-3b-04")),
        RecordFields::new(ENDOCRINOLOGIST, ActionType::Read, PATIENT_RECORD, patient_id)
            .with_description("Chart review before insulin adjustment"),
    ]
}

// ── Access gateway events (mock) ──────────────────────────────────────────────

/// Record-access events reported by two clinics' gateways, including denied
/// attempts from unauthenticated callers.
pub fn ward_access_attempts(tenant: &str) -> Vec<RecordFields> {
    let prefix = tenant.trim_start_matches("clinic-");
    vec![
        RecordFields::new(WARD_NURSE, ActionType::Read, PATIENT_RECORD, format!("{}-1001", prefix))
            .with_description("Medication chart opened")
            .with_tenant(tenant)
            .with_client(ward_terminal("nurses-station-1")),
        RecordFields::new(UNAUTHORIZED, ActionType::Read, PATIENT_RECORD, format!("{}-1001", prefix))
            .with_description("Record access without a valid session")
            .with_tenant(tenant)
            .with_client(external_client("203.0.113.77"))
            .failed("authentication required"),
        RecordFields::new(ENDOCRINOLOGIST, ActionType::Update, PATIENT_RECORD, format!("{}-1002", prefix))
            .with_description("Insulin dose adjusted")
            .with_values(Some("insulin: 10 IU".into()), Some("insulin: 12 IU".into()))
            .with_tenant(tenant),
        RecordFields::new(UNAUTHORIZED, ActionType::Delete, PATIENT_RECORD, format!("{}-1002", prefix))
            .with_description("Deletion attempt without a valid session")
            .with_tenant(tenant)
            .with_client(external_client("198.51.100.23"))
            .failed("authentication required"),
        RecordFields::new(UNAUTHORIZED, ActionType::Other("export".into()), PATIENT_RECORD, "bulk")
            .with_description("Bulk export attempt without a valid session")
            .with_tenant(tenant)
            .with_client(external_client("198.51.100.23"))
            .failed("authentication required"),
    ]
}

// ── Client contexts ───────────────────────────────────────────────────────────

fn ward_terminal(host: &str) -> ClientContext {
    ClientContext {
        ip_address: Some("10.20.3.14".to_string()),
        user_agent: Some(format!("ClinicalWorkstation/4.2 ({})", host)),
        session_id: Some(format!("sess-{}", host)),
    }
}

fn external_client(ip: &str) -> ClientContext {
    ClientContext {
        ip_address: Some(ip.to_string()),
        user_agent: Some("curl/8.5.0".to_string()),
        session_id: None,
    }
}
