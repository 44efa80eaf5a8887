//! Certificate Transformer
//!
//! Transformación pura de un certificado legacy más sus referencias ya
//! resueltas en el payload de destino. No hace I/O: toda la resolución
//! ocurre antes, en los resolvers.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{CertificateStatus, NewCertificate, SourceCertificate};
use crate::utils::errors::MigrationError;
use crate::utils::time::{uae_to_utc, uae_to_utc_opt};

/// Referencias de destino ya resueltas para un certificado
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    pub device_id: i64,
    pub customer_id: i64,
    pub calibration_technician_id: i64,
    pub installation_technician_id: i64,
    pub vehicle_id: Option<i64>,
    /// Dealer/user por defecto del destino
    pub dealer_id: i64,
    pub user_id: i64,
}

/// Tabla de precedencia de estados, de mayor a menor.
///
/// El primer predicado que aplica decide el estado; sin coincidencias el
/// certificado queda activo. Mantener la política acá, como datos, y no
/// repartida en branches.
static STATUS_PRECEDENCE: &[(CertificateStatus, fn(&SourceCertificate) -> bool)] = &[
    (CertificateStatus::Blocked, |r| r.activstate == 0),
    (CertificateStatus::Cancelled, |r| r.date_cancelation.is_some()),
    (CertificateStatus::Nullified, |r| r.serialno.is_none()),
    (CertificateStatus::Renewed, |r| r.renewal_count > 0),
];

/// Derivar el estado de destino según la tabla de precedencia
pub fn derive_status(record: &SourceCertificate) -> CertificateStatus {
    STATUS_PRECEDENCE
        .iter()
        .find(|(_, applies)| applies(record))
        .map(|(status, _)| *status)
        .unwrap_or(CertificateStatus::Active)
}

/// Extraer la componente numérica inicial de un campo de velocidad libre.
///
/// `"120 km/h"` -> `Some(120)`, `"95"` -> `Some(95)`, `"fast"` -> `None`.
pub fn parse_speed(raw: &str) -> Option<i32> {
    static LEADING_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_NUMBER.get_or_init(|| Regex::new(r"^\s*(\d+)").expect("valid speed regex"));
    re.captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Transformar un certificado legacy en el payload de destino.
///
/// Fechas legacy en hora local UAE se normalizan a UTC; velocidad o
/// kilometraje ausentes degradan con warning, las fechas obligatorias
/// ausentes son `TransformError`.
pub fn transform(
    record: &SourceCertificate,
    refs: &ResolvedReferences,
    warnings: &mut Vec<String>,
) -> Result<NewCertificate, MigrationError> {
    let installation_local = record
        .date_installation
        .or(record.date_actual_installation)
        .ok_or_else(|| MigrationError::Transform("missing installation date".to_string()))?;
    let calibration_local = record
        .date_calibrate
        .ok_or_else(|| MigrationError::Transform("missing calibration date".to_string()))?;
    let expiry_local = record
        .date_expiry
        .ok_or_else(|| MigrationError::Transform("missing expiry date".to_string()))?;

    let speed_limit = parse_speed(&record.speed);
    if speed_limit.is_none() {
        warnings.push(format!("speed not parseable: '{}'", record.speed));
    }
    if record.kilometer.is_none() {
        warnings.push("km reading missing, defaulted to 0".to_string());
    }

    Ok(NewCertificate {
        serial_number: record.serialno,
        status: derive_status(record),
        device_id: refs.device_id,
        installation_date: uae_to_utc(installation_local),
        calibration_date: uae_to_utc(calibration_local),
        expiry_date: uae_to_utc(expiry_local),
        cancellation_date: uae_to_utc_opt(record.date_cancelation),
        cancelled: record.date_cancelation.is_some(),
        installed_by_id: refs.installation_technician_id,
        calibrated_by_id: refs.calibration_technician_id,
        installed_for_id: refs.customer_id,
        vehicle_id: refs.vehicle_id,
        km_reading: record.kilometer.unwrap_or(0),
        speed_limit,
        print_count: record.print_count,
        renewal_count: record.renewal_count,
        description: record.description.clone(),
        country: "UAE".to_string(),
        dealer_id: refs.dealer_id,
        user_id: refs.user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn local(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn base_record() -> SourceCertificate {
        SourceCertificate {
            id: 1,
            serialno: Some(5001),
            ecu: "ECU-100".to_string(),
            customer_id: 7,
            installer_user_id: 20,
            caliberater_user_id: 21,
            installer_technician_id: 30,
            caliberater_technician_id: 31,
            vehicle_type: "Toyota Land Cruiser".to_string(),
            vehicle_registration: "DXB-1234".to_string(),
            vehicle_chassis: "CH-0001".to_string(),
            speed: "120 km/h".to_string(),
            kilometer: Some(45000),
            date_actual_installation: Some(local(2023, 5, 1, 9)),
            date_installation: Some(local(2023, 5, 2, 9)),
            date_calibrate: Some(local(2023, 5, 2, 10)),
            date_expiry: Some(local(2024, 5, 2, 10)),
            renewal_count: 0,
            dealer_id: 3,
            print_count: 1,
            activstate: 1,
            description: None,
            date_cancelation: None,
        }
    }

    fn refs() -> ResolvedReferences {
        ResolvedReferences {
            device_id: 100,
            customer_id: 200,
            calibration_technician_id: 300,
            installation_technician_id: 301,
            vehicle_id: Some(400),
            dealer_id: 1,
            user_id: 1,
        }
    }

    #[test]
    fn test_status_default_active() {
        assert_eq!(derive_status(&base_record()), CertificateStatus::Active);
    }

    #[test]
    fn test_status_single_flags() {
        let mut renewed = base_record();
        renewed.renewal_count = 2;
        assert_eq!(derive_status(&renewed), CertificateStatus::Renewed);

        let mut nullified = base_record();
        nullified.serialno = None;
        assert_eq!(derive_status(&nullified), CertificateStatus::Nullified);

        let mut cancelled = base_record();
        cancelled.date_cancelation = Some(local(2024, 1, 1, 0));
        assert_eq!(derive_status(&cancelled), CertificateStatus::Cancelled);

        let mut blocked = base_record();
        blocked.activstate = 0;
        assert_eq!(derive_status(&blocked), CertificateStatus::Blocked);
    }

    #[test]
    fn test_status_pairwise_precedence() {
        // blocked > cancelled
        let mut r = base_record();
        r.activstate = 0;
        r.date_cancelation = Some(local(2024, 1, 1, 0));
        assert_eq!(derive_status(&r), CertificateStatus::Blocked);

        // blocked > nullified
        let mut r = base_record();
        r.activstate = 0;
        r.serialno = None;
        assert_eq!(derive_status(&r), CertificateStatus::Blocked);

        // blocked > renewed
        let mut r = base_record();
        r.activstate = 0;
        r.renewal_count = 1;
        assert_eq!(derive_status(&r), CertificateStatus::Blocked);

        // cancelled > nullified
        let mut r = base_record();
        r.date_cancelation = Some(local(2024, 1, 1, 0));
        r.serialno = None;
        assert_eq!(derive_status(&r), CertificateStatus::Cancelled);

        // cancelled > renewed
        let mut r = base_record();
        r.date_cancelation = Some(local(2024, 1, 1, 0));
        r.renewal_count = 3;
        assert_eq!(derive_status(&r), CertificateStatus::Cancelled);

        // nullified > renewed
        let mut r = base_record();
        r.serialno = None;
        r.renewal_count = 3;
        assert_eq!(derive_status(&r), CertificateStatus::Nullified);
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("120 km/h"), Some(120));
        assert_eq!(parse_speed("95"), Some(95));
        assert_eq!(parse_speed("fast"), None);
        assert_eq!(parse_speed(""), None);
        assert_eq!(parse_speed("  80km"), Some(80));
    }

    #[test]
    fn test_transform_normalizes_dates_to_utc() {
        let mut record = base_record();
        record.date_installation = Some(local(2024, 1, 1, 12));
        let mut warnings = Vec::new();

        let cert = transform(&record, &refs(), &mut warnings).unwrap();
        // UAE 12:00 es UTC 08:00, resta fija de 4 horas
        assert_eq!(cert.installation_date.naive_utc(), local(2024, 1, 1, 8));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_transform_prefers_date_installation_over_actual() {
        let record = base_record();
        let mut warnings = Vec::new();
        let cert = transform(&record, &refs(), &mut warnings).unwrap();
        assert_eq!(cert.installation_date.naive_utc(), local(2023, 5, 2, 5));
    }

    #[test]
    fn test_transform_missing_expiry_is_error() {
        let mut record = base_record();
        record.date_expiry = None;
        let mut warnings = Vec::new();

        let err = transform(&record, &refs(), &mut warnings).unwrap_err();
        assert!(matches!(err, MigrationError::Transform(_)));
        assert!(err.to_string().contains("expiry"));
    }

    #[test]
    fn test_transform_degrades_speed_and_km_with_warnings() {
        let mut record = base_record();
        record.speed = "fast".to_string();
        record.kilometer = None;
        let mut warnings = Vec::new();

        let cert = transform(&record, &refs(), &mut warnings).unwrap();
        assert_eq!(cert.speed_limit, None);
        assert_eq!(cert.km_reading, 0);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_transform_cancellation_sets_flag_and_date() {
        let mut record = base_record();
        record.date_cancelation = Some(local(2024, 2, 1, 4));
        let mut warnings = Vec::new();

        let cert = transform(&record, &refs(), &mut warnings).unwrap();
        assert!(cert.cancelled);
        assert_eq!(
            cert.cancellation_date.unwrap().naive_utc(),
            local(2024, 2, 1, 0)
        );
        assert_eq!(cert.status, CertificateStatus::Cancelled);
        assert_eq!(cert.country, "UAE");
    }
}
