//! Modelos de Certificate
//!
//! Fila legacy `certificate_record` (nunca se muta) y payload de inserción
//! para la tabla `certificates` de destino. Los timestamps legacy son naive
//! en hora local UAE; el payload de destino ya viene normalizado a UTC por
//! el transformer.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fila del certificado en el esquema legacy
#[derive(Debug, Clone, FromRow)]
pub struct SourceCertificate {
    pub id: i64,
    pub serialno: Option<i64>,
    /// Número de ECU del equipo (clave natural del device)
    pub ecu: String,
    pub customer_id: i64,
    pub installer_user_id: i64,
    pub caliberater_user_id: i64,
    pub installer_technician_id: i64,
    pub caliberater_technician_id: i64,
    /// Descriptor libre "marca modelo..." del vehículo
    pub vehicle_type: String,
    pub vehicle_registration: String,
    pub vehicle_chassis: String,
    /// Campo de texto libre, p.ej. "120 km/h"
    pub speed: String,
    pub kilometer: Option<i32>,
    pub date_actual_installation: Option<NaiveDateTime>,
    pub date_installation: Option<NaiveDateTime>,
    pub date_calibrate: Option<NaiveDateTime>,
    pub date_expiry: Option<NaiveDateTime>,
    pub renewal_count: i32,
    pub dealer_id: i64,
    pub print_count: i32,
    /// 0 = equipo bloqueado
    pub activstate: i32,
    pub description: Option<String>,
    pub date_cancelation: Option<NaiveDateTime>,
}

/// Estado del certificado en destino - mapea al ENUM de la tabla
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Active,
    Renewed,
    Nullified,
    Cancelled,
    Blocked,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "active",
            CertificateStatus::Renewed => "renewed",
            CertificateStatus::Nullified => "nullified",
            CertificateStatus::Cancelled => "cancelled",
            CertificateStatus::Blocked => "blocked",
        }
    }
}

/// Payload de inserción para la tabla `certificates` de destino
#[derive(Debug, Clone, Serialize)]
pub struct NewCertificate {
    pub serial_number: Option<i64>,
    pub status: CertificateStatus,
    pub device_id: i64,
    pub installation_date: DateTime<Utc>,
    pub calibration_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancelled: bool,
    /// Técnico de instalación
    pub installed_by_id: i64,
    /// Técnico de calibración
    pub calibrated_by_id: i64,
    /// Cliente destino
    pub installed_for_id: i64,
    pub vehicle_id: Option<i64>,
    pub km_reading: i32,
    pub speed_limit: Option<i32>,
    pub print_count: i32,
    pub renewal_count: i32,
    pub description: Option<String>,
    pub country: String,
    pub dealer_id: i64,
    pub user_id: i64,
}
