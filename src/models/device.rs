//! Modelo de Device
//!
//! Los devices se migran en un paso previo; el motor de certificados solo
//! los consulta por número de ECU y, si corresponde, actualiza su estado
//! de bloqueo.

use sqlx::FromRow;

/// Device ya existente en destino, precargado al cache por ECU
#[derive(Debug, Clone, FromRow)]
pub struct DestinationDevice {
    pub id: i64,
    pub ecu_number: String,
    pub blocked: bool,
}
