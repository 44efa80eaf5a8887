//! Modelos de Technician

use sqlx::FromRow;

/// Fila `technician_master` del esquema legacy
#[derive(Debug, Clone, FromRow)]
pub struct SourceTechnician {
    pub id: i64,
    pub technician_name: String,
    pub technician_phone: Option<String>,
    pub technician_email: String,
    pub user_id: i64,
}

/// Técnico ya existente en destino
#[derive(Debug, Clone, FromRow)]
pub struct DestinationTechnician {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_id: i64,
}

/// Payload de inserción para la tabla `technicians` de destino
#[derive(Debug, Clone)]
pub struct NewTechnician {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// User de destino asociado (par user+technician)
    pub user_id: i64,
    /// Usuario administrador que corre la migración
    pub created_by: i64,
}
