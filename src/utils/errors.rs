//! Sistema de manejo de errores
//!
//! Este módulo define la taxonomía de errores del motor de migración.
//! Los errores a nivel de registro se capturan en el orquestador y se
//! convierten en un outcome `Failed`; nunca abortan la corrida completa.

use thiserror::Error;

/// Errores principales del motor de migración
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Una entidad dependiente obligatoria (device, customer) no tiene
    /// mapping de destino y el resolver no está autorizado a fabricarla.
    #[error("UnresolvedReference:{entity} ({key})")]
    UnresolvedReference { entity: &'static str, key: String },

    /// Campos malformados o ausentes que el transformer no puede tolerar.
    #[error("TransformError: {0}")]
    Transform(String),

    /// Fallo de escritura/lectura en el store de destino u origen.
    #[error("StoreError: {0}")]
    Store(String),

    /// Fallo de I/O o serialización en los archivos de mapping.
    #[error("MappingError: {0}")]
    Mapping(String),

    /// Configuración inválida o incompleta.
    #[error("ConfigError: {0}")]
    Config(String),
}

impl MigrationError {
    /// Razón corta para el reporte, con la forma `UnresolvedReference:customer`
    pub fn reason(&self) -> String {
        match self {
            MigrationError::UnresolvedReference { entity, .. } => {
                format!("UnresolvedReference:{}", entity)
            }
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for MigrationError {
    fn from(e: sqlx::Error) -> Self {
        MigrationError::Store(e.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(e: std::io::Error) -> Self {
        MigrationError::Mapping(e.to_string())
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(e: serde_json::Error) -> Self {
        MigrationError::Mapping(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_reference_reason() {
        let err = MigrationError::UnresolvedReference {
            entity: "customer",
            key: "42".to_string(),
        };
        assert_eq!(err.reason(), "UnresolvedReference:customer");
        assert_eq!(err.to_string(), "UnresolvedReference:customer (42)");
    }

    #[test]
    fn test_transform_reason_includes_detail() {
        let err = MigrationError::Transform("missing expiry_date".to_string());
        assert_eq!(err.reason(), "TransformError: missing expiry_date");
    }
}
