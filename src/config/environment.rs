//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno de la migración.
//! Las URLs de base de datos son obligatorias; el resto tiene defaults
//! razonables para una corrida estándar.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// URL del esquema legacy (solo lectura)
    pub source_database_url: String,
    /// URL del esquema de destino
    pub dest_database_url: String,
    /// Directorio donde viven los archivos de mapping JSON
    pub mapping_dir: String,
    /// Directorio donde se escribe el reporte (migrated/unmigrated)
    pub report_dir: String,
    /// Ancho del pool de workers en modo batch
    pub worker_count: usize,
    /// Email del usuario administrador de destino (dealer/user por defecto
    /// de los certificados migrados)
    pub default_user_email: String,
    /// Filtro opcional por ECU para reprocesar un solo equipo
    pub ecu_filter: Option<String>,
}

impl EnvironmentConfig {
    pub fn from_env() -> Self {
        Self {
            source_database_url: env::var("SOURCE_DATABASE_URL")
                .expect("SOURCE_DATABASE_URL must be set"),
            dest_database_url: env::var("DEST_DATABASE_URL")
                .expect("DEST_DATABASE_URL must be set"),
            mapping_dir: env::var("MAPPING_DIR")
                .unwrap_or_else(|_| "migration_mappings".to_string()),
            report_dir: env::var("REPORT_DIR").unwrap_or_else(|_| ".".to_string()),
            worker_count: env::var("WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            default_user_email: env::var("DEFAULT_USER_EMAIL")
                .expect("DEFAULT_USER_EMAIL must be set"),
            ecu_filter: env::var("ECU_FILTER").ok().filter(|v| !v.trim().is_empty()),
        }
    }
}
