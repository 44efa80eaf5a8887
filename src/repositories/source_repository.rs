//! Repositorio del esquema legacy (solo lectura)

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{SourceCertificate, SourceTechnician, SourceUser};
use crate::repositories::SourceStore;
use crate::utils::errors::MigrationError;

pub struct SqlSourceStore {
    pool: PgPool,
}

impl SqlSourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceStore for SqlSourceStore {
    async fn fetch_certificates(
        &self,
        ecu_filter: Option<&str>,
    ) -> Result<Vec<SourceCertificate>, MigrationError> {
        let certificates = match ecu_filter {
            Some(ecu) => {
                sqlx::query_as::<_, SourceCertificate>(
                    "SELECT * FROM certificate_record WHERE ecu = $1 ORDER BY id",
                )
                .bind(ecu)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, SourceCertificate>(
                    "SELECT * FROM certificate_record ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| MigrationError::Store(format!("Error fetching certificates: {}", e)))?;

        Ok(certificates)
    }

    async fn fetch_technician(
        &self,
        id: i64,
    ) -> Result<Option<SourceTechnician>, MigrationError> {
        let technician = sqlx::query_as::<_, SourceTechnician>(
            "SELECT id, technician_name, technician_phone, technician_email, user_id \
             FROM technician_master WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error fetching technician {}: {}", id, e)))?;

        Ok(technician)
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<SourceUser>, MigrationError> {
        let user = sqlx::query_as::<_, SourceUser>(
            "SELECT id, full_name, email, phone FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error fetching user {}: {}", id, e)))?;

        Ok(user)
    }
}
