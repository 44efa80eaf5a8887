//! Repositorio del esquema de destino
//!
//! Lecturas de precarga del cache e inserts tipados. Los ids de destino
//! son secuencias bigint; cada insert devuelve el id generado vía
//! RETURNING.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::{
    DestinationCustomer, DestinationDevice, DestinationTechnician, DestinationUser,
    NewCertificate, NewTechnician, NewUser, NewVehicle,
};
use crate::repositories::DestinationStore;
use crate::utils::errors::MigrationError;

pub struct SqlDestinationStore {
    pool: PgPool,
}

impl SqlDestinationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DestinationStore for SqlDestinationStore {
    async fn list_devices(&self) -> Result<Vec<DestinationDevice>, MigrationError> {
        sqlx::query_as::<_, DestinationDevice>("SELECT id, ecu_number, blocked FROM devices")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::Store(format!("Error listing devices: {}", e)))
    }

    async fn list_customers(&self) -> Result<Vec<DestinationCustomer>, MigrationError> {
        sqlx::query_as::<_, DestinationCustomer>("SELECT id, name, email FROM customers")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::Store(format!("Error listing customers: {}", e)))
    }

    async fn list_users(&self) -> Result<Vec<DestinationUser>, MigrationError> {
        sqlx::query_as::<_, DestinationUser>("SELECT id, name, email, phone FROM users")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::Store(format!("Error listing users: {}", e)))
    }

    async fn list_technicians(&self) -> Result<Vec<DestinationTechnician>, MigrationError> {
        sqlx::query_as::<_, DestinationTechnician>(
            "SELECT id, name, email, phone, user_id FROM technicians",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error listing technicians: {}", e)))
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DestinationUser>, MigrationError> {
        sqlx::query_as::<_, DestinationUser>(
            "SELECT id, name, email, phone FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error finding user {}: {}", email, e)))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i64, MigrationError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, phone, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error creating user: {}", e)))?;

        Ok(id)
    }

    async fn insert_technician(&self, technician: &NewTechnician) -> Result<i64, MigrationError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO technicians (name, email, phone, user_id, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(&technician.name)
        .bind(&technician.email)
        .bind(&technician.phone)
        .bind(technician.user_id)
        .bind(technician.created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error creating technician: {}", e)))?;

        Ok(id)
    }

    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<i64, MigrationError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO vehicles (brand, model, vehicle_no, vehicle_chassis_no, new_registration, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(&vehicle.vehicle_no)
        .bind(&vehicle.vehicle_chassis_no)
        .bind(vehicle.new_registration)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error creating vehicle: {}", e)))?;

        Ok(id)
    }

    async fn insert_certificate(
        &self,
        certificate: &NewCertificate,
    ) -> Result<i64, MigrationError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO certificates (
                serial_number, status, device_id,
                installation_date, calibration_date, expiry_date,
                cancellation_date, cancelled,
                installed_by_id, calibrated_by_id, installed_for_id, vehicle_id,
                km_reading, speed_limit, print_count, renewal_count,
                description, country, dealer_id, user_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $21)
            RETURNING id
            "#,
        )
        .bind(certificate.serial_number)
        .bind(certificate.status.as_str())
        .bind(certificate.device_id)
        .bind(certificate.installation_date)
        .bind(certificate.calibration_date)
        .bind(certificate.expiry_date)
        .bind(certificate.cancellation_date)
        .bind(certificate.cancelled)
        .bind(certificate.installed_by_id)
        .bind(certificate.calibrated_by_id)
        .bind(certificate.installed_for_id)
        .bind(certificate.vehicle_id)
        .bind(certificate.km_reading)
        .bind(certificate.speed_limit)
        .bind(certificate.print_count)
        .bind(certificate.renewal_count)
        .bind(&certificate.description)
        .bind(&certificate.country)
        .bind(certificate.dealer_id)
        .bind(certificate.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MigrationError::Store(format!("Error creating certificate: {}", e)))?;

        Ok(id)
    }

    async fn set_device_blocked(
        &self,
        device_id: i64,
        blocked: bool,
    ) -> Result<(), MigrationError> {
        sqlx::query("UPDATE devices SET blocked = $2, updated_at = $3 WHERE id = $1")
            .bind(device_id)
            .bind(blocked)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::Store(format!("Error updating device block: {}", e)))?;

        Ok(())
    }

    async fn link_vehicle_certificate(
        &self,
        vehicle_id: i64,
        certificate_id: i64,
    ) -> Result<(), MigrationError> {
        sqlx::query("UPDATE vehicles SET certificate_id = $2, updated_at = $3 WHERE id = $1")
            .bind(vehicle_id)
            .bind(certificate_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                MigrationError::Store(format!("Error linking vehicle to certificate: {}", e))
            })?;

        Ok(())
    }
}
