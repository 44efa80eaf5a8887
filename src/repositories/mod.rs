//! Acceso a datos tipado
//!
//! Los traits de este módulo son la costura entre el motor y las bases:
//! el orquestador y los resolvers solo hablan con `SourceStore` y
//! `DestinationStore`, así los tests los reemplazan por fakes en memoria
//! sin tocar la lógica de migración.

pub mod destination_repository;
pub mod source_repository;

use async_trait::async_trait;

use crate::models::{
    DestinationCustomer, DestinationDevice, DestinationTechnician, DestinationUser,
    NewCertificate, NewTechnician, NewUser, NewVehicle, SourceCertificate, SourceTechnician,
    SourceUser,
};
use crate::utils::errors::MigrationError;

pub use destination_repository::SqlDestinationStore;
pub use source_repository::SqlSourceStore;

/// Lecturas tipadas sobre el esquema legacy (nunca escribe)
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Todos los certificate_record, opcionalmente filtrados a un ECU
    async fn fetch_certificates(
        &self,
        ecu_filter: Option<&str>,
    ) -> Result<Vec<SourceCertificate>, MigrationError>;

    async fn fetch_technician(
        &self,
        id: i64,
    ) -> Result<Option<SourceTechnician>, MigrationError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<SourceUser>, MigrationError>;
}

/// Escrituras tipadas sobre el esquema de destino, más las lecturas de
/// precarga del Entity Cache
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DestinationDevice>, MigrationError>;
    async fn list_customers(&self) -> Result<Vec<DestinationCustomer>, MigrationError>;
    async fn list_users(&self) -> Result<Vec<DestinationUser>, MigrationError>;
    async fn list_technicians(&self) -> Result<Vec<DestinationTechnician>, MigrationError>;

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DestinationUser>, MigrationError>;

    async fn insert_user(&self, user: &NewUser) -> Result<i64, MigrationError>;
    async fn insert_technician(&self, technician: &NewTechnician) -> Result<i64, MigrationError>;
    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<i64, MigrationError>;
    async fn insert_certificate(&self, certificate: &NewCertificate)
        -> Result<i64, MigrationError>;

    /// Actualización de estado de bloqueo de un device ya migrado
    async fn set_device_blocked(
        &self,
        device_id: i64,
        blocked: bool,
    ) -> Result<(), MigrationError>;

    /// Back-reference del vehículo fabricado hacia su certificado
    async fn link_vehicle_certificate(
        &self,
        vehicle_id: i64,
        certificate_id: i64,
    ) -> Result<(), MigrationError>;
}
