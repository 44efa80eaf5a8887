//! Migration Orchestrator
//!
//! Máquina de estados por certificado: Pending -> Migrated | Skipped |
//! Failed (Migrating es transitorio, no se persiste). Dos estrategias
//! comparten la misma lógica por registro: el modo secuencial supervisado
//! por un operador y el modo batch con pool de workers.
//!
//! El fallo de un registro nunca aborta la corrida; la reanudación entre
//! corridas la da el mapping de certificados, no reintentos.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::cache::EntityCache;
use crate::mapping::{EntityType, MappingStore};
use crate::models::SourceCertificate;
use crate::repositories::{DestinationStore, SourceStore};
use crate::services::report::{MigrationOutcome, OutcomeStatus, ReportBuilder};
use crate::services::resolvers::{ReferenceResolvers, TechnicianRole};
use crate::services::transformer::{transform, ResolvedReferences};
use crate::utils::errors::MigrationError;

/// Decisión del operador frente a un registro (modo secuencial)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorChoice {
    Migrate,
    Skip,
    Exit,
}

/// Capacidad de decisión inyectada al orquestador: un prompt real en
/// producción, un stub en tests
pub trait OperatorDecision: Send + Sync {
    fn decide(&self, record: &SourceCertificate) -> OperatorChoice;
}

/// Resumen de una corrida
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub exited_early: bool,
}

/// Orquestador de la migración de certificados
#[derive(Clone)]
pub struct MigrationEngine {
    source: Arc<dyn SourceStore>,
    dest: Arc<dyn DestinationStore>,
    cache: Arc<EntityCache>,
    mappings: Arc<MappingStore>,
    resolvers: ReferenceResolvers,
    report: Arc<Mutex<ReportBuilder>>,
    default_user_id: i64,
}

impl MigrationEngine {
    pub fn new(
        source: Arc<dyn SourceStore>,
        dest: Arc<dyn DestinationStore>,
        cache: Arc<EntityCache>,
        mappings: Arc<MappingStore>,
        report: Arc<Mutex<ReportBuilder>>,
        default_user_id: i64,
    ) -> Self {
        let resolvers = ReferenceResolvers::new(
            Arc::clone(&source),
            Arc::clone(&dest),
            Arc::clone(&cache),
            Arc::clone(&mappings),
            default_user_id,
        );
        Self {
            source,
            dest,
            cache,
            mappings,
            resolvers,
            report,
            default_user_id,
        }
    }

    pub fn report(&self) -> Arc<Mutex<ReportBuilder>> {
        Arc::clone(&self.report)
    }

    /// Certificados legacy cuyo id no está en el mapping de certificados,
    /// opcionalmente filtrados a un solo ECU para reprocesos puntuales
    pub async fn list_unmigrated_certificates(
        &self,
        ecu_filter: Option<&str>,
    ) -> Result<Vec<SourceCertificate>, MigrationError> {
        let all = self.source.fetch_certificates(ecu_filter).await?;
        let total = all.len();

        let mut pending = Vec::new();
        for record in all {
            if !self
                .mappings
                .contains(EntityType::Certificate, &record.id.to_string())
                .await
            {
                pending.push(record);
            }
        }

        info!(
            "📋 Set de trabajo: {} certificados sin migrar de {} totales",
            pending.len(),
            total
        );
        Ok(pending)
    }

    /// Lógica por registro: resolver dependencias, transformar, insertar.
    ///
    /// Orden fijo dentro del registro: device -> customer -> técnicos ->
    /// vehículo -> transform -> insert del certificado -> mapping. Un
    /// vehículo o técnico ya creado no se revierte si un paso posterior
    /// falla (comportamiento heredado, sin transacción que abarque la
    /// secuencia completa). Las warnings se acumulan en el buffer del
    /// caller y sobreviven también cuando el registro termina en error.
    async fn migrate_record(
        &self,
        record: &SourceCertificate,
        warnings: &mut Vec<String>,
    ) -> Result<i64, MigrationError> {
        let device_id = self.resolvers.resolve_device(record).await?;
        let customer_id = self.resolvers.resolve_customer(record).await?;
        let calibration_technician_id = self
            .resolvers
            .resolve_technician(
                TechnicianRole::Calibration,
                record.caliberater_technician_id,
                record.caliberater_user_id,
            )
            .await?;
        let installation_technician_id = self
            .resolvers
            .resolve_technician(
                TechnicianRole::Installation,
                record.installer_technician_id,
                record.installer_user_id,
            )
            .await?;
        let vehicle_id = self.resolvers.resolve_vehicle(record, warnings).await?;

        let refs = ResolvedReferences {
            device_id,
            customer_id,
            calibration_technician_id,
            installation_technician_id,
            vehicle_id,
            dealer_id: self.default_user_id,
            user_id: self.default_user_id,
        };
        let payload = transform(record, &refs, warnings)?;

        // El insert del certificado es el último paso con efectos: todo
        // fallo anterior aborta sin dejar fila parcial de certificado
        let certificate_id = self.dest.insert_certificate(&payload).await?;

        self.mappings
            .put(EntityType::Certificate, record.id.to_string(), certificate_id)
            .await;
        self.mappings.persist(EntityType::Certificate).await?;

        // Back-reference del vehículo; el certificado ya quedó migrado,
        // un fallo acá degrada a warning
        if let Some(vehicle_id) = vehicle_id {
            if let Err(e) = self
                .dest
                .link_vehicle_certificate(vehicle_id, certificate_id)
                .await
            {
                warn!(
                    "⚠️ Certificado {} migrado pero sin back-reference de vehículo: {}",
                    record.id, e
                );
                warnings.push(format!("vehicle back-reference failed: {}", e));
            }
        }

        Ok(certificate_id)
    }

    /// Procesar un registro aislando su fallo y registrando el outcome
    async fn process_record(&self, record: SourceCertificate) {
        let customer_email = match self
            .mappings
            .get(EntityType::Customer, &record.customer_id.to_string())
            .await
        {
            Some(id) => self.cache.customer_email(id).await,
            None => None,
        };

        let mut warnings = Vec::new();
        let outcome = match self.migrate_record(&record, &mut warnings).await {
            Ok(destination_id) => {
                info!(
                    "✅ Certificado {} (ECU {}) migrado -> id {}",
                    record.id, record.ecu, destination_id
                );
                MigrationOutcome {
                    source_id: record.id,
                    ecu: record.ecu.clone(),
                    destination_id: Some(destination_id),
                    status: OutcomeStatus::Migrated,
                    reason: None,
                    warnings,
                    customer_email,
                    vehicle_chassis: record.vehicle_chassis.clone(),
                }
            }
            Err(e) => {
                error!(
                    "❌ Certificado {} (ECU {}) falló: {}",
                    record.id, record.ecu, e
                );
                // Las warnings previas al error quedan en el reporte
                MigrationOutcome {
                    source_id: record.id,
                    ecu: record.ecu.clone(),
                    destination_id: None,
                    status: OutcomeStatus::Failed,
                    reason: Some(e.reason()),
                    warnings,
                    customer_email,
                    vehicle_chassis: record.vehicle_chassis.clone(),
                }
            }
        };

        self.report.lock().await.push(outcome);
    }

    async fn counts(&self) -> (usize, usize, usize) {
        let report = self.report.lock().await;
        (
            report.migrated_count(),
            report.failed_count(),
            report.skipped_count(),
        )
    }

    /// Modo secuencial supervisado: una decisión del operador por registro.
    ///
    /// `Exit` corta el loop sin tratar lo restante como fallido; lo ya
    /// migrado no se revierte.
    pub async fn run_sequential(
        &self,
        operator: &dyn OperatorDecision,
        ecu_filter: Option<&str>,
    ) -> Result<RunSummary, MigrationError> {
        let records = self.list_unmigrated_certificates(ecu_filter).await?;
        let (migrated0, failed0, skipped0) = self.counts().await;

        let mut processed = 0;
        let mut exited_early = false;

        for record in records {
            match operator.decide(&record) {
                OperatorChoice::Migrate => {
                    processed += 1;
                    self.process_record(record).await;
                }
                OperatorChoice::Skip => {
                    processed += 1;
                    info!("⏭️ Certificado {} (ECU {}) salteado por el operador", record.id, record.ecu);
                    self.report.lock().await.push(MigrationOutcome {
                        source_id: record.id,
                        ecu: record.ecu.clone(),
                        destination_id: None,
                        status: OutcomeStatus::Skipped,
                        reason: Some("skipped by operator".to_string()),
                        warnings: Vec::new(),
                        customer_email: None,
                        vehicle_chassis: record.vehicle_chassis.clone(),
                    });
                }
                OperatorChoice::Exit => {
                    info!("🛑 Migración interrumpida por el operador");
                    exited_early = true;
                    break;
                }
            }
        }

        self.mappings.persist_all().await?;
        let (migrated1, failed1, skipped1) = self.counts().await;
        Ok(RunSummary {
            processed,
            migrated: migrated1 - migrated0,
            failed: failed1 - failed0,
            skipped: skipped1 - skipped0,
            exited_early,
        })
    }

    /// Modo batch: N workers consumen de una cola FIFO compartida.
    ///
    /// No hay garantía de orden de finalización entre registros; el orden
    /// solo es fijo dentro de la cadena de dependencias de cada uno. No
    /// hay cancelación a mitad de corrida: los workers drenan la cola.
    pub async fn run_batch(
        &self,
        worker_count: usize,
        ecu_filter: Option<&str>,
    ) -> Result<RunSummary, MigrationError> {
        let records = self.list_unmigrated_certificates(ecu_filter).await?;
        let total = records.len();
        let (migrated0, failed0, skipped0) = self.counts().await;

        let queue: Arc<Mutex<VecDeque<SourceCertificate>>> =
            Arc::new(Mutex::new(records.into()));

        let worker_count = worker_count.max(1);
        info!("🚀 Modo batch: {} workers sobre {} certificados", worker_count, total);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let engine = self.clone();
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                loop {
                    let next = { queue.lock().await.pop_front() };
                    match next {
                        Some(record) => engine.process_record(record).await,
                        None => break,
                    }
                }
                tracing::debug!("🏁 Worker {} sin más trabajo", worker_id);
            }));
        }

        for handle in futures::future::join_all(handles).await {
            if let Err(e) = handle {
                error!("❌ Worker abortó: {}", e);
            }
        }

        self.mappings.persist_all().await?;
        let (migrated1, failed1, skipped1) = self.counts().await;
        Ok(RunSummary {
            processed: total,
            migrated: migrated1 - migrated0,
            failed: failed1 - failed0,
            skipped: skipped1 - skipped0,
            exited_early: false,
        })
    }
}
