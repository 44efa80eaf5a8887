//! Report Builder
//!
//! Acumula los outcomes por registro en dos secuencias ordenadas
//! (migrated / unmigrated) y las vuelca a un sink externo. El artefacto
//! estándar son dos hojas tabulares para auditoría manual.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::utils::errors::MigrationError;

/// Estado final de un registro procesado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Migrated,
    Skipped,
    Failed,
}

/// Resultado por registro, con los campos denormalizados útiles para
/// auditar a mano
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub source_id: i64,
    pub ecu: String,
    pub destination_id: Option<i64>,
    pub status: OutcomeStatus,
    pub reason: Option<String>,
    pub warnings: Vec<String>,
    pub customer_email: Option<String>,
    pub vehicle_chassis: String,
}

/// Hoja que el sink externo sabe renderizar
#[async_trait]
pub trait ReportSink {
    async fn write_sheet(
        &mut self,
        name: &str,
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Result<(), MigrationError>;
}

/// Acumulador de outcomes de la corrida
#[derive(Default)]
pub struct ReportBuilder {
    migrated: Vec<MigrationOutcome>,
    unmigrated: Vec<MigrationOutcome>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar un outcome preservando el orden de procesamiento dentro
    /// de cada secuencia
    pub fn push(&mut self, outcome: MigrationOutcome) {
        match outcome.status {
            OutcomeStatus::Migrated => self.migrated.push(outcome),
            OutcomeStatus::Skipped | OutcomeStatus::Failed => self.unmigrated.push(outcome),
        }
    }

    pub fn migrated_count(&self) -> usize {
        self.migrated.len()
    }

    pub fn failed_count(&self) -> usize {
        self.unmigrated
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.unmigrated
            .iter()
            .filter(|o| o.status == OutcomeStatus::Skipped)
            .count()
    }

    pub fn migrated(&self) -> &[MigrationOutcome] {
        &self.migrated
    }

    pub fn unmigrated(&self) -> &[MigrationOutcome] {
        &self.unmigrated
    }

    /// Volcar las dos hojas al sink
    pub async fn render(&self, sink: &mut dyn ReportSink) -> Result<(), MigrationError> {
        let migrated_rows: Vec<Vec<String>> = self
            .migrated
            .iter()
            .map(|o| {
                vec![
                    o.source_id.to_string(),
                    o.ecu.clone(),
                    o.destination_id.map(|id| id.to_string()).unwrap_or_default(),
                    o.customer_email.clone().unwrap_or_default(),
                    o.vehicle_chassis.clone(),
                    o.warnings.join("; "),
                ]
            })
            .collect();
        sink.write_sheet(
            "migrated",
            &[
                "source_id",
                "ecu",
                "destination_id",
                "customer_email",
                "vehicle_chassis",
                "warnings",
            ],
            &migrated_rows,
        )
        .await?;

        let unmigrated_rows: Vec<Vec<String>> = self
            .unmigrated
            .iter()
            .map(|o| {
                vec![
                    o.source_id.to_string(),
                    o.ecu.clone(),
                    o.reason.clone().unwrap_or_default(),
                    o.customer_email.clone().unwrap_or_default(),
                    o.vehicle_chassis.clone(),
                    o.warnings.join("; "),
                ]
            })
            .collect();
        sink.write_sheet(
            "unmigrated",
            &[
                "source_id",
                "ecu",
                "reason",
                "customer_email",
                "vehicle_chassis",
                "warnings",
            ],
            &unmigrated_rows,
        )
        .await?;

        Ok(())
    }
}

/// Sink CSV: una hoja por archivo bajo el directorio de reportes
pub struct CsvReportSink {
    dir: PathBuf,
}

impl CsvReportSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ReportSink for CsvReportSink {
    async fn write_sheet(
        &mut self,
        name: &str,
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Result<(), MigrationError> {
        // El CSV se serializa en memoria; el archivo se escribe con
        // tokio::fs para no bloquear el runtime
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(headers)
            .map_err(|e| MigrationError::Store(format!("Error writing report: {}", e)))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| MigrationError::Store(format!("Error writing report: {}", e)))?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| MigrationError::Store(format!("Error flushing report: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MigrationError::Store(format!("Error creating report dir: {}", e)))?;
        let path = self.dir.join(format!("{}.csv", name));
        tokio::fs::write(&path, buffer)
            .await
            .map_err(|e| MigrationError::Store(format!("Error writing report {}: {}", name, e)))?;

        info!("📊 Hoja '{}' escrita: {} filas ({})", name, rows.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: i64, status: OutcomeStatus, reason: Option<&str>) -> MigrationOutcome {
        MigrationOutcome {
            source_id: id,
            ecu: format!("ECU-{}", id),
            destination_id: matches!(status, OutcomeStatus::Migrated).then_some(id + 1000),
            status,
            reason: reason.map(|r| r.to_string()),
            warnings: Vec::new(),
            customer_email: None,
            vehicle_chassis: format!("CH-{}", id),
        }
    }

    #[test]
    fn test_outcomes_route_to_sheets_in_order() {
        let mut report = ReportBuilder::new();
        report.push(outcome(1, OutcomeStatus::Migrated, None));
        report.push(outcome(2, OutcomeStatus::Failed, Some("UnresolvedReference:customer")));
        report.push(outcome(3, OutcomeStatus::Migrated, None));
        report.push(outcome(4, OutcomeStatus::Skipped, Some("skipped by operator")));

        assert_eq!(report.migrated_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.migrated()[0].source_id, 1);
        assert_eq!(report.migrated()[1].source_id, 3);
        assert_eq!(report.unmigrated()[0].source_id, 2);
        assert_eq!(report.unmigrated()[1].source_id, 4);
    }

    #[tokio::test]
    async fn test_csv_sink_writes_both_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportBuilder::new();
        report.push(outcome(1, OutcomeStatus::Migrated, None));
        let mut failed = outcome(2, OutcomeStatus::Failed, Some("TransformError: missing expiry"));
        failed.warnings.push("vehicle descriptor missing".to_string());
        report.push(failed);

        let mut sink = CsvReportSink::new(dir.path());
        report.render(&mut sink).await.unwrap();

        let migrated = std::fs::read_to_string(dir.path().join("migrated.csv")).unwrap();
        assert!(migrated.contains("ECU-1"));
        assert!(migrated.contains("1001"));

        let unmigrated = std::fs::read_to_string(dir.path().join("unmigrated.csv")).unwrap();
        assert!(unmigrated.contains("ECU-2"));
        assert!(unmigrated.contains("TransformError"));
        assert!(unmigrated.contains("vehicle descriptor missing"));
    }
}
