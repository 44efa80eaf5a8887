//! Services module
//!
//! Este módulo contiene la lógica de negocio de la migración: resolvers
//! de referencias, transformer puro, orquestador y reporte.

pub mod orchestrator;
pub mod report;
pub mod resolvers;
pub mod transformer;

pub use orchestrator::{MigrationEngine, OperatorChoice, OperatorDecision, RunSummary};
pub use report::{CsvReportSink, MigrationOutcome, OutcomeStatus, ReportBuilder, ReportSink};
pub use resolvers::{ReferenceResolvers, TechnicianRole};
pub use transformer::{derive_status, parse_speed, transform, ResolvedReferences};
