//! Binario del motor de migración de certificados

use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use dotenvy::dotenv;
use tokio::sync::Mutex;
use tracing::{error, info};

use cms_migrator::cache::EntityCache;
use cms_migrator::config::EnvironmentConfig;
use cms_migrator::database::DatabaseConnections;
use cms_migrator::mapping::MappingStore;
use cms_migrator::models::SourceCertificate;
use cms_migrator::repositories::{
    DestinationStore, SqlDestinationStore, SqlSourceStore,
};
use cms_migrator::services::{
    CsvReportSink, MigrationEngine, OperatorChoice, OperatorDecision, ReportBuilder,
};

/// Prompt real de operador para el modo uno-por-uno
struct ConsoleOperator;

impl OperatorDecision for ConsoleOperator {
    fn decide(&self, record: &SourceCertificate) -> OperatorChoice {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Certificado {} (ECU {}):", record.id, record.ecu))
            .items(&["Migrar certificado", "Saltear certificado", "Salir de la migración"])
            .default(0)
            .interact();

        match selection {
            Ok(0) => OperatorChoice::Migrate,
            Ok(1) => OperatorChoice::Skip,
            _ => OperatorChoice::Exit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("🛂 CMS Migrator - Migración de certificados");
    info!("===========================================");

    let config = EnvironmentConfig::from_env();

    let connections = match DatabaseConnections::connect(
        &config.source_database_url,
        &config.dest_database_url,
    )
    .await
    {
        Ok(conns) => conns,
        Err(e) => {
            error!("❌ Error conectando a las bases de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let source = Arc::new(SqlSourceStore::new(connections.source.clone()));
    let dest = Arc::new(SqlDestinationStore::new(connections.dest.clone()));

    // Usuario administrador de destino: dealer/user por defecto y
    // created_by de los técnicos fabricados
    let default_user = dest
        .find_user_by_email(&config.default_user_email)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .with_context(|| {
            format!("Default user {} not found in destination", config.default_user_email)
        })?;
    info!("👤 Usuario por defecto: {} (id {})", default_user.email, default_user.id);

    // Mappings durables + cache de entidades de destino
    let mappings = Arc::new(MappingStore::new(&config.mapping_dir));
    mappings.load_all().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    let cache = Arc::new(EntityCache::new());
    cache
        .preload(dest.as_ref() as &dyn DestinationStore)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let report = Arc::new(Mutex::new(ReportBuilder::new()));
    let engine = MigrationEngine::new(
        source,
        dest,
        cache,
        Arc::clone(&mappings),
        Arc::clone(&report),
        default_user.id,
    );

    let mode = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Elegir modo de migración:")
        .items(&["Corrida batch automática", "Migrar certificados uno por uno"])
        .default(0)
        .interact()?;

    let ecu_filter = config.ecu_filter.as_deref();
    let summary = match mode {
        0 => engine.run_batch(config.worker_count, ecu_filter).await,
        _ => engine.run_sequential(&ConsoleOperator, ecu_filter).await,
    }
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("📈 Resumen de la corrida:");
    info!("   Procesados: {}", summary.processed);
    info!("   Migrados: {}", summary.migrated);
    info!("   Fallidos: {}", summary.failed);
    info!("   Salteados: {}", summary.skipped);
    if summary.exited_early {
        info!("   (corte anticipado por el operador)");
    }

    let mut sink = CsvReportSink::new(&config.report_dir);
    report
        .lock()
        .await
        .render(&mut sink)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("👋 Migración terminada");
    Ok(())
}
