//! Motor de migración de certificados
//!
//! Migra los certificate_record del esquema legacy al esquema CMS
//! rediseñado preservando integridad referencial vía mappings de identidad
//! durables. Reanudable entre corridas y seguro bajo el pool de workers
//! del modo batch.

pub mod cache;
pub mod config;
pub mod database;
pub mod mapping;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
