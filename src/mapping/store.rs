//! Mapping Store
//!
//! Diccionarios durables old id -> new id, uno por tipo de entidad. Son lo
//! que hace a la migración reanudable: un certificado presente en el
//! mapping de certificados ya está migrado y queda fuera del set de
//! trabajo de las corridas siguientes.
//!
//! La persistencia escribe el documento completo a un archivo temporal y
//! luego lo renombra sobre el definitivo, así el archivo siempre es el
//! estado anterior completo o el nuevo completo, nunca una escritura
//! parcial.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::utils::errors::MigrationError;

/// Tipos de entidad con mapping de identidad propio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Device,
    Customer,
    User,
    Technician,
    Certificate,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Device,
        EntityType::Customer,
        EntityType::User,
        EntityType::Technician,
        EntityType::Certificate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Device => "device",
            EntityType::Customer => "customer",
            EntityType::User => "user",
            EntityType::Technician => "technician",
            EntityType::Certificate => "certificate",
        }
    }
}

type Mapping = Arc<RwLock<HashMap<String, i64>>>;

/// Diccionarios de identidad por tipo de entidad
pub struct MappingStore {
    dir: PathBuf,
    maps: HashMap<EntityType, Mapping>,
    /// Un persist en vuelo por entidad: el archivo temporal tiene un solo
    /// dueño a la vez y nunca se renombra un snapshot viejo sobre uno nuevo
    persist_locks: HashMap<EntityType, Mutex<()>>,
}

impl MappingStore {
    /// Crear el store vacío sobre un directorio de mappings
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let maps = EntityType::ALL
            .iter()
            .map(|e| (*e, Arc::new(RwLock::new(HashMap::new()))))
            .collect();
        let persist_locks = EntityType::ALL.iter().map(|e| (*e, Mutex::new(()))).collect();
        Self {
            dir: dir.as_ref().to_path_buf(),
            maps,
            persist_locks,
        }
    }

    fn file_path(&self, entity: EntityType) -> PathBuf {
        self.dir.join(format!("{}_mappings.json", entity.as_str()))
    }

    fn map(&self, entity: EntityType) -> &Mapping {
        // Todos los tipos se insertan en new(), la clave siempre existe
        &self.maps[&entity]
    }

    /// Cargar el mapping de una entidad desde disco.
    ///
    /// Un archivo inexistente no es error: la primera corrida de un tipo
    /// de migración arranca con el mapping vacío.
    pub async fn load(&self, entity: EntityType) -> Result<(), MigrationError> {
        let path = self.file_path(entity);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("📂 Sin mapping previo de {} ({})", entity.as_str(), path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let parsed: HashMap<String, i64> = serde_json::from_str(&raw)?;
        let count = parsed.len();

        let mut guard = self.map(entity).write().await;
        *guard = parsed;

        info!("📂 Mapping de {} cargado: {} entradas", entity.as_str(), count);
        Ok(())
    }

    /// Cargar todos los mappings al inicio de la corrida
    pub async fn load_all(&self) -> Result<(), MigrationError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        for entity in EntityType::ALL {
            self.load(entity).await?;
        }
        Ok(())
    }

    /// Buscar el id de destino de un id legacy
    pub async fn get(&self, entity: EntityType, old_id: &str) -> Option<i64> {
        self.map(entity).read().await.get(old_id).copied()
    }

    /// Registrar una asociación old id -> new id.
    ///
    /// Seguro bajo múltiples callers concurrentes; puts de claves
    /// distintas no se pisan entre sí.
    pub async fn put(&self, entity: EntityType, old_id: impl Into<String>, new_id: i64) {
        let old_id = old_id.into();
        let mut guard = self.map(entity).write().await;
        if let Some(prev) = guard.insert(old_id.clone(), new_id) {
            if prev != new_id {
                warn!(
                    "⚠️ Mapping de {} sobrescrito para {}: {} -> {}",
                    entity.as_str(),
                    old_id,
                    prev,
                    new_id
                );
            }
        }
    }

    pub async fn contains(&self, entity: EntityType, old_id: &str) -> bool {
        self.map(entity).read().await.contains_key(old_id)
    }

    pub async fn len(&self, entity: EntityType) -> usize {
        self.map(entity).read().await.len()
    }

    /// Copia del mapping completo, para el listado de no-migrados y tests
    pub async fn snapshot(&self, entity: EntityType) -> HashMap<String, i64> {
        self.map(entity).read().await.clone()
    }

    /// Persistir un mapping con swap atómico (archivo temporal + rename).
    ///
    /// Toda la secuencia snapshot -> escritura -> rename corre bajo el lock
    /// de persist de la entidad; el snapshot se toma con el lock ya tomado,
    /// así el persist que escribe más tarde escribe un estado igual o más
    /// nuevo que el anterior, nunca uno viejo.
    pub async fn persist(&self, entity: EntityType) -> Result<(), MigrationError> {
        let _guard = self.persist_locks[&entity].lock().await;

        let snapshot = self.snapshot(entity).await;
        let json = serde_json::to_string_pretty(&snapshot)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.file_path(entity);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(
            "💾 Mapping de {} persistido: {} entradas",
            entity.as_str(),
            snapshot.len()
        );
        Ok(())
    }

    /// Persistir todos los mappings (cierre de corrida batch)
    pub async fn persist_all(&self) -> Result<(), MigrationError> {
        for entity in EntityType::ALL {
            self.persist(entity).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_missing_file_is_empty_mapping() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path());
        store.load_all().await.unwrap();
        assert_eq!(store.len(EntityType::Certificate).await, 0);
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path());
        store.put(EntityType::Device, "10", 77).await;
        assert_eq!(store.get(EntityType::Device, "10").await, Some(77));
        assert!(store.contains(EntityType::Device, "10").await);
        assert_eq!(store.get(EntityType::Device, "11").await, None);
    }

    #[tokio::test]
    async fn test_persist_then_load_is_lossless() {
        let dir = tempdir().unwrap();
        {
            let store = MappingStore::new(dir.path());
            store.put(EntityType::Certificate, "1", 100).await;
            store.put(EntityType::Certificate, "2", 200).await;
            store.persist(EntityType::Certificate).await.unwrap();
        }

        let reloaded = MappingStore::new(dir.path());
        reloaded.load_all().await.unwrap();
        assert_eq!(reloaded.get(EntityType::Certificate, "1").await, Some(100));
        assert_eq!(reloaded.get(EntityType::Certificate, "2").await, Some(200));
        assert_eq!(reloaded.len(EntityType::Certificate).await, 2);
    }

    #[tokio::test]
    async fn test_persist_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path());
        store.put(EntityType::User, "5", 50).await;
        store.persist(EntityType::User).await.unwrap();

        assert!(dir.path().join("user_mappings.json").exists());
        assert!(!dir.path().join("user_mappings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_puts_do_not_lose_updates() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MappingStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..50i64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(EntityType::Technician, i.to_string(), i * 10).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.len(EntityType::Technician).await, 50);
        assert_eq!(store.get(EntityType::Technician, "42").await, Some(420));
    }

    #[tokio::test]
    async fn test_concurrent_put_persist_never_fails_nor_loses_entries() {
        // Cada worker del modo batch persiste el mapping de certificados
        // tras su insert: N persists concurrentes no pueden fallar por el
        // archivo temporal compartido ni dejar en disco un snapshot viejo
        let dir = tempdir().unwrap();
        let store = Arc::new(MappingStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..100i64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(EntityType::Certificate, i.to_string(), i + 1000).await;
                store.persist(EntityType::Certificate).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let reloaded = MappingStore::new(dir.path());
        reloaded.load_all().await.unwrap();
        assert_eq!(reloaded.len(EntityType::Certificate).await, 100);
        assert_eq!(reloaded.get(EntityType::Certificate, "99").await, Some(1099));
    }
}
