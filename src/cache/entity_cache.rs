//! Entity Cache
//!
//! Snapshots en memoria de las entidades de destino, indexados por clave
//! natural (ECU del device, email del user/técnico) y precargados una vez
//! al inicio de la corrida. Los resolvers consultan acá en lugar de
//! repetir queries, y cada fila que crean se inserta también al cache para
//! que el resto de la corrida la vea.
//!
//! El cache vive lo que vive la corrida; la copia durable es el propio
//! store de destino.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedMutexGuard, RwLock};
use tracing::info;

use crate::cache::keyed_lock::KeyedLock;
use crate::repositories::DestinationStore;
use crate::utils::errors::MigrationError;

/// Device de destino cacheado por número de ECU
#[derive(Debug, Clone)]
pub struct CachedDevice {
    pub id: i64,
    pub blocked: bool,
}

/// User de destino cacheado por email
#[derive(Debug, Clone)]
pub struct CachedUser {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
}

/// Índices en memoria de las entidades de destino
pub struct EntityCache {
    devices: Arc<RwLock<HashMap<String, CachedDevice>>>,
    /// id de destino -> email, para verificar existencia de referencias ya
    /// mapeadas y para los campos de auditoría del reporte
    customers: Arc<RwLock<HashMap<i64, String>>>,
    users: Arc<RwLock<HashMap<String, CachedUser>>>,
    technicians: Arc<RwLock<HashMap<String, i64>>>,
    locks: KeyedLock,
}

impl EntityCache {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            customers: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
            technicians: Arc::new(RwLock::new(HashMap::new())),
            locks: KeyedLock::new(),
        }
    }

    /// Precargar todos los índices desde el store de destino
    pub async fn preload(&self, dest: &dyn DestinationStore) -> Result<(), MigrationError> {
        let devices = dest.list_devices().await?;
        let customers = dest.list_customers().await?;
        let users = dest.list_users().await?;
        let technicians = dest.list_technicians().await?;

        info!(
            "📦 Cache precargado: {} devices, {} customers, {} users, {} technicians",
            devices.len(),
            customers.len(),
            users.len(),
            technicians.len()
        );

        {
            let mut guard = self.devices.write().await;
            for d in devices {
                guard.insert(
                    d.ecu_number.clone(),
                    CachedDevice {
                        id: d.id,
                        blocked: d.blocked,
                    },
                );
            }
        }
        {
            let mut guard = self.customers.write().await;
            for c in customers {
                guard.insert(c.id, c.email);
            }
        }
        {
            let mut guard = self.users.write().await;
            for u in users {
                guard.insert(
                    u.email.clone(),
                    CachedUser {
                        id: u.id,
                        name: u.name,
                        phone: u.phone,
                    },
                );
            }
        }
        {
            let mut guard = self.technicians.write().await;
            for t in technicians {
                guard.insert(t.email, t.id);
            }
        }

        Ok(())
    }

    /// Sección crítica get-or-create para una clave natural.
    ///
    /// El guard debe sostenerse hasta que el insert en destino y la
    /// actualización de cache/mapping hayan terminado.
    pub async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(key).await
    }

    pub async fn lookup_device(&self, ecu: &str) -> Option<CachedDevice> {
        self.devices.read().await.get(ecu).cloned()
    }

    pub async fn set_device_blocked(&self, ecu: &str, blocked: bool) {
        if let Some(device) = self.devices.write().await.get_mut(ecu) {
            device.blocked = blocked;
        }
    }

    pub async fn customer_exists(&self, id: i64) -> bool {
        self.customers.read().await.contains_key(&id)
    }

    pub async fn customer_email(&self, id: i64) -> Option<String> {
        self.customers.read().await.get(&id).cloned()
    }

    pub async fn lookup_user(&self, email: &str) -> Option<CachedUser> {
        self.users.read().await.get(email).cloned()
    }

    pub async fn insert_user(&self, email: impl Into<String>, user: CachedUser) {
        self.users.write().await.insert(email.into(), user);
    }

    pub async fn lookup_technician(&self, email: &str) -> Option<i64> {
        self.technicians.read().await.get(email).copied()
    }

    pub async fn insert_technician(&self, email: impl Into<String>, id: i64) {
        self.technicians.write().await.insert(email.into(), id);
    }

    #[cfg(test)]
    pub async fn technician_count(&self) -> usize {
        self.technicians.read().await.len()
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_lookup_hits() {
        let cache = EntityCache::new();
        assert!(cache.lookup_technician("a@b.ae").await.is_none());

        cache.insert_technician("a@b.ae", 7).await;
        assert_eq!(cache.lookup_technician("a@b.ae").await, Some(7));
    }

    #[tokio::test]
    async fn test_device_blocked_flag_update() {
        let cache = EntityCache::new();
        cache
            .devices
            .write()
            .await
            .insert("ECU-1".to_string(), CachedDevice { id: 3, blocked: false });

        cache.set_device_blocked("ECU-1", true).await;
        assert!(cache.lookup_device("ECU-1").await.unwrap().blocked);
    }

    #[tokio::test]
    async fn test_customer_existence() {
        let cache = EntityCache::new();
        cache
            .customers
            .write()
            .await
            .insert(11, "cliente@fleet.ae".to_string());

        assert!(cache.customer_exists(11).await);
        assert!(!cache.customer_exists(12).await);
        assert_eq!(
            cache.customer_email(11).await.as_deref(),
            Some("cliente@fleet.ae")
        );
    }
}
