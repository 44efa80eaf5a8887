//! Lock por clave natural
//!
//! Las secuencias get-or-create de los resolvers son un check-then-act
//! clásico: dos workers que miran la misma clave a la vez crearían filas
//! duplicadas en destino. Este registro entrega un mutex async por clave;
//! el resolver lo sostiene desde el lookup hasta que el insert en destino
//! y la actualización de cache/mapping terminan.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registro de mutexes por clave
#[derive(Default)]
pub struct KeyedLock {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adquirir el lock de una clave. La sección crítica dura lo que viva
    /// el guard devuelto.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("keyed lock registry poisoned");
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_key_is_mutually_exclusive() {
        let lock = Arc::new(KeyedLock::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let lock = Arc::clone(&lock);
            let in_section = Arc::clone(&in_section);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = lock.acquire("tech:9").await;
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let lock = KeyedLock::new();
        let _a = lock.acquire("tech:1").await;
        // Con la clave 1 tomada, la clave 2 se adquiere sin esperar
        let _b = lock.acquire("tech:2").await;
    }
}
