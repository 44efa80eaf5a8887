//! Cache
//!
//! Este módulo contiene el cache en memoria de entidades de destino y el
//! registro de locks por clave natural que protege sus get-or-create.

pub mod entity_cache;
pub mod keyed_lock;

pub use entity_cache::{CachedDevice, CachedUser, EntityCache};
pub use keyed_lock::KeyedLock;
