//! Reference Resolvers
//!
//! Lógica por tipo de entidad que convierte las referencias foráneas de un
//! certificado legacy en ids de destino. Devices y customers ya deben
//! estar migrados (el resolver no los fabrica); técnicos se crean on
//! demand como par user+technician; el vehículo se fabrica siempre, uno
//! por certificado.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::{CachedUser, EntityCache};
use crate::mapping::{EntityType, MappingStore};
use crate::models::{NewTechnician, NewUser, NewVehicle, SourceCertificate};
use crate::repositories::{DestinationStore, SourceStore};
use crate::utils::errors::MigrationError;

/// Rol del técnico dentro del certificado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnicianRole {
    Calibration,
    Installation,
}

impl TechnicianRole {
    fn as_str(&self) -> &'static str {
        match self {
            TechnicianRole::Calibration => "calibration",
            TechnicianRole::Installation => "installation",
        }
    }
}

/// Resolvers de referencias, compartidos por todos los workers de la corrida
#[derive(Clone)]
pub struct ReferenceResolvers {
    source: Arc<dyn SourceStore>,
    dest: Arc<dyn DestinationStore>,
    cache: Arc<EntityCache>,
    mappings: Arc<MappingStore>,
    /// Usuario administrador: created_by de los técnicos fabricados
    default_user_id: i64,
}

impl ReferenceResolvers {
    pub fn new(
        source: Arc<dyn SourceStore>,
        dest: Arc<dyn DestinationStore>,
        cache: Arc<EntityCache>,
        mappings: Arc<MappingStore>,
        default_user_id: i64,
    ) -> Self {
        Self {
            source,
            dest,
            cache,
            mappings,
            default_user_id,
        }
    }

    /// Resolver el device por número de ECU.
    ///
    /// Los devices se migran en un paso previo: cache miss es
    /// `UnresolvedReference`, nunca una creación. Un certificado con
    /// activstate 0 además propaga el bloqueo al device de destino.
    pub async fn resolve_device(
        &self,
        record: &SourceCertificate,
    ) -> Result<i64, MigrationError> {
        let device = self.cache.lookup_device(&record.ecu).await.ok_or_else(|| {
            MigrationError::UnresolvedReference {
                entity: "device",
                key: record.ecu.clone(),
            }
        })?;

        let should_block = record.activstate == 0;
        if should_block && !device.blocked {
            self.dest.set_device_blocked(device.id, true).await?;
            self.cache.set_device_blocked(&record.ecu, true).await;
            info!("🔒 Device {} marcado como bloqueado", record.ecu);
        }

        Ok(device.id)
    }

    /// Resolver el customer vía su mapping de identidad.
    ///
    /// La referencia mapeada además tiene que existir en el snapshot de
    /// destino; un mapping colgante cuenta como no resuelto.
    pub async fn resolve_customer(
        &self,
        record: &SourceCertificate,
    ) -> Result<i64, MigrationError> {
        let old_id = record.customer_id.to_string();
        let mapped = self.mappings.get(EntityType::Customer, &old_id).await;

        match mapped {
            Some(id) if self.cache.customer_exists(id).await => Ok(id),
            _ => Err(MigrationError::UnresolvedReference {
                entity: "customer",
                key: old_id,
            }),
        }
    }

    /// Resolver (o fabricar) el técnico de un rol.
    ///
    /// Orden: mapping de técnicos, cache por email, creación del par
    /// user+technician. Un technician id 0 en origen cae al user del rol.
    /// Toda la secuencia lookup-then-create corre bajo el lock de la clave
    /// natural para que N workers no dupliquen al mismo técnico.
    pub async fn resolve_technician(
        &self,
        role: TechnicianRole,
        technician_id: i64,
        user_id: i64,
    ) -> Result<i64, MigrationError> {
        let old_key = technician_id.to_string();

        // Camino rápido sin lock: el mapping ya lo tiene
        if technician_id != 0 {
            if let Some(id) = self.mappings.get(EntityType::Technician, &old_key).await {
                return Ok(id);
            }
        }

        let lock_key = if technician_id != 0 {
            format!("technician:{}", technician_id)
        } else {
            format!("technician-user:{}", user_id)
        };
        let _guard = self.cache.lock_key(&lock_key).await;

        // Releer bajo lock: otro worker pudo habernos ganado
        if technician_id != 0 {
            if let Some(id) = self.mappings.get(EntityType::Technician, &old_key).await {
                return Ok(id);
            }
        }

        let identity = self.technician_identity(role, technician_id, user_id).await?;

        // Técnico ya existente en destino con el mismo email
        if let Some(existing) = self.cache.lookup_technician(&identity.email).await {
            if technician_id != 0 {
                self.mappings
                    .put(EntityType::Technician, &old_key, existing)
                    .await;
                self.mappings.persist(EntityType::Technician).await?;
            }
            return Ok(existing);
        }

        let dest_user_id = self
            .get_or_create_user(identity.old_user_id, &identity.name, &identity.email, identity.phone.as_deref())
            .await?;

        let new_technician = NewTechnician {
            name: identity.name.clone(),
            email: identity.email.clone(),
            phone: identity
                .phone
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "0000000000".to_string()),
            user_id: dest_user_id,
            created_by: self.default_user_id,
        };
        let new_id = self.dest.insert_technician(&new_technician).await?;
        self.cache.insert_technician(&identity.email, new_id).await;

        if technician_id != 0 {
            self.mappings
                .put(EntityType::Technician, &old_key, new_id)
                .await;
            self.mappings.persist(EntityType::Technician).await?;
        }

        info!(
            "👷 Técnico creado ({}): {} -> id {}",
            role.as_str(),
            identity.email,
            new_id
        );
        Ok(new_id)
    }

    /// Identidad (nombre/email/teléfono/user legacy) del técnico a fabricar
    async fn technician_identity(
        &self,
        role: TechnicianRole,
        technician_id: i64,
        user_id: i64,
    ) -> Result<TechnicianIdentity, MigrationError> {
        if technician_id != 0 {
            let technician = self.source.fetch_technician(technician_id).await?.ok_or(
                MigrationError::UnresolvedReference {
                    entity: "technician",
                    key: format!("{}:{}", role.as_str(), technician_id),
                },
            )?;
            return Ok(TechnicianIdentity {
                name: technician.technician_name,
                email: technician.technician_email,
                phone: technician.technician_phone,
                old_user_id: technician.user_id,
            });
        }

        // Sin technician id: la identidad sale del user del rol
        let user = self.source.fetch_user(user_id).await?.ok_or(
            MigrationError::UnresolvedReference {
                entity: "technician",
                key: format!("{}:user:{}", role.as_str(), user_id),
            },
        )?;
        Ok(TechnicianIdentity {
            name: user.full_name,
            email: user.email,
            phone: user.phone,
            old_user_id: user.id,
        })
    }

    /// Get-or-create del user de destino, bajo su propio lock por email.
    ///
    /// El orden de locks es siempre técnico -> user, nunca al revés, así
    /// que no hay deadlock posible entre las dos jerarquías.
    async fn get_or_create_user(
        &self,
        old_user_id: i64,
        name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> Result<i64, MigrationError> {
        let old_key = old_user_id.to_string();
        if let Some(id) = self.mappings.get(EntityType::User, &old_key).await {
            return Ok(id);
        }

        let _guard = self.cache.lock_key(&format!("user:{}", email)).await;

        if let Some(id) = self.mappings.get(EntityType::User, &old_key).await {
            return Ok(id);
        }
        if let Some(user) = self.cache.lookup_user(email).await {
            self.mappings.put(EntityType::User, &old_key, user.id).await;
            self.mappings.persist(EntityType::User).await?;
            return Ok(user.id);
        }

        let password = bcrypt::hash(
            format!("temp_{}_{}", old_user_id, Utc::now().timestamp()),
            bcrypt::DEFAULT_COST,
        )
        .map_err(|e| MigrationError::Store(format!("Error hashing password: {}", e)))?;

        let new_user = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(|p| p.to_string()),
            password,
        };
        let new_id = self.dest.insert_user(&new_user).await?;

        self.cache
            .insert_user(
                email,
                CachedUser {
                    id: new_id,
                    name: name.to_string(),
                    phone: phone.map(|p| p.to_string()),
                },
            )
            .await;
        self.mappings.put(EntityType::User, &old_key, new_id).await;
        self.mappings.persist(EntityType::User).await?;

        info!("👤 User creado para técnico: {} -> id {}", email, new_id);
        Ok(new_id)
    }

    /// Fabricar el vehículo del certificado.
    ///
    /// Siempre crea una fila nueva, sin deduplicar por chasis (varios
    /// vehículos comparten chasis legítimamente). Un descriptor vacío no
    /// aborta el certificado: la referencia queda ausente y se registra
    /// el warning.
    pub async fn resolve_vehicle(
        &self,
        record: &SourceCertificate,
        warnings: &mut Vec<String>,
    ) -> Result<Option<i64>, MigrationError> {
        let vehicle = match NewVehicle::from_descriptor(
            &record.vehicle_type,
            &record.vehicle_registration,
            &record.vehicle_chassis,
        ) {
            Some(v) => v,
            None => {
                warn!(
                    "🚫 Certificado {} sin descriptor de vehículo, migra sin vehicle",
                    record.id
                );
                warnings.push("vehicle descriptor missing".to_string());
                return Ok(None);
            }
        };

        let id = self.dest.insert_vehicle(&vehicle).await?;
        Ok(Some(id))
    }
}

struct TechnicianIdentity {
    name: String,
    email: String,
    phone: Option<String>,
    old_user_id: i64,
}
