//! Modelos de User
//!
//! La identidad de un técnico en destino es un par user+technician, así
//! que el resolver de técnicos también crea users cuando hace falta.

use sqlx::FromRow;

/// Usuario del esquema legacy
#[derive(Debug, Clone, FromRow)]
pub struct SourceUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Usuario ya existente en destino
#[derive(Debug, Clone, FromRow)]
pub struct DestinationUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Payload de inserción para la tabla `users` de destino
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Hash bcrypt de una contraseña temporal
    pub password: String,
}
