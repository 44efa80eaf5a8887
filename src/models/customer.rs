//! Modelo de Customer
//!
//! Los customers se migran en un paso previo; el resolver de certificados
//! solo verifica que la referencia mapeada exista en destino.

use sqlx::FromRow;

/// Customer ya existente en destino
#[derive(Debug, Clone, FromRow)]
pub struct DestinationCustomer {
    pub id: i64,
    pub name: String,
    pub email: String,
}
