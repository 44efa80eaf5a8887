//! Utilidades del sistema
//!
//! Este módulo contiene el manejo de errores y las utilidades de
//! conversión de zona horaria.

pub mod errors;
pub mod time;
