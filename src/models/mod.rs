//! Modelos del sistema
//!
//! Este módulo contiene los structs que mapean a las filas del esquema
//! legacy (solo lectura) y del esquema de destino.

pub mod certificate;
pub mod customer;
pub mod device;
pub mod technician;
pub mod user;
pub mod vehicle;

pub use certificate::{CertificateStatus, NewCertificate, SourceCertificate};
pub use customer::DestinationCustomer;
pub use device::DestinationDevice;
pub use technician::{DestinationTechnician, NewTechnician, SourceTechnician};
pub use user::{DestinationUser, NewUser, SourceUser};
pub use vehicle::NewVehicle;
