//! Modelo de Vehicle
//!
//! Cada certificado migrado con descriptor fabrica su propia fila de
//! vehículo. No hay deduplicación por chasis: varios vehículos pueden
//! compartir legítimamente el mismo número de chasis.

/// Payload de inserción para la tabla `vehicles` de destino
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub brand: String,
    pub model: String,
    pub vehicle_no: Option<String>,
    pub vehicle_chassis_no: String,
    pub new_registration: bool,
}

impl NewVehicle {
    /// Partir el descriptor libre en marca y modelo.
    ///
    /// El corte es en el primer espacio: `"Toyota Land Cruiser"` da marca
    /// `"Toyota"` y modelo `"Land Cruiser"`. Sin espacio, marca y modelo
    /// son el string completo.
    pub fn from_descriptor(descriptor: &str, registration: &str, chassis: &str) -> Option<Self> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return None;
        }

        let (brand, model) = match descriptor.split_once(char::is_whitespace) {
            Some((brand, rest)) => (brand.to_string(), rest.trim().to_string()),
            None => (descriptor.to_string(), descriptor.to_string()),
        };

        Some(Self {
            brand,
            model,
            vehicle_no: Some(registration.to_string()).filter(|v| !v.trim().is_empty()),
            vehicle_chassis_no: chassis.to_string(),
            new_registration: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_splits_on_first_whitespace() {
        let v = NewVehicle::from_descriptor("Toyota Land Cruiser", "A-1234", "CH-99").unwrap();
        assert_eq!(v.brand, "Toyota");
        assert_eq!(v.model, "Land Cruiser");
        assert_eq!(v.vehicle_chassis_no, "CH-99");
    }

    #[test]
    fn test_descriptor_without_whitespace_duplicates_brand() {
        let v = NewVehicle::from_descriptor("Toyota", "A-1234", "CH-99").unwrap();
        assert_eq!(v.brand, "Toyota");
        assert_eq!(v.model, "Toyota");
    }

    #[test]
    fn test_blank_descriptor_yields_none() {
        assert!(NewVehicle::from_descriptor("   ", "A-1234", "CH-99").is_none());
        assert!(NewVehicle::from_descriptor("", "A-1234", "CH-99").is_none());
    }

    #[test]
    fn test_empty_registration_becomes_absent() {
        let v = NewVehicle::from_descriptor("Nissan Patrol", "", "CH-1").unwrap();
        assert!(v.vehicle_no.is_none());
    }
}
