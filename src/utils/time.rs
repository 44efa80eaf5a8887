//! Utilidades de zona horaria para la migración
//!
//! Los timestamps del esquema legacy son naive y están en hora local de
//! Emiratos Árabes Unidos (UTC+4, sin horario de verano). Antes de escribir
//! en destino se convierten a UTC. La protección contra doble conversión es
//! a nivel de tipos: un `NaiveDateTime` es "hora UAE todavía no convertida",
//! un `DateTime<Utc>` ya quedó convertido y no vuelve a desplazarse.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};

/// Offset fijo de Emiratos Árabes Unidos (UTC+4, sin DST)
const UAE_OFFSET_SECS: i32 = 4 * 3600;

fn uae_offset() -> FixedOffset {
    // east_opt solo falla fuera de ±24h, el offset es constante
    FixedOffset::east_opt(UAE_OFFSET_SECS).expect("valid UAE offset")
}

/// Convertir un timestamp naive (hora local UAE) a UTC.
///
/// Con offset fijo la conversión nunca es ambigua, pero el contrato de
/// chrono igual devuelve `LocalResult`; los casos imposibles se resuelven
/// tomando la primera interpretación.
pub fn uae_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match uae_offset().from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

/// Variante tolerante a ausencia, para campos de fecha opcionales.
pub fn uae_to_utc_opt(local: Option<NaiveDateTime>) -> Option<DateTime<Utc>> {
    local.map(uae_to_utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_uae_noon_is_utc_morning() {
        let utc = uae_to_utc(local(2024, 1, 1, 12, 0, 0));
        assert_eq!(utc.naive_utc(), local(2024, 1, 1, 8, 0, 0));
    }

    #[test]
    fn test_conversion_is_fixed_four_hour_subtraction() {
        // Sin DST: la resta es la misma en invierno y en verano
        let winter = uae_to_utc(local(2024, 1, 15, 0, 30, 0));
        let summer = uae_to_utc(local(2024, 7, 15, 0, 30, 0));
        assert_eq!(winter.naive_utc(), local(2024, 1, 14, 20, 30, 0));
        assert_eq!(summer.naive_utc(), local(2024, 7, 14, 20, 30, 0));
    }

    #[test]
    fn test_optional_conversion() {
        assert_eq!(uae_to_utc_opt(None), None);
        let some = uae_to_utc_opt(Some(local(2024, 3, 1, 4, 0, 0))).unwrap();
        assert_eq!(some.naive_utc(), local(2024, 3, 1, 0, 0, 0));
    }
}
