use chrono::{Datelike, Utc};
use chrono_tz::America::Santiago;

/// Marca de tiempo actual en hora de Chile, formato RFC3339.
pub fn now_rfc3339() -> String {
    Utc::now().with_timezone(&Santiago).to_rfc3339()
}

/// Año calendario actual en hora de Chile (para el correlativo).
pub fn current_year() -> i32 {
    Utc::now().with_timezone(&Santiago).year()
}

/// Formatea una fecha ISO (`YYYY-MM-DD...`) como `DD-MM-YYYY` (es-CL).
///
/// Si la entrada no tiene el largo esperado se devuelve tal cual.
pub fn format_date_cl(iso: &str) -> String {
    let date = iso.get(..10).unwrap_or(iso);
    let parts: Vec<&str> = date.splitn(3, '-').collect();
    match parts.as_slice() {
        [y, m, d] if y.len() == 4 => format!("{d}-{m}-{y}"),
        _ => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_cl() {
        assert_eq!(format_date_cl("2024-03-02"), "02-03-2024");
        assert_eq!(format_date_cl("2024-03-02T12:00:00Z"), "02-03-2024");
        // entradas no reconocidas pasan sin cambios
        assert_eq!(format_date_cl("hoy"), "hoy");
    }

    #[test]
    fn test_now_rfc3339_is_parseable() {
        let now = now_rfc3339();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
