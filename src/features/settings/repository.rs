use crate::features::settings::models::{Settings, SettingsPatch};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection};

/// Obtiene la configuración de la aplicación.
pub fn get(conn: &Connection) -> AppResult<Settings> {
    conn.query_row(
        "SELECT responsable_nombre, responsable_rut, cargo, telefono, empresa, banco,
             tipo_cuenta, numero_cuenta, cr_default_codigo, correlativo_prefix,
             correlativo_next_number
         FROM settings WHERE key = 'app'",
        [],
        |row| {
            Ok(Settings {
                responsable_nombre: row.get(0)?,
                responsable_rut: row.get(1)?,
                cargo: row.get(2)?,
                telefono: row.get(3)?,
                empresa: row.get(4)?,
                banco: row.get(5)?,
                tipo_cuenta: row.get(6)?,
                numero_cuenta: row.get(7)?,
                cr_default_codigo: row.get(8)?,
                correlativo_prefix: row.get(9)?,
                correlativo_next_number: row.get(10)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Configuración"),
        _ => AppError::from(e),
    })
}

/// Aplica un parche sobre la configuración existente.
pub fn save(conn: &Connection, patch: SettingsPatch) -> AppResult<Settings> {
    let current = get(conn)?;

    let next = Settings {
        responsable_nombre: patch.responsable_nombre.unwrap_or(current.responsable_nombre),
        responsable_rut: patch.responsable_rut.unwrap_or(current.responsable_rut),
        cargo: patch.cargo.unwrap_or(current.cargo),
        telefono: patch.telefono.unwrap_or(current.telefono),
        empresa: patch.empresa.unwrap_or(current.empresa),
        banco: patch.banco.unwrap_or(current.banco),
        tipo_cuenta: patch.tipo_cuenta.unwrap_or(current.tipo_cuenta),
        numero_cuenta: patch.numero_cuenta.unwrap_or(current.numero_cuenta),
        cr_default_codigo: patch.cr_default_codigo.unwrap_or(current.cr_default_codigo),
        correlativo_prefix: patch.correlativo_prefix.unwrap_or(current.correlativo_prefix),
        correlativo_next_number: patch
            .correlativo_next_number
            .unwrap_or(current.correlativo_next_number),
    };

    conn.execute(
        "UPDATE settings SET responsable_nombre = ?1, responsable_rut = ?2, cargo = ?3,
             telefono = ?4, empresa = ?5, banco = ?6, tipo_cuenta = ?7, numero_cuenta = ?8,
             cr_default_codigo = ?9, correlativo_prefix = ?10, correlativo_next_number = ?11
         WHERE key = 'app'",
        params![
            next.responsable_nombre,
            next.responsable_rut,
            next.cargo,
            next.telefono,
            next.empresa,
            next.banco,
            next.tipo_cuenta,
            next.numero_cuenta,
            next.cr_default_codigo,
            next.correlativo_prefix,
            next.correlativo_next_number,
        ],
    )?;

    Ok(next)
}

/// Formatea un correlativo: `RC-2024-0007`.
pub fn build_correlativo(prefix: &str, year: i32, number: i64) -> String {
    format!("{prefix}-{year}-{number:04}")
}
