use crate::features::catalogs::models::{CatalogAccount, CatalogCr, CatalogPartida};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Inserta o actualiza un Centro de Responsabilidad.
pub fn upsert_cr(conn: &Connection, item: &CatalogCr) -> AppResult<()> {
    conn.execute(
        "INSERT INTO catalog_cr (cr_codigo, cr_nombre, activo) VALUES (?1, ?2, ?3)
         ON CONFLICT(cr_codigo) DO UPDATE SET cr_nombre = ?2, activo = ?3",
        params![item.cr_codigo, item.cr_nombre, item.activo as i64],
    )?;
    Ok(())
}

/// Lista los CR activos ordenados por código.
///
/// El almacén de origen no podía indexar banderas booleanas y filtraba en
/// memoria; aquí el filtro va directo en SQL.
pub fn list_active_cr(conn: &Connection) -> AppResult<Vec<CatalogCr>> {
    let mut stmt = conn.prepare(
        "SELECT cr_codigo, cr_nombre, activo FROM catalog_cr
         WHERE activo = 1 ORDER BY cr_codigo",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CatalogCr {
            cr_codigo: row.get(0)?,
            cr_nombre: row.get(1)?,
            activo: row.get::<_, i64>(2)? == 1,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// Busca un CR por código.
pub fn get_cr(conn: &Connection, cr_codigo: &str) -> AppResult<Option<CatalogCr>> {
    conn.query_row(
        "SELECT cr_codigo, cr_nombre, activo FROM catalog_cr WHERE cr_codigo = ?1",
        params![cr_codigo],
        |row| {
            Ok(CatalogCr {
                cr_codigo: row.get(0)?,
                cr_nombre: row.get(1)?,
                activo: row.get::<_, i64>(2)? == 1,
            })
        },
    )
    .optional()
    .map_err(AppError::from)
}

/// Inserta o actualiza una cuenta contable.
pub fn upsert_account(conn: &Connection, item: &CatalogAccount) -> AppResult<()> {
    conn.execute(
        "INSERT INTO catalog_accounts (cta_codigo, cta_nombre, activo) VALUES (?1, ?2, ?3)
         ON CONFLICT(cta_codigo) DO UPDATE SET cta_nombre = ?2, activo = ?3",
        params![item.cta_codigo, item.cta_nombre, item.activo as i64],
    )?;
    Ok(())
}

/// Lista las cuentas activas ordenadas por código.
pub fn list_active_accounts(conn: &Connection) -> AppResult<Vec<CatalogAccount>> {
    let mut stmt = conn.prepare(
        "SELECT cta_codigo, cta_nombre, activo FROM catalog_accounts
         WHERE activo = 1 ORDER BY cta_codigo",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CatalogAccount {
            cta_codigo: row.get(0)?,
            cta_nombre: row.get(1)?,
            activo: row.get::<_, i64>(2)? == 1,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// Busca una cuenta por código.
pub fn get_account(conn: &Connection, cta_codigo: &str) -> AppResult<Option<CatalogAccount>> {
    conn.query_row(
        "SELECT cta_codigo, cta_nombre, activo FROM catalog_accounts WHERE cta_codigo = ?1",
        params![cta_codigo],
        |row| {
            Ok(CatalogAccount {
                cta_codigo: row.get(0)?,
                cta_nombre: row.get(1)?,
                activo: row.get::<_, i64>(2)? == 1,
            })
        },
    )
    .optional()
    .map_err(AppError::from)
}

/// Inserta o actualiza una partida.
pub fn upsert_partida(conn: &Connection, item: &CatalogPartida) -> AppResult<()> {
    conn.execute(
        "INSERT INTO catalog_partidas (partida_codigo, partida_nombre, activo) VALUES (?1, ?2, ?3)
         ON CONFLICT(partida_codigo) DO UPDATE SET partida_nombre = ?2, activo = ?3",
        params![item.partida_codigo, item.partida_nombre, item.activo as i64],
    )?;
    Ok(())
}

/// Lista las partidas activas ordenadas por código.
pub fn list_active_partidas(conn: &Connection) -> AppResult<Vec<CatalogPartida>> {
    let mut stmt = conn.prepare(
        "SELECT partida_codigo, partida_nombre, activo FROM catalog_partidas
         WHERE activo = 1 ORDER BY partida_codigo",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CatalogPartida {
            partida_codigo: row.get(0)?,
            partida_nombre: row.get(1)?,
            activo: row.get::<_, i64>(2)? == 1,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// Busca una partida por código.
pub fn get_partida(conn: &Connection, partida_codigo: &str) -> AppResult<Option<CatalogPartida>> {
    conn.query_row(
        "SELECT partida_codigo, partida_nombre, activo FROM catalog_partidas
         WHERE partida_codigo = ?1",
        params![partida_codigo],
        |row| {
            Ok(CatalogPartida {
                partida_codigo: row.get(0)?,
                partida_nombre: row.get(1)?,
                activo: row.get::<_, i64>(2)? == 1,
            })
        },
    )
    .optional()
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_upsert_and_list_active_cr() {
        let conn = create_test_db();

        upsert_cr(
            &conn,
            &CatalogCr {
                cr_codigo: "0009".into(),
                cr_nombre: "Obras".into(),
                activo: true,
            },
        )
        .unwrap();
        upsert_cr(
            &conn,
            &CatalogCr {
                cr_codigo: "0001".into(),
                cr_nombre: "Gerencia Constructora".into(),
                activo: false,
            },
        )
        .unwrap();

        let active = list_active_cr(&conn).unwrap();
        // el CR desactivado (semilla 0001) queda fuera, el resto ordenado por código
        assert!(active.iter().all(|c| c.cr_codigo != "0001"));
        assert!(active.iter().any(|c| c.cr_codigo == "0009"));
        let codes: Vec<_> = active.iter().map(|c| c.cr_codigo.clone()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_get_account_missing_is_none() {
        let conn = create_test_db();
        assert!(get_account(&conn, "999999").unwrap().is_none());
    }

    #[test]
    fn test_upsert_partida_overwrites() {
        let conn = create_test_db();
        upsert_partida(
            &conn,
            &CatalogPartida {
                partida_codigo: "01".into(),
                partida_nombre: "Operación Renombrada".into(),
                activo: true,
            },
        )
        .unwrap();

        let p = get_partida(&conn, "01").unwrap().unwrap();
        assert_eq!(p.partida_nombre, "Operación Renombrada");
    }
}
