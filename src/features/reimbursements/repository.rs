use crate::features::reimbursements::models::{
    Reimbursement, ReimbursementEstado, ReimbursementItem,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use rusqlite::{params, Connection, Row};

const SELECT: &str = "SELECT rendicion_id, correlativo, fecha_creacion, estado,
    motivo_devuelta, total, updated_at FROM reimbursements";

fn map_row(row: &Row) -> rusqlite::Result<Reimbursement> {
    let estado: String = row.get(3)?;
    Ok(Reimbursement {
        rendicion_id: row.get(0)?,
        correlativo: row.get(1)?,
        fecha_creacion: row.get(2)?,
        estado: ReimbursementEstado::from_str(&estado).unwrap_or(ReimbursementEstado::Borrador),
        motivo_devuelta: row.get(4)?,
        total: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Inserta una rendición.
pub fn insert(conn: &Connection, reimbursement: &Reimbursement) -> AppResult<()> {
    conn.execute(
        "INSERT INTO reimbursements (rendicion_id, correlativo, fecha_creacion, estado,
             motivo_devuelta, total, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            reimbursement.rendicion_id,
            reimbursement.correlativo,
            reimbursement.fecha_creacion,
            reimbursement.estado.as_str(),
            reimbursement.motivo_devuelta,
            reimbursement.total,
            reimbursement.updated_at,
        ],
    )?;
    Ok(())
}

/// Busca una rendición por id.
pub fn find_by_id(conn: &Connection, rendicion_id: &str) -> AppResult<Reimbursement> {
    conn.query_row(
        &format!("{SELECT} WHERE rendicion_id = ?1"),
        params![rendicion_id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Rendición"),
        _ => AppError::from(e),
    })
}

/// Lista todas las rendiciones, más recientes primero.
pub fn list_all(conn: &Connection) -> AppResult<Vec<Reimbursement>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY fecha_creacion DESC"))?;
    let rows = stmt.query_map([], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Cambia el estado y el motivo de devolución de una rendición.
///
/// El motivo se reescribe siempre: pasar `None` limpia cualquier motivo
/// anterior.
pub fn set_estado(
    conn: &Connection,
    rendicion_id: &str,
    estado: ReimbursementEstado,
    motivo_devuelta: Option<&str>,
) -> AppResult<()> {
    let affected = conn.execute(
        "UPDATE reimbursements SET estado = ?1, motivo_devuelta = ?2, updated_at = ?3
         WHERE rendicion_id = ?4",
        params![
            estado.as_str(),
            motivo_devuelta,
            time::now_rfc3339(),
            rendicion_id,
        ],
    )?;
    if affected == 0 {
        return Err(AppError::not_found("Rendición"));
    }
    Ok(())
}

/// Elimina una rendición.
pub fn delete(conn: &Connection, rendicion_id: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM reimbursements WHERE rendicion_id = ?1",
        params![rendicion_id],
    )?;
    Ok(())
}

/// Inserta un item de rendición.
pub fn insert_item(conn: &Connection, item: &ReimbursementItem) -> AppResult<()> {
    conn.execute(
        "INSERT INTO reimbursement_items (item_id, rendicion_id, gasto_id, orden)
         VALUES (?1, ?2, ?3, ?4)",
        params![item.item_id, item.rendicion_id, item.gasto_id, item.orden],
    )?;
    Ok(())
}

/// Lista los items de una rendición en su orden canónico.
pub fn list_items(conn: &Connection, rendicion_id: &str) -> AppResult<Vec<ReimbursementItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, rendicion_id, gasto_id, orden FROM reimbursement_items
         WHERE rendicion_id = ?1 ORDER BY orden ASC",
    )?;
    let rows = stmt.query_map(params![rendicion_id], |row| {
        Ok(ReimbursementItem {
            item_id: row.get(0)?,
            rendicion_id: row.get(1)?,
            gasto_id: row.get(2)?,
            orden: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Elimina los items de una rendición.
pub fn delete_items(conn: &Connection, rendicion_id: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM reimbursement_items WHERE rendicion_id = ?1",
        params![rendicion_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use uuid::Uuid;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample(correlativo: &str, fecha: &str) -> Reimbursement {
        Reimbursement {
            rendicion_id: Uuid::new_v4().to_string(),
            correlativo: correlativo.to_string(),
            fecha_creacion: fecha.to_string(),
            estado: ReimbursementEstado::Borrador,
            motivo_devuelta: None,
            total: 30000,
            updated_at: fecha.to_string(),
        }
    }

    #[test]
    fn test_list_all_newest_first() {
        let conn = create_test_db();
        insert(&conn, &sample("RC-2024-0001", "2024-01-10T10:00:00-03:00")).unwrap();
        insert(&conn, &sample("RC-2024-0002", "2024-03-02T10:00:00-03:00")).unwrap();

        let all = list_all(&conn).unwrap();
        assert_eq!(all[0].correlativo, "RC-2024-0002");
        assert_eq!(all[1].correlativo, "RC-2024-0001");
    }

    #[test]
    fn test_items_keep_canonical_order() {
        let conn = create_test_db();
        let r = sample("RC-2024-0001", "2024-01-10T10:00:00-03:00");
        insert(&conn, &r).unwrap();

        for (orden, gasto_id) in [(2, "g2"), (1, "g1"), (3, "g3")] {
            insert_item(
                &conn,
                &ReimbursementItem {
                    item_id: Uuid::new_v4().to_string(),
                    rendicion_id: r.rendicion_id.clone(),
                    gasto_id: gasto_id.to_string(),
                    orden,
                },
            )
            .unwrap();
        }

        let items = list_items(&conn, &r.rendicion_id).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.gasto_id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);

        delete_items(&conn, &r.rendicion_id).unwrap();
        assert!(list_items(&conn, &r.rendicion_id).unwrap().is_empty());
    }

    #[test]
    fn test_set_estado_missing_is_not_found() {
        let conn = create_test_db();
        let result = set_estado(&conn, "nope", ReimbursementEstado::Enviada, None);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
