use crate::features::transfers::models::{Transfer, TransferEstado};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use rusqlite::{params, Connection, Row};

const SELECT: &str = "SELECT transfer_id, fecha, origen, destino, tipo, cr_codigo, visita,
    notas, estado, gasto_id, created_at, updated_at FROM transfers";

fn map_row(row: &Row) -> rusqlite::Result<Transfer> {
    let estado: String = row.get(8)?;
    Ok(Transfer {
        transfer_id: row.get(0)?,
        fecha: row.get(1)?,
        origen: row.get(2)?,
        destino: row.get(3)?,
        tipo: row.get(4)?,
        cr_codigo: row.get(5)?,
        visita: row.get(6)?,
        notas: row.get(7)?,
        estado: TransferEstado::from_str(&estado).unwrap_or(TransferEstado::Pendiente),
        gasto_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Inserta un traslado.
pub fn insert(conn: &Connection, transfer: &Transfer) -> AppResult<()> {
    conn.execute(
        "INSERT INTO transfers (transfer_id, fecha, origen, destino, tipo, cr_codigo, visita,
             notas, estado, gasto_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            transfer.transfer_id,
            transfer.fecha,
            transfer.origen,
            transfer.destino,
            transfer.tipo,
            transfer.cr_codigo,
            transfer.visita,
            transfer.notas,
            transfer.estado.as_str(),
            transfer.gasto_id,
            transfer.created_at,
            transfer.updated_at,
        ],
    )?;
    Ok(())
}

/// Busca un traslado por id.
pub fn find_by_id(conn: &Connection, transfer_id: &str) -> AppResult<Transfer> {
    conn.query_row(
        &format!("{SELECT} WHERE transfer_id = ?1"),
        params![transfer_id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Traslado"),
        _ => AppError::from(e),
    })
}

/// Lista los traslados pendientes, más antiguos primero.
pub fn list_pending(conn: &Connection) -> AppResult<Vec<Transfer>> {
    list_by_estado(conn, TransferEstado::Pendiente)
}

/// Lista los traslados por estado.
///
/// Pendientes: antiguo a reciente. Usados: reciente a antiguo, como las
/// vistas del origen.
pub fn list_by_estado(conn: &Connection, estado: TransferEstado) -> AppResult<Vec<Transfer>> {
    let order = match estado {
        TransferEstado::Pendiente => "ASC",
        TransferEstado::Usado => "DESC",
    };
    let mut stmt = conn.prepare(&format!(
        "{SELECT} WHERE estado = ?1 ORDER BY fecha {order}"
    ))?;
    let rows = stmt.query_map(params![estado.as_str()], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Marca un lote de traslados como usados, vinculándolos al gasto generado.
///
/// Idempotente por traslado: re-marcar uno ya usado reescribe el mismo
/// vínculo.
pub fn mark_used(conn: &Connection, transfer_ids: &[String], gasto_id: &str) -> AppResult<()> {
    let now = time::now_rfc3339();
    for transfer_id in transfer_ids {
        conn.execute(
            "UPDATE transfers SET estado = 'usado', gasto_id = ?1, updated_at = ?2
             WHERE transfer_id = ?3",
            params![gasto_id, now, transfer_id],
        )?;
    }
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

    fn transfer(fecha: &str) -> Transfer {
        Transfer {
            transfer_id: Uuid::new_v4().to_string(),
            fecha: fecha.to_string(),
            origen: "Santiago".into(),
            destino: "Rancagua".into(),
            tipo: "Vehículo propio".into(),
            cr_codigo: "0001".into(),
            visita: "Obra Norte".into(),
            notas: String::new(),
            estado: TransferEstado::Pendiente,
            gasto_id: None,
            created_at: time::now_rfc3339(),
            updated_at: time::now_rfc3339(),
        }
    }

    #[test]
    fn test_list_pending_oldest_first() {
        let conn = create_test_db();
        insert(&conn, &transfer("2024-03-02")).unwrap();
        insert(&conn, &transfer("2024-01-10")).unwrap();

        let pending = list_pending(&conn).unwrap();
        assert_eq!(pending[0].fecha, "2024-01-10");
        assert_eq!(pending[1].fecha, "2024-03-02");
    }

    #[test]
    fn test_mark_used_is_idempotent() {
        let conn = create_test_db();
        let t = transfer("2024-02-01");
        insert(&conn, &t).unwrap();

        let ids = vec![t.transfer_id.clone()];
        mark_used(&conn, &ids, "g1").unwrap();
        mark_used(&conn, &ids, "g1").unwrap();

        let found = find_by_id(&conn, &t.transfer_id).unwrap();
        assert_eq!(found.estado, TransferEstado::Usado);
        assert_eq!(found.gasto_id.as_deref(), Some("g1"));
        assert!(list_pending(&conn).unwrap().is_empty());
    }
}
