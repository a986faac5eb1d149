use crate::features::attachments::models::Attachment;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection, Row};

fn map_row(row: &Row) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        adjunto_id: row.get(0)?,
        gasto_id: row.get(1)?,
        filename: row.get(2)?,
        mime_type: row.get(3)?,
        blob: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Inserta un adjunto.
pub fn insert(conn: &Connection, attachment: &Attachment) -> AppResult<()> {
    conn.execute(
        "INSERT INTO attachments (adjunto_id, gasto_id, filename, mime_type, blob, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            attachment.adjunto_id,
            attachment.gasto_id,
            attachment.filename,
            attachment.mime_type,
            attachment.blob,
            attachment.created_at,
        ],
    )?;
    Ok(())
}

/// Lista los adjuntos de un gasto en orden de creación.
pub fn list_for_expense(conn: &Connection, gasto_id: &str) -> AppResult<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT adjunto_id, gasto_id, filename, mime_type, blob, created_at
         FROM attachments WHERE gasto_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![gasto_id], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Cantidad de adjuntos de un gasto.
pub fn count_for_expense(conn: &Connection, gasto_id: &str) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM attachments WHERE gasto_id = ?1",
        params![gasto_id],
        |row| row.get(0),
    )
    .map_err(AppError::from)
}

/// Borra un adjunto. Incondicional: no afecta el estado del gasto.
pub fn delete(conn: &Connection, adjunto_id: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM attachments WHERE adjunto_id = ?1",
        params![adjunto_id],
    )?;
    Ok(())
}
