use crate::features::expenses::models::{DocTipo, Expense, ExpenseEstado, ExpenseSource};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use rusqlite::{params, Connection, Row};

const SELECT: &str = "SELECT gasto_id, fecha, concept_id, monto, doc_tipo, doc_numero, detalle,
    cr_codigo, cta_codigo, partida_codigo, clasificacion_codigo, estado, rendicion_id, source,
    created_at, updated_at FROM expenses";

fn map_row(row: &Row) -> rusqlite::Result<Expense> {
    let doc_tipo: String = row.get(4)?;
    let estado: String = row.get(11)?;
    let source: Option<String> = row.get(13)?;

    Ok(Expense {
        gasto_id: row.get(0)?,
        fecha: row.get(1)?,
        concept_id: row.get(2)?,
        monto: row.get(3)?,
        doc_tipo: DocTipo::from_str(&doc_tipo).unwrap_or(DocTipo::SinDoc),
        doc_numero: row.get(5)?,
        detalle: row.get(6)?,
        cr_codigo: row.get(7)?,
        cta_codigo: row.get(8)?,
        partida_codigo: row.get(9)?,
        clasificacion_codigo: row.get(10)?,
        estado: ExpenseEstado::from_str(&estado).unwrap_or(ExpenseEstado::Pendiente),
        rendicion_id: row.get(12)?,
        source: source.and_then(|s| serde_json::from_str::<ExpenseSource>(&s).ok()),
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Inserta un gasto ya validado.
pub fn insert(conn: &Connection, expense: &Expense) -> AppResult<()> {
    let source = expense
        .source
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO expenses (gasto_id, fecha, concept_id, monto, doc_tipo, doc_numero,
             detalle, cr_codigo, cta_codigo, partida_codigo, clasificacion_codigo, estado,
             rendicion_id, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            expense.gasto_id,
            expense.fecha,
            expense.concept_id,
            expense.monto,
            expense.doc_tipo.as_str(),
            expense.doc_numero,
            expense.detalle,
            expense.cr_codigo,
            expense.cta_codigo,
            expense.partida_codigo,
            expense.clasificacion_codigo,
            expense.estado.as_str(),
            expense.rendicion_id,
            source,
            expense.created_at,
            expense.updated_at,
        ],
    )?;
    Ok(())
}

/// Busca un gasto por id.
pub fn find_by_id(conn: &Connection, gasto_id: &str) -> AppResult<Expense> {
    conn.query_row(
        &format!("{SELECT} WHERE gasto_id = ?1"),
        params![gasto_id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Gasto"),
        _ => AppError::from(e),
    })
}

/// Lista los gastos pendientes, más recientes primero.
pub fn list_pending(conn: &Connection) -> AppResult<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT} WHERE estado = 'pendiente' ORDER BY fecha DESC"
    ))?;
    let rows = stmt.query_map([], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Lista los gastos de una rendición.
pub fn list_by_rendicion(conn: &Connection, rendicion_id: &str) -> AppResult<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE rendicion_id = ?1"))?;
    let rows = stmt.query_map(params![rendicion_id], map_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
}

/// Reescribe los campos editables de un gasto existente.
///
/// El estado, la rendición y la procedencia no se tocan aquí; esos campos
/// cambian solo a través del flujo de rendiciones.
pub fn update_fields(
    conn: &Connection,
    gasto_id: &str,
    input: &crate::features::expenses::models::ExpenseInput,
) -> AppResult<()> {
    let now = time::now_rfc3339();
    let affected = conn.execute(
        "UPDATE expenses SET fecha = ?1, concept_id = ?2, monto = ?3, doc_tipo = ?4,
             doc_numero = ?5, detalle = ?6, cr_codigo = ?7, cta_codigo = ?8,
             partida_codigo = ?9, clasificacion_codigo = ?10, updated_at = ?11
         WHERE gasto_id = ?12",
        params![
            input.fecha,
            input.concept_id,
            input.monto,
            input.doc_tipo.as_str(),
            input.doc_numero,
            input.detalle,
            input.cr_codigo,
            input.cta_codigo,
            input.partida_codigo,
            input.clasificacion_codigo,
            now,
            gasto_id,
        ],
    )?;
    if affected == 0 {
        return Err(AppError::not_found("Gasto"));
    }
    Ok(())
}

/// Marca un lote de gastos como rendidos, vinculándolos a la rendición.
pub fn mark_reimbursed(
    conn: &Connection,
    gasto_ids: &[String],
    rendicion_id: &str,
) -> AppResult<()> {
    let now = time::now_rfc3339();
    for gasto_id in gasto_ids {
        conn.execute(
            "UPDATE expenses SET estado = 'rendido', rendicion_id = ?1, updated_at = ?2
             WHERE gasto_id = ?3",
            params![rendicion_id, now, gasto_id],
        )?;
    }
    Ok(())
}

/// Devuelve a pendiente todos los gastos de una rendición cancelada.
pub fn revert_to_pending(conn: &Connection, rendicion_id: &str) -> AppResult<()> {
    let now = time::now_rfc3339();
    conn.execute(
        "UPDATE expenses SET estado = 'pendiente', rendicion_id = NULL, updated_at = ?1
         WHERE rendicion_id = ?2",
        params![now, rendicion_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::features::expenses::models::ExpenseInput;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample_expense(id: &str, fecha: &str) -> Expense {
        Expense {
            gasto_id: id.to_string(),
            fecha: fecha.to_string(),
            concept_id: "c1".into(),
            monto: 12500,
            doc_tipo: DocTipo::Boleta,
            doc_numero: "1234".into(),
            detalle: "Peaje ruta 68".into(),
            cr_codigo: "0001".into(),
            cta_codigo: "510100".into(),
            partida_codigo: "01".into(),
            clasificacion_codigo: String::new(),
            estado: ExpenseEstado::Pendiente,
            rendicion_id: None,
            source: None,
            created_at: time::now_rfc3339(),
            updated_at: time::now_rfc3339(),
        }
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let conn = create_test_db();
        let mut e = sample_expense("g1", "2024-03-02");
        e.source = Some(ExpenseSource::Transfers {
            transfer_ids: vec!["t1".into(), "t2".into()],
        });
        insert(&conn, &e).unwrap();

        let found = find_by_id(&conn, "g1").unwrap();
        assert_eq!(found.monto, 12500);
        assert_eq!(found.doc_tipo, DocTipo::Boleta);
        assert_eq!(
            found.source,
            Some(ExpenseSource::Transfers {
                transfer_ids: vec!["t1".into(), "t2".into()]
            })
        );
    }

    #[test]
    fn test_list_pending_newest_first() {
        let conn = create_test_db();
        insert(&conn, &sample_expense("g1", "2024-01-10")).unwrap();
        insert(&conn, &sample_expense("g2", "2024-03-02")).unwrap();
        insert(&conn, &sample_expense("g3", "2024-02-05")).unwrap();

        let pending = list_pending(&conn).unwrap();
        let ids: Vec<_> = pending.iter().map(|e| e.gasto_id.as_str()).collect();
        assert_eq!(ids, vec!["g2", "g3", "g1"]);
    }

    #[test]
    fn test_mark_reimbursed_and_revert() {
        let conn = create_test_db();
        insert(&conn, &sample_expense("g1", "2024-01-10")).unwrap();
        insert(&conn, &sample_expense("g2", "2024-01-11")).unwrap();

        mark_reimbursed(&conn, &["g1".into(), "g2".into()], "r1").unwrap();
        let e = find_by_id(&conn, "g1").unwrap();
        assert_eq!(e.estado, ExpenseEstado::Rendido);
        assert_eq!(e.rendicion_id.as_deref(), Some("r1"));

        revert_to_pending(&conn, "r1").unwrap();
        let e = find_by_id(&conn, "g2").unwrap();
        assert_eq!(e.estado, ExpenseEstado::Pendiente);
        assert!(e.rendicion_id.is_none());
    }

    #[test]
    fn test_update_fields_missing_is_not_found() {
        let conn = create_test_db();
        let input = ExpenseInput {
            fecha: "2024-01-01".into(),
            concept_id: "c1".into(),
            monto: 100,
            doc_tipo: DocTipo::Boleta,
            doc_numero: "1".into(),
            detalle: "x".into(),
            cr_codigo: "0001".into(),
            cta_codigo: "510100".into(),
            partida_codigo: "01".into(),
            clasificacion_codigo: String::new(),
            source: None,
        };
        let result = update_fields(&conn, "nope", &input);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
