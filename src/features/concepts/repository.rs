use crate::features::concepts::models::Concept;
use crate::shared::collation;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn map_row(row: &Row) -> rusqlite::Result<Concept> {
    Ok(Concept {
        concept_id: row.get(0)?,
        nombre: row.get(1)?,
        cta_default_codigo: row.get(2)?,
        partida_default_codigo: row.get(3)?,
        clasificacion_default_codigo: row.get(4)?,
        requiere_doc: row.get::<_, i64>(5)? == 1,
        requiere_respaldo: row.get::<_, i64>(6)? == 1,
        favorito: row.get::<_, i64>(7)? == 1,
        activo: row.get::<_, i64>(8)? == 1,
    })
}

const SELECT: &str = "SELECT concept_id, nombre, cta_default_codigo, partida_default_codigo,
    clasificacion_default_codigo, requiere_doc, requiere_respaldo, favorito, activo
    FROM concepts";

/// Inserta o actualiza un concepto.
pub fn upsert(conn: &Connection, concept: &Concept) -> AppResult<()> {
    conn.execute(
        "INSERT INTO concepts (concept_id, nombre, cta_default_codigo, partida_default_codigo,
             clasificacion_default_codigo, requiere_doc, requiere_respaldo, favorito, activo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(concept_id) DO UPDATE SET
             nombre = ?2, cta_default_codigo = ?3, partida_default_codigo = ?4,
             clasificacion_default_codigo = ?5, requiere_doc = ?6, requiere_respaldo = ?7,
             favorito = ?8, activo = ?9",
        params![
            concept.concept_id,
            concept.nombre,
            concept.cta_default_codigo,
            concept.partida_default_codigo,
            concept.clasificacion_default_codigo,
            concept.requiere_doc as i64,
            concept.requiere_respaldo as i64,
            concept.favorito as i64,
            concept.activo as i64,
        ],
    )?;
    Ok(())
}

/// Busca un concepto por id.
pub fn get(conn: &Connection, concept_id: &str) -> AppResult<Option<Concept>> {
    conn.query_row(
        &format!("{SELECT} WHERE concept_id = ?1"),
        params![concept_id],
        map_row,
    )
    .optional()
    .map_err(AppError::from)
}

/// Ordena: favoritos primero, después por nombre con comparación de locale.
fn sort_concepts(concepts: &mut [Concept]) {
    concepts.sort_by(|a, b| {
        b.favorito
            .cmp(&a.favorito)
            .then_with(|| collation::compare(&a.nombre, &b.nombre))
    });
}

/// Lista los conceptos activos, favoritos primero.
pub fn list_active(conn: &Connection) -> AppResult<Vec<Concept>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE activo = 1"))?;
    let rows = stmt.query_map([], map_row)?;
    let mut concepts = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)?;
    sort_concepts(&mut concepts);
    Ok(concepts)
}

/// Lista todos los conceptos (incluidos inactivos), favoritos primero.
pub fn list_all(conn: &Connection) -> AppResult<Vec<Concept>> {
    let mut stmt = conn.prepare(SELECT)?;
    let rows = stmt.query_map([], map_row)?;
    let mut concepts = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)?;
    sort_concepts(&mut concepts);
    Ok(concepts)
}

/// Cantidad de gastos que referencian un concepto.
pub fn count_usage(conn: &Connection, concept_id: &str) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE concept_id = ?1",
        params![concept_id],
        |row| row.get(0),
    )
    .map_err(AppError::from)
}

/// Reactiva un concepto.
pub fn activate(conn: &Connection, concept_id: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE concepts SET activo = 1 WHERE concept_id = ?1",
        params![concept_id],
    )?;
    Ok(())
}

/// Desactiva un concepto.
///
/// El traslado vinculado no bloquea la desactivación; solo cuentan los
/// gastos que referencian el concepto.
pub fn deactivate(conn: &Connection, concept_id: &str) -> AppResult<()> {
    let usage = count_usage(conn, concept_id)?;
    if usage > 0 {
        return Err(AppError::validation(format!(
            "No se puede desactivar: el concepto está usado por {usage} gasto(s)."
        )));
    }
    conn.execute(
        "UPDATE concepts SET activo = 0 WHERE concept_id = ?1",
        params![concept_id],
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

    fn concept(nombre: &str, favorito: bool) -> Concept {
        Concept {
            concept_id: Uuid::new_v4().to_string(),
            nombre: nombre.to_string(),
            cta_default_codigo: "510100".into(),
            partida_default_codigo: "01".into(),
            clasificacion_default_codigo: String::new(),
            requiere_doc: false,
            requiere_respaldo: false,
            favorito,
            activo: true,
        }
    }

    #[test]
    fn test_list_active_orders_favorites_then_name() {
        let conn = create_test_db();
        conn.execute("DELETE FROM concepts", []).unwrap();

        upsert(&conn, &concept("Peaje", false)).unwrap();
        upsert(&conn, &concept("Álmuerzo", false)).unwrap();
        upsert(&conn, &concept("Taxi", true)).unwrap();

        let list = list_active(&conn).unwrap();
        let nombres: Vec<_> = list.iter().map(|c| c.nombre.as_str()).collect();
        // favorito primero; "Álmuerzo" ordena como "almuerzo" (sin tilde)
        assert_eq!(nombres, vec!["Taxi", "Álmuerzo", "Peaje"]);
    }

    #[test]
    fn test_list_active_excludes_inactive() {
        let conn = create_test_db();
        conn.execute("DELETE FROM concepts", []).unwrap();

        let mut c = concept("Bencina", false);
        c.activo = false;
        upsert(&conn, &c).unwrap();

        assert!(list_active(&conn).unwrap().is_empty());
        assert_eq!(list_all(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_deactivate_guarded_by_usage() {
        let conn = create_test_db();
        let c = concept("Combustible", false);
        upsert(&conn, &c).unwrap();

        // gasto que referencia el concepto
        conn.execute(
            "INSERT INTO expenses (gasto_id, fecha, concept_id, monto, doc_tipo, estado,
                 cr_codigo, cta_codigo, partida_codigo, created_at, updated_at)
             VALUES ('g1', '2024-01-01', ?1, 1000, 'Boleta', 'pendiente',
                 '0001', '510200', '01', '', '')",
            params![c.concept_id],
        )
        .unwrap();

        let result = deactivate(&conn, &c.concept_id);
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
        assert!(get(&conn, &c.concept_id).unwrap().unwrap().activo);

        // sin referencias sí se puede
        conn.execute("DELETE FROM expenses", []).unwrap();
        deactivate(&conn, &c.concept_id).unwrap();
        assert!(!get(&conn, &c.concept_id).unwrap().unwrap().activo);
    }

    #[test]
    fn test_activate_restores_concept() {
        let conn = create_test_db();
        let mut c = concept("Hotel", false);
        c.activo = false;
        upsert(&conn, &c).unwrap();

        activate(&conn, &c.concept_id).unwrap();
        assert!(get(&conn, &c.concept_id).unwrap().unwrap().activo);
    }
}
