use crate::features::transfers::models::{
    ExpensePrefill, Transfer, TransferEstado, TransferInput,
};
use crate::features::transfers::repository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use rusqlite::Connection;
use uuid::Uuid;

/// Registra un traslado en estado pendiente.
pub fn create_transfer(conn: &Connection, input: TransferInput) -> AppResult<Transfer> {
    if input.fecha.trim().is_empty() {
        return Err(AppError::validation("Ingresa la fecha del traslado."));
    }
    if input.origen.trim().is_empty() || input.destino.trim().is_empty() {
        return Err(AppError::validation("Ingresa origen y destino."));
    }

    let now = time::now_rfc3339();
    let transfer = Transfer {
        transfer_id: Uuid::new_v4().to_string(),
        fecha: input.fecha,
        origen: input.origen.trim().to_string(),
        destino: input.destino.trim().to_string(),
        tipo: input.tipo,
        cr_codigo: input.cr_codigo,
        visita: input.visita.trim().to_string(),
        notas: input.notas.trim().to_string(),
        estado: TransferEstado::Pendiente,
        gasto_id: None,
        created_at: now.clone(),
        updated_at: now,
    };

    repository::insert(conn, &transfer)?;
    Ok(transfer)
}

/// Construye el prefill de gasto desde traslados seleccionados.
///
/// Visita y CR salen del primer traslado; el detalle lista los tramos
/// ordenados por fecha, como la pantalla de traslados del origen.
pub fn prefill_from(conn: &Connection, transfer_ids: &[String]) -> AppResult<ExpensePrefill> {
    if transfer_ids.is_empty() {
        return Err(AppError::validation("Selecciona al menos un traslado."));
    }

    let mut transfers = Vec::with_capacity(transfer_ids.len());
    for id in transfer_ids {
        transfers.push(repository::find_by_id(conn, id)?);
    }

    let visita = transfers[0].visita.clone();
    let cr_codigo = transfers[0].cr_codigo.clone();

    let mut sorted = transfers;
    sorted.sort_by(|a, b| a.fecha.cmp(&b.fecha));

    let lines: Vec<String> = sorted
        .iter()
        .map(|t| {
            format!(
                "• {} — {}: {} → {}",
                time::format_date_cl(&t.fecha),
                t.tipo,
                t.origen,
                t.destino
            )
        })
        .collect();

    Ok(ExpensePrefill {
        cr_codigo,
        visita: visita.clone(),
        detalle: format!("Visita: {}\n{}", visita, lines.join("\n")),
        transfer_ids: transfer_ids.to_vec(),
    })
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

    fn input(fecha: &str, origen: &str, destino: &str) -> TransferInput {
        TransferInput {
            fecha: fecha.to_string(),
            origen: origen.to_string(),
            destino: destino.to_string(),
            tipo: "Bus".into(),
            cr_codigo: "0001".into(),
            visita: "Obra Norte".into(),
            notas: String::new(),
        }
    }

    #[test]
    fn test_create_requires_route() {
        let conn = create_test_db();
        let mut bad = input("2024-02-01", "", "Rancagua");
        bad.origen = String::new();
        let err = create_transfer(&conn, bad).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_prefill_orders_legs_by_date() {
        let conn = create_test_db();
        let t1 = create_transfer(&conn, input("2024-02-03", "Rancagua", "Santiago")).unwrap();
        let t2 = create_transfer(&conn, input("2024-02-01", "Santiago", "Rancagua")).unwrap();

        let prefill =
            prefill_from(&conn, &[t1.transfer_id.clone(), t2.transfer_id.clone()]).unwrap();

        assert_eq!(prefill.visita, "Obra Norte");
        assert_eq!(prefill.cr_codigo, "0001");
        let detalle = prefill.detalle;
        let ida = detalle.find("Santiago → Rancagua").unwrap();
        let vuelta = detalle.find("Rancagua → Santiago").unwrap();
        // el tramo del 01-02 aparece antes que el del 03-02
        assert!(ida < vuelta);
        assert!(detalle.starts_with("Visita: Obra Norte"));
    }

    #[test]
    fn test_prefill_requires_selection() {
        let conn = create_test_db();
        let err = prefill_from(&conn, &[]).unwrap_err();
        assert_eq!(err.user_message(), "Selecciona al menos un traslado.");
    }
}
