use crate::features::catalogs;
use crate::features::concepts;
use crate::features::expenses;
use crate::shared::collation;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;

/// Fila desnormalizada de exportación: un gasto con sus nombres de catálogo
/// ya resueltos.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub gasto_id: String,
    pub fecha: String,
    pub doc_tipo: String,
    pub doc_numero: String,
    pub detalle: String,
    pub cr_codigo: String,
    pub cr_nombre: String,
    pub cta_codigo: String,
    pub cta_nombre: String,
    pub partida_codigo: String,
    pub partida_nombre: String,
    pub clasificacion_codigo: String,
    pub concepto_nombre: String,
    pub monto: i64,
}

impl ExportRow {
    /// `código nombre`, o solo el código si el catálogo no lo conoce.
    pub fn cr_display(&self) -> String {
        display(&self.cr_codigo, &self.cr_nombre)
    }

    pub fn cta_display(&self) -> String {
        display(&self.cta_codigo, &self.cta_nombre)
    }

    pub fn partida_display(&self) -> String {
        display(&self.partida_codigo, &self.partida_nombre)
    }
}

fn display(codigo: &str, nombre: &str) -> String {
    if nombre.is_empty() {
        codigo.to_string()
    } else {
        format!("{codigo} {nombre}")
    }
}

/// Enriquece los gastos de una rendición en su orden canónico.
///
/// Los catálogos que no resuelven degradan a código con nombre vacío; un
/// gasto inexistente sí aborta la exportación completa.
pub fn build_export_rows(conn: &Connection, gasto_ids: &[String]) -> AppResult<Vec<ExportRow>> {
    let mut rows = Vec::with_capacity(gasto_ids.len());

    for gasto_id in gasto_ids {
        let expense = expenses::repository::find_by_id(conn, gasto_id).map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::export(format!("El gasto {gasto_id} ya no existe."))
            }
            other => other,
        })?;

        let concepto_nombre = concepts::repository::get(conn, &expense.concept_id)?
            .map(|c| c.nombre)
            .unwrap_or_default();
        let cr_nombre = catalogs::repository::get_cr(conn, &expense.cr_codigo)?
            .map(|c| c.cr_nombre)
            .unwrap_or_default();
        let cta_nombre = catalogs::repository::get_account(conn, &expense.cta_codigo)?
            .map(|c| c.cta_nombre)
            .unwrap_or_default();
        let partida_nombre = catalogs::repository::get_partida(conn, &expense.partida_codigo)?
            .map(|p| p.partida_nombre)
            .unwrap_or_default();

        rows.push(ExportRow {
            gasto_id: expense.gasto_id,
            fecha: expense.fecha,
            doc_tipo: expense.doc_tipo.as_str().to_string(),
            doc_numero: expense.doc_numero,
            detalle: expense.detalle,
            cr_codigo: expense.cr_codigo,
            cr_nombre,
            cta_codigo: expense.cta_codigo,
            cta_nombre,
            partida_codigo: expense.partida_codigo,
            partida_nombre,
            clasificacion_codigo: expense.clasificacion_codigo,
            concepto_nombre,
            monto: expense.monto,
        });
    }

    Ok(rows)
}

fn is_invoice(row: &ExportRow) -> bool {
    row.doc_tipo.eq_ignore_ascii_case("factura")
}

/// Agrupa las filas de una planilla: documentos no-factura primero,
/// facturas después, cada grupo ordenado por fecha ascendente con empates
/// por tipo y número de documento (comparación de locale).
///
/// Convención contable: las facturas se concilian aparte de boletas y
/// vouchers. El conteo total de filas se preserva.
pub fn group_for_worksheet(rows: &[ExportRow]) -> Vec<ExportRow> {
    let mut non_invoice: Vec<ExportRow> = Vec::new();
    let mut invoice: Vec<ExportRow> = Vec::new();
    for row in rows {
        if is_invoice(row) {
            invoice.push(row.clone());
        } else {
            non_invoice.push(row.clone());
        }
    }

    let sort_key = |a: &ExportRow, b: &ExportRow| {
        a.fecha
            .cmp(&b.fecha)
            .then_with(|| collation::compare(&a.doc_tipo, &b.doc_tipo))
            .then_with(|| collation::compare(&a.doc_numero, &b.doc_numero))
    };
    non_invoice.sort_by(sort_key);
    invoice.sort_by(sort_key);

    non_invoice.extend(invoice);
    non_invoice
}
