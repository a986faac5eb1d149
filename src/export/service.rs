use crate::export::batch::{self, ExportBatch};
use crate::export::{excel, pdf, rows};
use crate::features::reimbursements;
use crate::features::settings;
use crate::shared::errors::AppResult;
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Archivos generados para un lote de exportación.
#[derive(Debug, Clone)]
pub struct ExportedBatch {
    pub codigo: String,
    pub xlsx_path: PathBuf,
    pub pdf_path: PathBuf,
}

/// Exporta una rendición completa a `output_dir`.
///
/// Proyección de solo lectura y repetible: se regenera desde el orden de
/// items persistido, nunca desde una selección en memoria, y no toca el
/// estado de la rendición. Cada lote produce su planilla y su PDF de
/// respaldos sobre la misma tajada de gastos.
pub fn export_reimbursement(
    conn: &Connection,
    rendicion_id: &str,
    output_dir: &Path,
) -> AppResult<Vec<ExportedBatch>> {
    let reimbursement = reimbursements::repository::find_by_id(conn, rendicion_id)?;
    let items = reimbursements::repository::list_items(conn, rendicion_id)?;
    let gasto_ids: Vec<String> = items.into_iter().map(|i| i.gasto_id).collect();

    let export_rows = rows::build_export_rows(conn, &gasto_ids)?;
    let batches = batch::split_into_batches(&reimbursement.correlativo, &export_rows);

    let responsable = settings::repository::get(conn)?.responsable_nombre;

    let mut exported = Vec::with_capacity(batches.len());
    for b in &batches {
        exported.push(export_batch(conn, b, &responsable, output_dir)?);
    }

    info!(
        "Rendición {} exportada en {} lote(s) a {}",
        reimbursement.correlativo,
        exported.len(),
        output_dir.display()
    );
    Ok(exported)
}

fn export_batch(
    conn: &Connection,
    batch: &ExportBatch,
    responsable: &str,
    output_dir: &Path,
) -> AppResult<ExportedBatch> {
    let xlsx_path = excel::render(batch, responsable, output_dir)?;
    let pdf_path = pdf::render(conn, batch, output_dir)?;
    Ok(ExportedBatch {
        codigo: batch.codigo.clone(),
        xlsx_path,
        pdf_path,
    })
}
