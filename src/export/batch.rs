use crate::export::rows::ExportRow;

/// Capacidad de una página impresa de rendición.
pub const BATCH_CAPACITY: usize = 42;

/// Lote de exportación: la misma tajada de gastos alimenta la planilla y
/// el PDF de respaldos.
///
/// Mantener filas e ids juntos en el mismo corte evita que la planilla N
/// y el PDF N describan documentos distintos si cambia la lógica de
/// agrupación de alguno de los dos.
#[derive(Debug, Clone)]
pub struct ExportBatch {
    /// Código del lote: el correlativo, con sufijo `_P{n}` si hay más de uno
    pub codigo: String,
    /// Filas enriquecidas en orden canónico de la rendición
    pub rows: Vec<ExportRow>,
    /// Ids de gasto de la misma tajada, para el PDF de respaldos
    pub gasto_ids: Vec<String>,
}

/// Parte las filas en lotes de capacidad fija, en orden canónico.
///
/// Determinista: la misma entrada produce los mismos cortes. Con un solo
/// lote el código queda igual al correlativo.
pub fn split_into_batches(correlativo: &str, rows: &[ExportRow]) -> Vec<ExportBatch> {
    let chunks: Vec<&[ExportRow]> = rows.chunks(BATCH_CAPACITY).collect();
    let multi = chunks.len() > 1;

    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| ExportBatch {
            codigo: if multi {
                format!("{}_P{}", correlativo, index + 1)
            } else {
                correlativo.to_string()
            },
            rows: chunk.to_vec(),
            gasto_ids: chunk.iter().map(|r| r.gasto_id.clone()).collect(),
        })
        .collect()
}
