use crate::export::batch::ExportBatch;
use crate::export::rows;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Formula, Workbook};
use std::path::{Path, PathBuf};

const MONEY_FORMAT: &str = "\"$\"#,##0";

const COLUMNS: [&str; 9] = [
    "Tipo Doc",
    "Fecha",
    "N° Doc",
    "Detalle / Glosa",
    "Centro Responsabilidad",
    "Cuenta Contable",
    "Partida",
    "Clasificación",
    "Monto",
];

const COLUMN_WIDTHS: [f64; 9] = [14.0, 12.0, 14.0, 30.0, 20.0, 20.0, 18.0, 18.0, 14.0];

// Filas 0-indexadas del layout: título, bloque de encabezado y tabla.
const HEADER_FIRST_ROW: u32 = 2;
const TOTAL_HEADER_ROW: u32 = 5;
const TABLE_HEADER_ROW: u32 = 7;

/// Escribe la planilla de un lote: `{codigo}.xlsx` en `output_dir`.
///
/// Las filas se reagrupan para la planilla (no-factura primero, facturas
/// al final); el total es una fórmula sobre el rango escrito, así el
/// archivo sigue cuadrando si alguien lo edita a mano.
pub fn render(batch: &ExportBatch, responsable: &str, output_dir: &Path) -> AppResult<PathBuf> {
    let path = output_dir.join(format!("{}.xlsx", batch.codigo));
    write_workbook(batch, responsable, &path)
        .map_err(|e| AppError::export(format!("No se pudo generar {}: {e}", path.display())))?;
    Ok(path)
}

fn write_workbook(
    batch: &ExportBatch,
    responsable: &str,
    path: &Path,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name("Rendicion")?;

    let title = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_align(FormatAlign::Center);
    let label = Format::new().set_bold();
    let table_header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xEFEFEF))
        .set_border(FormatBorder::Thin);
    let money = Format::new().set_num_format(MONEY_FORMAT);
    let money_bold = Format::new().set_bold().set_num_format(MONEY_FORMAT);

    worksheet.merge_range(0, 0, 0, 8, "Rendición Fondo Reembolso Gastos", &title)?;

    let labels = [
        ("N° Rendición", batch.codigo.clone()),
        ("Responsable", responsable.to_string()),
        ("Fecha Generación", time::format_date_cl(&time::now_rfc3339())),
    ];
    for (offset, (name, value)) in labels.iter().enumerate() {
        let row = HEADER_FIRST_ROW + offset as u32;
        worksheet.write_with_format(row, 0, *name, &label)?;
        worksheet.write_string(row, 1, value)?;
    }
    worksheet.write_with_format(TOTAL_HEADER_ROW, 0, "Total Rendición", &label)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_with_format(TABLE_HEADER_ROW, col as u16, *name, &table_header)?;
    }

    let grouped = rows::group_for_worksheet(&batch.rows);
    let first_data_row = TABLE_HEADER_ROW + 1;
    for (offset, row) in grouped.iter().enumerate() {
        let r = first_data_row + offset as u32;
        worksheet.write_string(r, 0, &row.doc_tipo)?;
        worksheet.write_string(r, 1, time::format_date_cl(&row.fecha))?;
        worksheet.write_string(r, 2, &row.doc_numero)?;
        worksheet.write_string(r, 3, &row.detalle)?;
        worksheet.write_string(r, 4, row.cr_display())?;
        worksheet.write_string(r, 5, row.cta_display())?;
        worksheet.write_string(r, 6, row.partida_display())?;
        worksheet.write_string(r, 7, &row.clasificacion_codigo)?;
        worksheet.write_number_with_format(r, 8, row.monto as f64, &money)?;
    }

    let total_row = first_data_row + grouped.len() as u32;
    worksheet.write_with_format(total_row, 7, "Total General", &label)?;
    if grouped.is_empty() {
        worksheet.write_number_with_format(total_row, 8, 0.0, &money_bold)?;
        worksheet.write_number_with_format(TOTAL_HEADER_ROW, 1, 0.0, &money_bold)?;
    } else {
        // rango 1-based de la columna I sobre las filas recién escritas
        let sum = Formula::new(format!(
            "SUM(I{}:I{})",
            first_data_row + 1,
            first_data_row + grouped.len() as u32
        ));
        worksheet.write_formula_with_format(total_row, 8, sum.clone(), &money_bold)?;
        worksheet.write_formula_with_format(TOTAL_HEADER_ROW, 1, sum, &money_bold)?;
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    worksheet.autofilter(TABLE_HEADER_ROW, 0, TABLE_HEADER_ROW, 8)?;

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::rows::ExportRow;

    fn row(n: usize, doc_tipo: &str) -> ExportRow {
        ExportRow {
            gasto_id: format!("g{n}"),
            fecha: "2024-03-02".into(),
            doc_tipo: doc_tipo.to_string(),
            doc_numero: n.to_string(),
            detalle: "Peaje ruta 68".into(),
            cr_codigo: "0001".into(),
            cr_nombre: "Gerencia Constructora".into(),
            cta_codigo: "510100".into(),
            cta_nombre: "Gastos de Viaje".into(),
            partida_codigo: "01".into(),
            partida_nombre: "Operación".into(),
            clasificacion_codigo: String::new(),
            concepto_nombre: "Peaje".into(),
            monto: 4500,
        }
    }

    #[test]
    fn test_render_writes_file_named_after_batch() {
        let dir = tempfile::tempdir().unwrap();
        let batch = ExportBatch {
            codigo: "RC-2024-0007".into(),
            rows: vec![row(1, "Boleta"), row(2, "Factura")],
            gasto_ids: vec!["g1".into(), "g2".into()],
        };

        let path = render(&batch, "María Pérez", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "RC-2024-0007.xlsx");
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_render_suffixed_batch_code() {
        let dir = tempfile::tempdir().unwrap();
        let batch = ExportBatch {
            codigo: "RC-2024-0007_P2".into(),
            rows: vec![row(1, "Voucher")],
            gasto_ids: vec!["g1".into()],
        };

        let path = render(&batch, "", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "RC-2024-0007_P2.xlsx");
    }

    #[test]
    fn test_render_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-existe");
        let batch = ExportBatch {
            codigo: "RC-2024-0001".into(),
            rows: vec![row(1, "Boleta")],
            gasto_ids: vec!["g1".into()],
        };

        let err = render(&batch, "", &missing).unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }
}
