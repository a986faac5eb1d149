use crate::export::batch::ExportBatch;
use crate::features::attachments;
use crate::features::concepts;
use crate::features::expenses::{self, models::Expense};
use crate::shared::errors::{AppError, AppResult};
use image::imageops::FilterType;
use image::GenericImageView;
use log::warn;
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Px,
};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const HEADER_Y: f32 = 287.0;

// Lado mayor máximo de una imagen incrustada, en píxeles.
const MAX_DIM: u32 = 1600;

// Caja de imagen a página completa (facturas).
const FULL_BOX_W: f32 = PAGE_W - 2.0 * MARGIN;
const FULL_BOX_H: f32 = 265.0;

// Grilla 2x2 para boletas y vouchers.
const CELL_W: f32 = 87.0;
const CELL_H: f32 = 128.0;
const CELL_XS: [f32; 2] = [MARGIN, 108.0];
const CELL_YS: [f32; 2] = [152.0, 18.0];

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    // primera página creada por el documento, aún sin consumir
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
}

impl PdfWriter {
    fn new(title: &str) -> AppResult<PdfWriter> {
        let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::export(format!("No se pudo cargar la fuente: {e}")))?;
        Ok(PdfWriter {
            doc,
            font,
            first_page: Some((page1, layer1)),
        })
    }

    fn new_page(&mut self) -> PdfLayerReference {
        let (page, layer) = match self.first_page.take() {
            Some(indices) => indices,
            None => self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1"),
        };
        self.doc.get_page(page).get_layer(layer)
    }

    fn text(&self, layer: &PdfLayerReference, text: &str, size: f32, x: f32, y: f32) {
        layer.use_text(text, size, Mm(x), Mm(y), &self.font);
    }

    fn save(self, path: &Path) -> AppResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.doc
            .save(&mut writer)
            .map_err(|e| AppError::export(format!("No se pudo escribir el PDF: {e}")))?;
        Ok(())
    }
}

/// Escribe el PDF de respaldos de un lote: `Respaldos_{codigo}.pdf`.
///
/// Recorre los mismos ids que alimentaron la planilla del lote, en el
/// mismo orden. Facturas: una página por adjunto a tamaño completo; el
/// resto va en grilla de 4 por página. Un gasto sin adjuntos deja una
/// página marcadora.
pub fn render(conn: &Connection, batch: &ExportBatch, output_dir: &Path) -> AppResult<PathBuf> {
    let path = output_dir.join(format!("Respaldos_{}.pdf", batch.codigo));
    let mut writer = PdfWriter::new(&format!("Respaldos {}", batch.codigo))?;

    for gasto_id in &batch.gasto_ids {
        let expense = match expenses::repository::find_by_id(conn, gasto_id) {
            Ok(e) => e,
            Err(AppError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        let header = expense_header(conn, &expense)?;
        let atts = attachments::repository::list_for_expense(conn, gasto_id)?;

        if atts.is_empty() {
            let layer = writer.new_page();
            writer.text(&layer, &header, 10.0, MARGIN, HEADER_Y);
            writer.text(&layer, "SIN RESPALDO ADJUNTO", 14.0, MARGIN, 273.0);
            continue;
        }

        if expense.doc_tipo.as_str().eq_ignore_ascii_case("factura") {
            for att in &atts {
                let layer = writer.new_page();
                writer.text(&layer, &header, 10.0, MARGIN, HEADER_Y);
                place_image(
                    &writer,
                    &layer,
                    &att.blob,
                    MARGIN,
                    MARGIN,
                    FULL_BOX_W,
                    FULL_BOX_H,
                );
            }
        } else {
            // grilla 2x2, nueva página cada 4 respaldos
            let mut layer = writer.new_page();
            writer.text(&layer, &header, 10.0, MARGIN, HEADER_Y);
            for (index, att) in atts.iter().enumerate() {
                let slot = index % 4;
                if index > 0 && slot == 0 {
                    layer = writer.new_page();
                    writer.text(&layer, &header, 10.0, MARGIN, HEADER_Y);
                }
                let x = CELL_XS[slot % 2];
                let y = CELL_YS[slot / 2];
                place_image(&writer, &layer, &att.blob, x, y, CELL_W, CELL_H);
            }
        }
    }

    writer.save(&path)?;
    Ok(path)
}

fn expense_header(conn: &Connection, expense: &Expense) -> AppResult<String> {
    let concepto = concepts::repository::get(conn, &expense.concept_id)?
        .map(|c| c.nombre)
        .unwrap_or_else(|| "Gasto".to_string());
    Ok(format!(
        "{} | {} {} | ${} | CR {} | CTA {}",
        concepto,
        expense.doc_tipo.as_str(),
        expense.doc_numero,
        expense.monto,
        expense.cr_codigo,
        expense.cta_codigo
    ))
}

/// Incrusta un respaldo escalado y centrado dentro de la caja dada.
///
/// Si los bytes no decodifican como imagen se deja un texto en su lugar;
/// el lote completo no se pierde por un adjunto corrupto.
fn place_image(
    writer: &PdfWriter,
    layer: &PdfLayerReference,
    bytes: &[u8],
    box_x: f32,
    box_y: f32,
    box_w: f32,
    box_h: f32,
) {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!("Respaldo no decodificable, se omite: {e}");
            writer.text(
                layer,
                "No se pudo incrustar la imagen (formato no soportado).",
                10.0,
                box_x,
                box_y + box_h / 2.0,
            );
            return;
        }
    };

    let (w, h) = decoded.dimensions();
    let scaled = if w.max(h) > MAX_DIM {
        decoded.resize(MAX_DIM, MAX_DIM, FilterType::Triangle)
    } else {
        decoded
    };
    let rgb = scaled.to_rgb8();
    let (px_w, px_h) = rgb.dimensions();

    let xobject = ImageXObject {
        width: Px(px_w as usize),
        height: Px(px_h as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    // tamaño natural en mm al DPI elegido, luego escala para caber en la caja
    let dpi = 300.0_f32;
    let natural_w = px_w as f32 * 25.4 / dpi;
    let natural_h = px_h as f32 * 25.4 / dpi;
    let scale = (box_w / natural_w).min(box_h / natural_h);
    let final_w = natural_w * scale;
    let final_h = natural_h * scale;
    let x = box_x + (box_w - final_w) / 2.0;
    let y = box_y + (box_h - final_h) / 2.0;

    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}
