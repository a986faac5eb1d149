use crate::features::attachments::models::Attachment;
use crate::features::attachments::repository;
use crate::features::expenses;
use crate::features::reimbursements;
use crate::shared::errors::AppResult;
use crate::shared::time;
use image::imageops::FilterType;
use log::warn;
use rusqlite::Connection;
use std::io::Cursor;
use uuid::Uuid;

/// Dimensión máxima (px) del derivado comprimido.
const MAX_DIM: u32 = 1600;
/// Calidad JPEG del derivado (equivale al 0.82 del origen).
const JPEG_QUALITY: u8 = 82;

/// Resultado de la compresión: bytes finales más el mime/nombre efectivos.
struct CompressedFile {
    bytes: Vec<u8>,
    mime_type: String,
    filename: String,
}

/// Genera el derivado comprimido de un archivo capturado.
///
/// Las imágenes se reescalan a una dimensión máxima y se recodifican como
/// JPEG; cualquier otro payload (o una imagen que no se pudo decodificar)
/// se guarda tal cual.
fn compress_file(filename: &str, mime_type: &str, bytes: Vec<u8>) -> CompressedFile {
    if !mime_type.starts_with("image/") {
        return CompressedFile {
            bytes,
            mime_type: mime_type.to_string(),
            filename: filename.to_string(),
        };
    }

    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!("No se pudo decodificar la imagen \"{filename}\": {e}; se guarda sin comprimir");
            return CompressedFile {
                bytes,
                mime_type: mime_type.to_string(),
                filename: filename.to_string(),
            };
        }
    };

    let resized = if decoded.width().max(decoded.height()) > MAX_DIM {
        decoded.resize(MAX_DIM, MAX_DIM, FilterType::Triangle)
    } else {
        decoded
    };

    // JPEG no admite alfa
    let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut cursor,
        JPEG_QUALITY,
    );
    match rgb.write_with_encoder(encoder) {
        Ok(()) => CompressedFile {
            bytes: out,
            mime_type: "image/jpeg".to_string(),
            filename: format!("{filename}.jpg"),
        },
        Err(e) => {
            warn!("Fallo al recodificar \"{filename}\": {e}; se guarda sin comprimir");
            CompressedFile {
                bytes,
                mime_type: mime_type.to_string(),
                filename: filename.to_string(),
            }
        }
    }
}

/// Adjunta un archivo a un gasto.
///
/// Los adjuntos son aditivos: nunca reemplazan a los existentes. Si la
/// rendición dueña del gasto está congelada, la operación falla con
/// `Locked` y no persiste nada.
pub fn attach_file(
    conn: &Connection,
    gasto_id: &str,
    filename: &str,
    mime_type: &str,
    bytes: Vec<u8>,
) -> AppResult<Attachment> {
    let expense = expenses::repository::find_by_id(conn, gasto_id)?;
    reimbursements::service::ensure_expense_unlocked(conn, &expense)?;

    let compressed = compress_file(filename, mime_type, bytes);

    let attachment = Attachment {
        adjunto_id: Uuid::new_v4().to_string(),
        gasto_id: gasto_id.to_string(),
        filename: compressed.filename,
        mime_type: compressed.mime_type,
        blob: compressed.bytes,
        created_at: time::now_rfc3339(),
    };

    repository::insert(conn, &attachment)?;
    Ok(attachment)
}

/// Elimina un adjunto, sin efecto sobre el estado del gasto.
pub fn remove_attachment(conn: &Connection, adjunto_id: &str) -> AppResult<()> {
    repository::delete(conn, adjunto_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::shared::errors::AppError;
    use crate::features::concepts::models::Concept;
    use crate::features::expenses::models::{DocTipo, ExpenseInput};

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn add_expense(conn: &mut Connection) -> String {
        let concept = Concept {
            concept_id: Uuid::new_v4().to_string(),
            nombre: "Peaje".into(),
            cta_default_codigo: "510100".into(),
            partida_default_codigo: "01".into(),
            clasificacion_default_codigo: String::new(),
            requiere_doc: false,
            requiere_respaldo: false,
            favorito: false,
            activo: true,
        };
        crate::features::concepts::repository::upsert(conn, &concept).unwrap();

        let input = ExpenseInput {
            fecha: "2024-03-02".into(),
            concept_id: concept.concept_id,
            monto: 3500,
            doc_tipo: DocTipo::Boleta,
            doc_numero: "1".into(),
            detalle: "Peaje".into(),
            cr_codigo: "0001".into(),
            cta_codigo: "510100".into(),
            partida_codigo: "01".into(),
            clasificacion_codigo: String::new(),
            source: None,
        };
        expenses::service::create_expense(conn, input)
            .unwrap()
            .gasto_id
    }

    fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_attach_compresses_oversized_image() {
        let mut conn = create_test_db();
        let gasto_id = add_expense(&mut conn);

        let png = synthetic_png(3200, 2400);
        let att = attach_file(&conn, &gasto_id, "boleta", "image/png", png).unwrap();

        assert_eq!(att.mime_type, "image/jpeg");
        assert_eq!(att.filename, "boleta.jpg");

        let decoded = image::load_from_memory(&att.blob).unwrap();
        assert!(decoded.width() <= 1600);
        assert!(decoded.height() <= 1600);
    }

    #[test]
    fn test_attach_keeps_non_image_verbatim() {
        let mut conn = create_test_db();
        let gasto_id = add_expense(&mut conn);

        let bytes = b"%PDF-1.4 contenido".to_vec();
        let att = attach_file(&conn, &gasto_id, "factura.pdf", "application/pdf", bytes.clone())
            .unwrap();

        assert_eq!(att.blob, bytes);
        assert_eq!(att.mime_type, "application/pdf");
    }

    #[test]
    fn test_attach_is_additive() {
        let mut conn = create_test_db();
        let gasto_id = add_expense(&mut conn);

        attach_file(&conn, &gasto_id, "a", "image/png", synthetic_png(10, 10)).unwrap();
        attach_file(&conn, &gasto_id, "b", "image/png", synthetic_png(10, 10)).unwrap();

        assert_eq!(
            repository::count_for_expense(&conn, &gasto_id).unwrap(),
            2
        );
    }

    #[test]
    fn test_attach_missing_expense_fails() {
        let conn = create_test_db();
        let result = attach_file(&conn, "nope", "x", "image/png", vec![]);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn test_attach_rejected_while_reimbursement_frozen() {
        let mut conn = create_test_db();
        let gasto_id = add_expense(&mut conn);
        attach_file(&conn, &gasto_id, "a", "image/png", synthetic_png(10, 10)).unwrap();

        let r = reimbursements::service::create_reimbursement(&mut conn, &[gasto_id.clone()])
            .unwrap();
        reimbursements::service::submit(&conn, &r.rendicion_id).unwrap();

        let err = attach_file(&conn, &gasto_id, "b", "image/png", synthetic_png(10, 10))
            .unwrap_err();
        assert!(matches!(err, AppError::Locked(_)));
        // no se persistió nada nuevo
        assert_eq!(repository::count_for_expense(&conn, &gasto_id).unwrap(), 1);

        // devuelta vuelve a permitir adjuntar
        reimbursements::service::return_to_draft(&conn, &r.rendicion_id, "falta foto").unwrap();
        attach_file(&conn, &gasto_id, "b", "image/png", synthetic_png(10, 10)).unwrap();
        assert_eq!(repository::count_for_expense(&conn, &gasto_id).unwrap(), 2);
    }
}
