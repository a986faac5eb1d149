use serde::{Deserialize, Serialize};

/// Respaldo adjunto de un gasto (foto de boleta, factura, etc.).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Attachment {
    pub adjunto_id: String,
    pub gasto_id: String,
    pub filename: String,
    pub mime_type: String,
    #[serde(skip_serializing, default)]
    pub blob: Vec<u8>,
    pub created_at: String,
}
