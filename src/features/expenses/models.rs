use serde::{Deserialize, Serialize};

/// Tipos de documento aceptados.
pub const DOC_TIPOS: [&str; 4] = ["Boleta", "Factura", "Voucher", "SinDoc"];

/// Tipo de documento de un gasto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocTipo {
    Boleta,
    Factura,
    Voucher,
    /// Sin documento
    SinDoc,
}

impl DocTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocTipo::Boleta => "Boleta",
            DocTipo::Factura => "Factura",
            DocTipo::Voucher => "Voucher",
            DocTipo::SinDoc => "SinDoc",
        }
    }

    pub fn from_str(s: &str) -> Option<DocTipo> {
        match s {
            "Boleta" => Some(DocTipo::Boleta),
            "Factura" => Some(DocTipo::Factura),
            "Voucher" => Some(DocTipo::Voucher),
            "SinDoc" => Some(DocTipo::SinDoc),
            _ => None,
        }
    }
}

/// Estado de un gasto dentro del flujo de rendiciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseEstado {
    /// Aún no incluido en una rendición
    Pendiente,
    /// Incluido en una rendición
    Rendido,
}

impl ExpenseEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseEstado::Pendiente => "pendiente",
            ExpenseEstado::Rendido => "rendido",
        }
    }

    pub fn from_str(s: &str) -> Option<ExpenseEstado> {
        match s {
            "pendiente" => Some(ExpenseEstado::Pendiente),
            "rendido" => Some(ExpenseEstado::Rendido),
            _ => None,
        }
    }
}

/// Procedencia de un gasto generado desde traslados.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpenseSource {
    Transfers { transfer_ids: Vec<String> },
}

/// Gasto individual con documento y clasificación contable.
///
/// Invariante: `estado == Rendido` si y solo si `rendicion_id` está presente.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
    pub gasto_id: String,
    /// Fecha del gasto, ISO `YYYY-MM-DD`
    pub fecha: String,
    pub concept_id: String,
    /// Monto en pesos (unidad mínima, sin decimales)
    pub monto: i64,
    pub doc_tipo: DocTipo,
    pub doc_numero: String,
    pub detalle: String,
    pub cr_codigo: String,
    pub cta_codigo: String,
    pub partida_codigo: String,
    pub clasificacion_codigo: String,
    pub estado: ExpenseEstado,
    pub rendicion_id: Option<String>,
    pub source: Option<ExpenseSource>,
    pub created_at: String,
    pub updated_at: String,
}

/// Datos de entrada para crear o actualizar un gasto.
#[derive(Debug, Deserialize, Clone)]
pub struct ExpenseInput {
    pub fecha: String,
    pub concept_id: String,
    pub monto: i64,
    pub doc_tipo: DocTipo,
    pub doc_numero: String,
    pub detalle: String,
    pub cr_codigo: String,
    pub cta_codigo: String,
    pub partida_codigo: String,
    pub clasificacion_codigo: String,
    pub source: Option<ExpenseSource>,
}
