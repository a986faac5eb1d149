use serde::{Deserialize, Serialize};

/// Modos de traslado disponibles.
pub const TRANSFER_TIPOS: [&str; 6] = [
    "Vehículo propio",
    "Auto arrendado",
    "Taxi / Uber",
    "Avión",
    "Bus",
    "Otro",
];

/// Estado de un traslado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferEstado {
    /// Registrado, aún sin gasto asociado
    Pendiente,
    /// Convertido en gasto
    Usado,
}

impl TransferEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferEstado::Pendiente => "pendiente",
            TransferEstado::Usado => "usado",
        }
    }

    pub fn from_str(s: &str) -> Option<TransferEstado> {
        match s {
            "pendiente" => Some(TransferEstado::Pendiente),
            "usado" => Some(TransferEstado::Usado),
            _ => None,
        }
    }
}

/// Traslado registrado, convertible en gasto.
///
/// Invariante: `estado == Usado` si y solo si `gasto_id` está presente.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transfer {
    pub transfer_id: String,
    /// Fecha del movimiento, ISO `YYYY-MM-DD`
    pub fecha: String,
    pub origen: String,
    pub destino: String,
    /// Modo de transporte (uno de `TRANSFER_TIPOS`)
    pub tipo: String,
    pub cr_codigo: String,
    /// Etiqueta de visita/viaje para agrupar traslados
    pub visita: String,
    pub notas: String,
    pub estado: TransferEstado,
    pub gasto_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Datos de entrada para registrar un traslado.
#[derive(Debug, Deserialize, Clone)]
pub struct TransferInput {
    pub fecha: String,
    pub origen: String,
    pub destino: String,
    pub tipo: String,
    pub cr_codigo: String,
    pub visita: String,
    pub notas: String,
}

/// Prefill de gasto construido desde traslados seleccionados.
#[derive(Debug, Serialize, Clone)]
pub struct ExpensePrefill {
    pub cr_codigo: String,
    pub visita: String,
    pub detalle: String,
    pub transfer_ids: Vec<String>,
}
