use serde::{Deserialize, Serialize};

/// Estado de una rendición.
///
/// Flujo: `borrador -> enviada -> (devuelta | aprobada)`, con re-envío
/// `devuelta -> enviada`. `aprobada` es terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReimbursementEstado {
    Borrador,
    Enviada,
    Devuelta,
    Aprobada,
}

impl ReimbursementEstado {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReimbursementEstado::Borrador => "borrador",
            ReimbursementEstado::Enviada => "enviada",
            ReimbursementEstado::Devuelta => "devuelta",
            ReimbursementEstado::Aprobada => "aprobada",
        }
    }

    pub fn from_str(s: &str) -> Option<ReimbursementEstado> {
        match s {
            "borrador" => Some(ReimbursementEstado::Borrador),
            "enviada" => Some(ReimbursementEstado::Enviada),
            "devuelta" => Some(ReimbursementEstado::Devuelta),
            "aprobada" => Some(ReimbursementEstado::Aprobada),
            _ => None,
        }
    }

    /// Enviada y aprobada congelan los gastos miembros.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            ReimbursementEstado::Enviada | ReimbursementEstado::Aprobada
        )
    }
}

/// Rendición: lote de gastos enviados juntos a aprobación.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reimbursement {
    pub rendicion_id: String,
    /// Correlativo legible, p. ej. `RC-2024-0007`
    pub correlativo: String,
    pub fecha_creacion: String,
    pub estado: ReimbursementEstado,
    pub motivo_devuelta: Option<String>,
    /// Total derivado de los montos al crear; no es autoritativo
    pub total: i64,
    pub updated_at: String,
}

/// Pertenencia de un gasto a una rendición con su orden canónico.
///
/// `orden` es 1-based, denso, asignado al crear la rendición; define los
/// cortes de paginación de las exportaciones y se preserva entre
/// re-exportaciones.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReimbursementItem {
    pub item_id: String,
    pub rendicion_id: String,
    pub gasto_id: String,
    pub orden: i64,
}
