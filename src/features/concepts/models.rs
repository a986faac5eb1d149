use serde::{Deserialize, Serialize};

/// Concepto de gasto: plantilla reutilizable con códigos contables por
/// defecto y requisitos de documento/respaldo.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Concept {
    pub concept_id: String,
    pub nombre: String,
    pub cta_default_codigo: String,
    pub partida_default_codigo: String,
    pub clasificacion_default_codigo: String,
    pub requiere_doc: bool,
    pub requiere_respaldo: bool,
    pub favorito: bool,
    pub activo: bool,
}
