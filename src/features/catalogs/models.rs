use serde::{Deserialize, Serialize};

/// Centro de Responsabilidad (CR).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogCr {
    pub cr_codigo: String,
    pub cr_nombre: String,
    pub activo: bool,
}

/// Cuenta contable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogAccount {
    pub cta_codigo: String,
    pub cta_nombre: String,
    pub activo: bool,
}

/// Partida presupuestaria.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogPartida {
    pub partida_codigo: String,
    pub partida_nombre: String,
    pub activo: bool,
}
