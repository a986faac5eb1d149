use serde::{Deserialize, Serialize};

/// Configuración de la aplicación (fila única `key='app'`).
///
/// Incluye la identidad del responsable que rinde, el CR por defecto y el
/// correlativo de rendiciones.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub responsable_nombre: String,
    pub responsable_rut: String,
    pub cargo: String,
    pub telefono: String,
    pub empresa: String,
    pub banco: String,
    pub tipo_cuenta: String,
    pub numero_cuenta: String,
    pub cr_default_codigo: String,
    pub correlativo_prefix: String,
    pub correlativo_next_number: i64,
}

/// Actualización parcial de la configuración: solo los campos presentes
/// se sobreescriben, igual que el `saveSettings(patch)` del origen.
#[derive(Debug, Deserialize, Default)]
pub struct SettingsPatch {
    pub responsable_nombre: Option<String>,
    pub responsable_rut: Option<String>,
    pub cargo: Option<String>,
    pub telefono: Option<String>,
    pub empresa: Option<String>,
    pub banco: Option<String>,
    pub tipo_cuenta: Option<String>,
    pub numero_cuenta: Option<String>,
    pub cr_default_codigo: Option<String>,
    pub correlativo_prefix: Option<String>,
    pub correlativo_next_number: Option<i64>,
}
