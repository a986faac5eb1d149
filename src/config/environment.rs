/// Entorno de ejecución de la aplicación.
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// Entorno de desarrollo
    Development,
    /// Entorno de producción
    Production,
}

/// Determina el entorno de ejecución actual.
///
/// # Lógica
/// 1. Variable de entorno `ENVIRONMENT` si está definida
/// 2. Build de debug -> Development
/// 3. Build de release -> Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        return match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
    }

    if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    }
}

/// Nombre del archivo de base de datos según el entorno.
///
/// - Desarrollo: `dev_caja_chica.db`
/// - Producción: `caja_chica.db`
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_caja_chica.db",
        Environment::Production => "caja_chica.db",
    }
}
