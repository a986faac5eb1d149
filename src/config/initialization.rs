use crate::config::{get_database_filename, get_environment, Environment};
use crate::shared::errors::{AppError, AppResult};
use log::info;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

/// Resultado de la inicialización de la aplicación.
#[derive(Debug)]
pub struct InitializationResult {
    /// Si es la primera ejecución
    pub is_first_run: bool,
    /// Directorio de datos de la aplicación
    pub app_data_dir: PathBuf,
    /// Ruta del archivo de base de datos
    pub database_path: PathBuf,
    /// Entorno de ejecución
    pub environment: Environment,
}

/// Inicializa la aplicación.
///
/// # Procesamiento
/// 1. Crea el directorio de datos si no existe
/// 2. Detecta la primera ejecución (ausencia del archivo de base de datos)
/// 3. Crea la base de datos y aplica migraciones y datos semilla
pub fn initialize_application() -> AppResult<InitializationResult> {
    let environment = get_environment();

    let app_data_dir = ensure_app_data_directory()?;

    let db_filename = get_database_filename(environment.clone());
    let database_path = app_data_dir.join(db_filename);

    let is_first_run = !database_path.exists();

    initialize_database_file(&database_path)?;

    if is_first_run {
        info!(
            "Primera ejecución en {environment:?}: base de datos creada en {database_path:?}"
        );
    }

    Ok(InitializationResult {
        is_first_run,
        app_data_dir,
        database_path,
        environment,
    })
}

/// Garantiza la existencia del directorio de datos de la aplicación.
fn ensure_app_data_directory() -> AppResult<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| {
        AppError::Database("No se pudo determinar el directorio de datos del sistema".into())
    })?;
    let app_data_dir = base.join("caja-chica");

    if !app_data_dir.exists() {
        fs::create_dir_all(&app_data_dir)?;
        info!("Directorio de datos creado: {app_data_dir:?}");
    }

    Ok(app_data_dir)
}

/// Crea el archivo de base de datos y aplica las migraciones.
fn initialize_database_file(database_path: &PathBuf) -> AppResult<()> {
    let conn = Connection::open(database_path)
        .map_err(|e| AppError::Database(format!("No se pudo abrir la base de datos: {e}")))?;

    crate::db::migrations::run_migrations(&conn)
        .map_err(|e| AppError::Database(format!("Fallo al aplicar migraciones: {e}")))?;

    Ok(())
}
