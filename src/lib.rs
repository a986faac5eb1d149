pub mod config;
pub mod db;
pub mod export;
pub mod features;
pub mod shared;

use log::{info, warn};
use shared::errors::AppResult;

/// Inicializa el sistema de logging de la aplicación.
///
/// El nivel se toma de la variable `CAJA_CHICA_LOG` (o `RUST_LOG`);
/// si no está definida se usa `info`.
pub fn init_logging() {
    // Cargar .env si existe (en producción las variables vienen del entorno)
    if dotenv::dotenv().is_err() {
        // sin .env: nada que hacer
    }

    let log_level = match std::env::var("CAJA_CHICA_LOG")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();

    info!("Sistema de logging inicializado: level={log_level}");
}

/// Abre la base de datos de la aplicación lista para usar.
///
/// # Retorna
/// Conexión con migraciones y datos semilla aplicados.
pub fn open_application_database() -> AppResult<rusqlite::Connection> {
    let init_result = config::initialize_application()?;

    if init_result.is_first_run {
        info!(
            "Primera ejecución: base de datos creada en {:?}",
            init_result.database_path
        );
    }

    let conn = rusqlite::Connection::open(&init_result.database_path)
        .map_err(|e| shared::errors::AppError::Database(e.to_string()))?;

    if let Err(e) = db::migrations::run_migrations(&conn) {
        warn!("Fallo al aplicar migraciones: {e}");
        return Err(shared::errors::AppError::Database(e.to_string()));
    }

    Ok(conn)
}
