use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tipo de observación que bloquea la creación de una rendición.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessKind {
    /// Falta documento (tipo y/o número)
    Doc,
    /// Falta respaldo (adjunto)
    Respaldo,
}

/// Observación individual de la validación previa a exportar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessIssue {
    pub gasto_id: String,
    pub kind: ReadinessKind,
    pub message: String,
}

/// Error unificado de la aplicación.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error de base de datos
    #[error("Error de base de datos: {0}")]
    Database(String),

    /// Error de validación de datos de entrada
    #[error("Error de validación: {0}")]
    Validation(String),

    /// Mutación sobre un gasto congelado por su rendición
    #[error("Registro bloqueado: {0}")]
    Locked(String),

    /// Transición de estado no permitida por el flujo de rendiciones
    #[error("Transición inválida: {0}")]
    InvalidTransition(String),

    /// Lista de observaciones que impiden crear la rendición completa
    #[error("La rendición tiene {} observación(es) pendiente(s)", .0.len())]
    ExportReadiness(Vec<ReadinessIssue>),

    /// Falla de E/S o de renderizado durante una exportación
    #[error("Error de exportación: {0}")]
    Export(String),

    /// Recurso inexistente
    #[error("{0}")]
    NotFound(String),

    /// Error de E/S
    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    /// Error de serialización JSON
    #[error("Error de JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Error al decodificar o reescalar una imagen
    #[error("Error de imagen: {0}")]
    Image(String),
}

/// Severidad de un error, para decidir cómo reportarlo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Recuperable por el usuario (validación, bloqueo, transición)
    Low,
    /// Reintentables (exportación, E/S)
    Medium,
    /// Requiere atención (base de datos)
    High,
}

impl AppError {
    /// Mensaje apto para mostrar al usuario.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Error en la base de datos local.".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Locked(msg) => msg.clone(),
            AppError::InvalidTransition(msg) => msg.clone(),
            AppError::ExportReadiness(issues) => {
                let mut lines = vec!["No puedes crear la rendición todavía.".to_string()];
                lines.extend(issues.iter().map(|i| format!("• {}", i.message)));
                lines.join("\n")
            }
            AppError::Export(_) => {
                "Error al exportar. La rendición quedó guardada; reintenta la exportación."
                    .to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Io(_) => "Error al leer o escribir un archivo.".to_string(),
            AppError::Json(_) => "Error al interpretar datos guardados.".to_string(),
            AppError::Image(_) => "No se pudo procesar la imagen.".to_string(),
        }
    }

    /// Severidad del error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Validation(_)
            | AppError::Locked(_)
            | AppError::InvalidTransition(_)
            | AppError::ExportReadiness(_)
            | AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::Export(_) | AppError::Io(_) | AppError::Json(_) | AppError::Image(_) => {
                ErrorSeverity::Medium
            }
            AppError::Database(_) => ErrorSeverity::High,
        }
    }

    /// Crea un error de validación.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// Crea un error de registro bloqueado.
    pub fn locked<S: Into<String>>(message: S) -> Self {
        AppError::Locked(message.into())
    }

    /// Crea un error de transición inválida a partir del estado actual y la acción.
    pub fn invalid_transition(estado: &str, accion: &str) -> Self {
        AppError::InvalidTransition(format!(
            "No se puede {accion} una rendición en estado \"{estado}\"."
        ))
    }

    /// Crea un error de recurso no encontrado.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{} no encontrado.", resource.into()))
    }

    /// Crea un error de exportación.
    pub fn export<S: Into<String>>(message: S) -> Self {
        AppError::Export(message.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message()
    }
}

/// Alias de `Result` usado en toda la aplicación.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert_eq!(
            AppError::validation("falta monto").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::locked("gasto congelado").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::export("disco lleno").severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(
            AppError::Database("corrupta".into()).severity(),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_user_message_lists_every_issue() {
        let err = AppError::ExportReadiness(vec![
            ReadinessIssue {
                gasto_id: "g1".into(),
                kind: ReadinessKind::Doc,
                message: "Falta documento (tipo/número) en: \"Peaje\"".into(),
            },
            ReadinessIssue {
                gasto_id: "g1".into(),
                kind: ReadinessKind::Respaldo,
                message: "Falta respaldo (foto) en: \"Peaje\"".into(),
            },
        ]);
        let msg = err.user_message();
        assert!(msg.contains("Falta documento"));
        assert!(msg.contains("Falta respaldo"));
    }

    #[test]
    fn test_invalid_transition_names_state_and_action() {
        let err = AppError::invalid_transition("aprobada", "enviar");
        let msg = err.user_message();
        assert!(msg.contains("aprobada"));
        assert!(msg.contains("enviar"));
    }

    #[test]
    fn test_string_conversion() {
        let err = AppError::validation("Selecciona un concepto.");
        let s: String = err.into();
        assert_eq!(s, "Selecciona un concepto.");
    }
}
