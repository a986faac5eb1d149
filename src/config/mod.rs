mod environment;
mod initialization;

pub use environment::{get_database_filename, get_environment, Environment};
pub use initialization::{initialize_application, InitializationResult};
