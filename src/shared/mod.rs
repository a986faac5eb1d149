pub mod collation;
pub mod errors;
pub mod time;
