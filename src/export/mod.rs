pub mod batch;
pub mod excel;
pub mod pdf;
pub mod rows;
pub mod service;
