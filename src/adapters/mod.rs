//! Adaptadores de extracción y limpieza por familia de archivo.

pub mod image;
pub mod media;
pub mod office;
pub mod pdf;
