//! Errores tipados del flujo de inspección y limpieza.

use std::path::PathBuf;
use thiserror::Error;

/// Fallas que puede reportar MetaLimpia.
///
/// `Extraction` se distingue de un mapa vacío: un archivo sin metadata es un
/// resultado legítimo, un contenedor ilegible no lo es.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("no se encontró el archivo `{0}`")]
    FileNotFound(PathBuf),

    #[error("formato `.{extension}` no soportado")]
    UnsupportedFormat { extension: String },

    #[error("no se pudo leer la metadata: {detail}")]
    Extraction { detail: String },

    #[error("selección inválida: {detail}")]
    InvalidSelection { detail: String },

    #[error("no se pudo escribir la copia limpia: {0}")]
    Write(std::io::Error),

    #[error("error de entrada/salida: {0}")]
    Io(#[from] std::io::Error),
}

impl CleanError {
    pub(crate) fn extraction(detail: impl Into<String>) -> Self {
        Self::Extraction {
            detail: detail.into(),
        }
    }

    pub(crate) fn selection(detail: impl Into<String>) -> Self {
        Self::InvalidSelection {
            detail: detail.into(),
        }
    }
}
