//! Modelos compartidos para representar la metadata extraída de un archivo.

use serde::Serialize;
use std::path::PathBuf;

/// Una propiedad de metadata en el espacio de nombres del formato de origen
/// (nombre de tag EXIF, clave del diccionario Info, propiedad de documento).
#[derive(Clone, Debug, Serialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
    /// Marca campos que pueden revelar identidad o ubicación (autor, GPS).
    pub sensitive: bool,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    pub fn sensitive(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            sensitive: true,
        }
    }
}

/// Mapa ordenado de metadata producido por una extracción.
///
/// El orden de inserción es el orden de lectura del formato; los índices que
/// ve el usuario solo tienen sentido contra este snapshot exacto.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetadataMap {
    entries: Vec<MetadataEntry>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MetadataEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.key.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }
}

/// Decisión del usuario sobre qué eliminar, resuelta contra un snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemovalSelection {
    All,
    None,
    Subset(Vec<String>),
}

/// Resultado de una operación de limpieza. Los caminos degradados siempre
/// quedan explícitos en el estado, nunca como un no-op silencioso.
#[derive(Clone, Debug)]
pub struct RemovalOutcome {
    pub output: PathBuf,
    pub status: RemovalStatus,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemovalStatus {
    /// Se reescribió el archivo sin los campos seleccionados.
    Cleaned { removed: usize },
    /// No había nada que eliminar; la copia es idéntica al original.
    NothingToRemove,
    /// El formato no permite una eliminación segura; se copió sin cambios.
    CopiedUnsupported { reason: String },
}
