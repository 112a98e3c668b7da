//! Despacho por extensión hacia el adaptador de formato correcto.

use std::path::Path;

use crate::adapters::{image, media, office, pdf};
use crate::error::CleanError;
use crate::report::{MetadataMap, RemovalOutcome, RemovalSelection};

/// Familias de formato soportadas. Cada variante empareja una extracción con
/// una operación de limpieza; ningún adaptador guarda estado entre archivos.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFamily {
    Image,
    Pdf,
    Office,
    Media,
}

impl FileFamily {
    /// Determina la familia a partir de la extensión, sin inspeccionar el
    /// contenido. Una extensión engañosa produce el adaptador equivocado;
    /// esa es una limitación aceptada del diseño.
    pub fn from_path(path: &Path) -> Result<Self, CleanError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "heic" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "doc" | "docx" | "odt" | "ppt" | "pptx" | "xls" | "xlsx" => Ok(Self::Office),
            "mp4" | "mov" | "avi" | "mkv" => Ok(Self::Media),
            _ => Err(CleanError::UnsupportedFormat { extension }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "Imagen",
            Self::Pdf => "Documento PDF",
            Self::Office => "Documento de oficina",
            Self::Media => "Audio/Video",
        }
    }

    /// Lee la metadata embebida del archivo. Un mapa vacío significa que el
    /// archivo legítimamente no tiene metadata; un contenedor ilegible es
    /// `CleanError::Extraction`.
    pub fn extract(&self, path: &Path) -> Result<MetadataMap, CleanError> {
        match self {
            Self::Image => image::extract_image_metadata(path),
            Self::Pdf => pdf::extract_pdf_metadata(path),
            Self::Office => office::extract_office_metadata(path),
            Self::Media => media::extract_media_metadata(path),
        }
    }

    /// Escribe la copia limpia en `output` según la selección. Las familias
    /// sin eliminación segura copian sin cambios y lo reportan en el estado.
    pub fn remove(
        &self,
        path: &Path,
        output: &Path,
        selection: &RemovalSelection,
    ) -> Result<RemovalOutcome, CleanError> {
        match self {
            Self::Image => image::remove_image_metadata(path, output, selection),
            Self::Pdf => pdf::remove_pdf_metadata(path, output, selection),
            Self::Office => office::remove_office_metadata(path, output, selection),
            Self::Media => media::remove_media_metadata(path, output, selection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_map_to_their_family() {
        assert_eq!(
            FileFamily::from_path(Path::new("foto.jpeg")).unwrap(),
            FileFamily::Image
        );
        assert_eq!(
            FileFamily::from_path(Path::new("informe.pdf")).unwrap(),
            FileFamily::Pdf
        );
        assert_eq!(
            FileFamily::from_path(Path::new("acta.odt")).unwrap(),
            FileFamily::Office
        );
        assert_eq!(
            FileFamily::from_path(Path::new("charla.mkv")).unwrap(),
            FileFamily::Media
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(
            FileFamily::from_path(Path::new("FOTO.JPG")).unwrap(),
            FileFamily::Image
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let error = FileFamily::from_path(Path::new("datos.xyz")).unwrap_err();
        assert!(matches!(
            error,
            CleanError::UnsupportedFormat { extension } if extension == "xyz"
        ));
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert!(FileFamily::from_path(Path::new("sin_extension")).is_err());
    }
}
