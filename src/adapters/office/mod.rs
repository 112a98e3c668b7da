//! Adaptador para documentos de oficina: OOXML (`.docx/.pptx/.xlsx`), ODF
//! (`.odt`) y contenedores binarios heredados (`.doc/.ppt/.xls`).

mod archive;
mod legacy;
mod odf;
mod xml;

use std::path::Path;

use crate::error::CleanError;
use crate::output::copy_unchanged;
use crate::report::{MetadataMap, RemovalOutcome, RemovalSelection, RemovalStatus};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OfficeKind {
    Ooxml,
    Odf,
    Legacy,
}

fn office_kind(path: &Path) -> OfficeKind {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "doc" | "ppt" | "xls" => OfficeKind::Legacy,
        "odt" => OfficeKind::Odf,
        _ => OfficeKind::Ooxml,
    }
}

pub fn extract_office_metadata(path: &Path) -> Result<MetadataMap, CleanError> {
    match office_kind(path) {
        OfficeKind::Ooxml => xml::extract_core_properties(path),
        OfficeKind::Odf => odf::extract_meta_properties(path),
        OfficeKind::Legacy => legacy::extract_summary_information(path),
    }
}

/// La limpieza de documentos XML borra un conjunto fijo de campos de autoría;
/// cualquier selección (completa o por subconjunto) se trata como "eliminar
/// el conjunto fijo". Los binarios heredados se copian sin cambios.
pub fn remove_office_metadata(
    path: &Path,
    output: &Path,
    selection: &RemovalSelection,
) -> Result<RemovalOutcome, CleanError> {
    if matches!(selection, RemovalSelection::None) {
        copy_unchanged(path, output)?;
        return Ok(RemovalOutcome {
            output: output.to_path_buf(),
            status: RemovalStatus::NothingToRemove,
        });
    }

    let removed = match office_kind(path) {
        OfficeKind::Ooxml => xml::clear_core_properties(path, output)?,
        OfficeKind::Odf => odf::clear_meta_properties(path, output)?,
        OfficeKind::Legacy => {
            copy_unchanged(path, output)?;
            return Ok(RemovalOutcome {
                output: output.to_path_buf(),
                status: RemovalStatus::CopiedUnsupported {
                    reason: "los formatos binarios heredados (.doc/.ppt/.xls) no tienen \
                             eliminación segura; se copió el archivo sin cambios"
                        .to_string(),
                },
            });
        }
    };

    let status = if removed == 0 {
        RemovalStatus::NothingToRemove
    } else {
        RemovalStatus::Cleaned { removed }
    };
    Ok(RemovalOutcome {
        output: output.to_path_buf(),
        status,
    })
}
