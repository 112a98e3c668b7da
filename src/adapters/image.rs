//! Metadata EXIF de imágenes: lectura con kamadak-exif y reescritura del
//! contenedor con img-parts, preservando los bytes de imagen intactos.

use exif::experimental::Writer;
use exif::{In, Reader, Tag};
use img_parts::{Bytes, DynImage, ImageEXIF};
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::Path;

use crate::error::CleanError;
use crate::output::{copy_unchanged, write_via_temp};
use crate::report::{MetadataEntry, MetadataMap, RemovalOutcome, RemovalSelection, RemovalStatus};

/// Lee el bloque EXIF y lo presenta como mapa ordenado. La ausencia de EXIF
/// produce un mapa vacío; un contenedor ilegible es un error de extracción.
pub fn extract_image_metadata(path: &Path) -> Result<MetadataMap, CleanError> {
    let Some(exif) = read_exif_container(path)? else {
        return Ok(MetadataMap::new());
    };

    let mut map = MetadataMap::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        // Para tags conocidos el nombre legible; los desconocidos conservan
        // su identificador numérico como nombre.
        let key = field.tag.to_string();
        let value = field.display_value().with_unit(&exif).to_string();
        let entry = if is_sensitive_tag(field.tag) {
            MetadataEntry::sensitive(key, value)
        } else {
            MetadataEntry::new(key, value)
        };
        map.push(entry);
    }
    Ok(map)
}

/// Reescribe la imagen sin los campos seleccionados. El resto del contenedor
/// queda byte a byte igual; si el formato no permite esa garantía (HEIC), se
/// copia sin cambios y se reporta como no soportado.
pub fn remove_image_metadata(
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

    let source = fs::read(path)?;
    let parsed = DynImage::from_bytes(Bytes::from(source)).ok().flatten();

    let Some(mut container) = parsed else {
        copy_unchanged(path, output)?;
        return Ok(RemovalOutcome {
            output: output.to_path_buf(),
            status: RemovalStatus::CopiedUnsupported {
                reason: "este contenedor de imagen no permite una reescritura segura".to_string(),
            },
        });
    };

    let Some(raw_exif) = container.exif() else {
        copy_unchanged(path, output)?;
        return Ok(RemovalOutcome {
            output: output.to_path_buf(),
            status: RemovalStatus::NothingToRemove,
        });
    };

    let removed = match selection {
        RemovalSelection::All => {
            let removed = Reader::new()
                .read_raw(raw_exif.to_vec())
                .map(|exif| exif.fields().filter(|f| f.ifd_num == In::PRIMARY).count())
                .unwrap_or(0);
            container.set_exif(None);
            removed
        }
        RemovalSelection::Subset(keys) => {
            let exif = Reader::new().read_raw(raw_exif.to_vec()).map_err(|error| {
                CleanError::extraction(format!("no se pudo decodificar el bloque EXIF: {error}"))
            })?;

            // Solo el IFD primario se muestra y se selecciona; los campos de
            // otros IFDs (miniatura) se conservan intactos en la reescritura.
            let kept: Vec<_> = exif
                .fields()
                .filter(|f| f.ifd_num != In::PRIMARY || !keys.contains(&f.tag.to_string()))
                .collect();
            let removed = exif.fields().count() - kept.len();

            if kept.is_empty() {
                container.set_exif(None);
            } else if removed > 0 {
                let mut writer = Writer::new();
                for field in &kept {
                    writer.push_field(field);
                }
                let mut buffer = Cursor::new(Vec::new());
                writer.write(&mut buffer, false).map_err(|error| {
                    CleanError::extraction(format!(
                        "no se pudo reconstruir el bloque EXIF reducido: {error}"
                    ))
                })?;
                container.set_exif(Some(Bytes::from(buffer.into_inner())));
            }
            removed
        }
        RemovalSelection::None => unreachable!("caso atendido arriba"),
    };

    if removed == 0 {
        copy_unchanged(path, output)?;
        return Ok(RemovalOutcome {
            output: output.to_path_buf(),
            status: RemovalStatus::NothingToRemove,
        });
    }

    write_via_temp(output, |temp| {
        let file = File::create(temp).map_err(CleanError::Write)?;
        container
            .encoder()
            .write_to(file)
            .map(|_| ())
            .map_err(|error| CleanError::Write(io::Error::other(error)))
    })?;

    Ok(RemovalOutcome {
        output: output.to_path_buf(),
        status: RemovalStatus::Cleaned { removed },
    })
}

/// Distingue "no hay bloque EXIF" de un contenedor que no se pudo leer.
fn read_exif_container(path: &Path) -> Result<Option<exif::Exif>, CleanError> {
    let file = File::open(path)
        .map_err(|error| CleanError::extraction(format!("no se pudo abrir la imagen: {error}")))?;
    let mut reader = BufReader::new(file);

    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => Ok(None),
        Err(error) => Err(CleanError::extraction(format!(
            "no se pudo decodificar la metadata EXIF: {error}"
        ))),
    }
}

fn is_sensitive_tag(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::GPSLatitude
            | Tag::GPSLongitude
            | Tag::GPSAltitude
            | Tag::GPSLatitudeRef
            | Tag::GPSLongitudeRef
            | Tag::Artist
    )
}
