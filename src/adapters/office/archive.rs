//! Reescritura entrada por entrada de paquetes ZIP de documentos.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::CleanError;

/// Copia el paquete aplicando una transformación por archivo interno. Las
/// entradas no transformadas conservan compresión, permisos y fecha.
pub(crate) fn rewrite_package<F>(
    path: &Path,
    output: &Path,
    mut transform: F,
) -> Result<bool, CleanError>
where
    F: FnMut(&str, Vec<u8>) -> Result<(Vec<u8>, bool), CleanError>,
{
    let source = File::open(path).map_err(|error| {
        CleanError::extraction(format!("no se pudo abrir el documento: {error}"))
    })?;
    let mut archive = ZipArchive::new(source).map_err(|error| {
        CleanError::extraction(format!("no es un paquete de documento válido: {error}"))
    })?;

    let target = File::create(output).map_err(CleanError::Write)?;
    let mut writer = ZipWriter::new(target);

    let mut modified_any = false;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|error| {
            CleanError::extraction(format!("error leyendo entrada del paquete: {error}"))
        })?;
        let name = file.name().to_string();

        let mut options = FileOptions::<'_, ()>::default().compression_method(file.compression());
        if let Some(mode) = file.unix_mode() {
            options = options.unix_permissions(mode);
        }
        if let Some(time) = file.last_modified() {
            options = options.last_modified_time(time);
        }

        if file.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|error| CleanError::Write(std::io::Error::other(error)))?;
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|error| {
            CleanError::extraction(format!("error leyendo contenido interno: {error}"))
        })?;

        let (data, changed) = transform(&name, contents)?;
        if changed {
            modified_any = true;
        }

        writer
            .start_file(name, options)
            .map_err(|error| CleanError::Write(std::io::Error::other(error)))?;
        writer.write_all(&data).map_err(CleanError::Write)?;
    }

    writer
        .finish()
        .map_err(|error| CleanError::Write(std::io::Error::other(error)))?;

    Ok(modified_any)
}
