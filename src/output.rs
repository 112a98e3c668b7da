//! Resolución de rutas de salida y escritura segura de las copias limpias.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CleanError;

/// Directorio dedicado para las copias limpias, junto al archivo original.
pub const OUTPUT_DIR_NAME: &str = "limpios";

/// Calcula la ruta de salida dentro de `limpios/`, creando el directorio si
/// hace falta. Nunca se pisa el archivo original.
pub fn resolve_output_path(input: &Path) -> Result<PathBuf, CleanError> {
    let parent = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = parent.join(OUTPUT_DIR_NAME);
    fs::create_dir_all(&dir).map_err(CleanError::Write)?;

    let name = input
        .file_name()
        .ok_or_else(|| CleanError::FileNotFound(input.to_path_buf()))?;
    Ok(dir.join(name))
}

/// Nombre temporal oculto en el mismo directorio que `target`.
fn temp_output_path(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let stem = target.file_stem().unwrap_or_default().to_string_lossy();
    let extension = target.extension().unwrap_or_default().to_string_lossy();

    // Usar timestamp para evitar colisiones entre ejecuciones consecutivas.
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    parent.join(format!(".{}_temp_{}.{}", stem, timestamp, extension))
}

/// Escribe a través de un archivo temporal y renombra al terminar. Si la
/// escritura falla, el temporal se elimina y no queda salida a medias.
pub fn write_via_temp<F>(target: &Path, write: F) -> Result<(), CleanError>
where
    F: FnOnce(&Path) -> Result<(), CleanError>,
{
    let temp = temp_output_path(target);
    match write(&temp) {
        Ok(()) => fs::rename(&temp, target).map_err(|error| {
            let _ = fs::remove_file(&temp);
            CleanError::Write(error)
        }),
        Err(error) => {
            let _ = fs::remove_file(&temp);
            Err(error)
        }
    }
}

/// Copia el archivo sin modificaciones, para formatos sin eliminación segura.
pub fn copy_unchanged(input: &Path, output: &Path) -> Result<(), CleanError> {
    write_via_temp(output, |temp| {
        fs::copy(input, temp).map(|_| ()).map_err(CleanError::Write)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_output_path_creates_dedicated_directory() -> std::io::Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("informe.pdf");
        fs::write(&input, b"contenido")?;

        let output = resolve_output_path(&input).expect("la ruta de salida debería resolverse");

        assert_eq!(output, dir.path().join(OUTPUT_DIR_NAME).join("informe.pdf"));
        assert!(dir.path().join(OUTPUT_DIR_NAME).is_dir());
        Ok(())
    }

    #[test]
    fn write_via_temp_failure_leaves_no_partial_file() -> std::io::Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("salida.bin");

        let result = write_via_temp(&target, |temp| {
            fs::write(temp, b"a medias").map_err(CleanError::Write)?;
            Err(CleanError::extraction("falla simulada"))
        });

        assert!(result.is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn copy_unchanged_preserves_bytes() -> std::io::Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("original.mkv");
        fs::write(&input, b"bytes intactos")?;
        let output = dir.path().join("copia.mkv");

        copy_unchanged(&input, &output).expect("la copia sin cambios debería funcionar");

        assert_eq!(fs::read(&output)?, fs::read(&input)?);
        Ok(())
    }
}
