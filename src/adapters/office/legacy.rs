//! Lectura del property set `SummaryInformation` en contenedores binarios
//! heredados (.doc/.ppt/.xls). Solo lectura: estos formatos no tienen un
//! camino de eliminación seguro y se copian sin cambios.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CleanError;
use crate::report::{MetadataEntry, MetadataMap};

pub(crate) const SUMMARY_STREAM: &str = "/\u{5}SummaryInformation";

// Identificadores PIDSI del property set estándar.
const PIDSI_FIELDS: [(u32, &str, bool); 9] = [
    (2, "Title", false),
    (3, "Subject", false),
    (4, "Author", true),
    (5, "Keywords", false),
    (6, "Comments", false),
    (8, "LastAuthor", true),
    (12, "CreateTime", false),
    (13, "LastSaveTime", false),
    (18, "AppName", false),
];

pub(crate) fn extract_summary_information(path: &Path) -> Result<MetadataMap, CleanError> {
    let file = File::open(path).map_err(|error| {
        CleanError::extraction(format!("no se pudo abrir el documento: {error}"))
    })?;
    let mut container = cfb::CompoundFile::open(file).map_err(|error| {
        CleanError::extraction(format!("no es un contenedor OLE válido: {error}"))
    })?;

    let mut map = MetadataMap::new();
    if !container.exists(SUMMARY_STREAM) {
        return Ok(map);
    }

    let mut data = Vec::new();
    container
        .open_stream(SUMMARY_STREAM)
        .and_then(|mut stream| stream.read_to_end(&mut data))
        .map_err(|error| {
            CleanError::extraction(format!("no se pudo leer SummaryInformation: {error}"))
        })?;

    let values = parse_property_set(&data).ok_or_else(|| {
        CleanError::extraction("el property set SummaryInformation está corrupto".to_string())
    })?;

    for (id, key, sensitive) in PIDSI_FIELDS {
        if let Some(value) = values.get(&id)
            && !value.is_empty()
        {
            let entry = if sensitive {
                MetadataEntry::sensitive(key, value.clone())
            } else {
                MetadataEntry::new(key, value.clone())
            };
            map.push(entry);
        }
    }
    Ok(map)
}

/// Parser mínimo del formato PropertySetStream (MS-OLEPS): cabecera, una
/// sección, y valores VT_LPSTR/VT_LPWSTR/VT_FILETIME/enteros.
fn parse_property_set(data: &[u8]) -> Option<HashMap<u32, String>> {
    if u16_le(data, 0)? != 0xFFFE {
        return None;
    }
    let set_count = u32_le(data, 24)?;
    if set_count == 0 {
        return None;
    }
    // Cabecera fija (28 bytes) + FMTID (16) + offset de la primera sección.
    let section_offset = u32_le(data, 44)? as usize;
    let section = data.get(section_offset..)?;

    let property_count = u32_le(section, 4)? as usize;
    let mut values = HashMap::new();
    for i in 0..property_count.min(64) {
        let base = 8 + i * 8;
        let id = u32_le(section, base)?;
        let offset = u32_le(section, base + 4)? as usize;
        if let Some(value) = read_property_value(section, offset) {
            values.insert(id, value);
        }
    }
    Some(values)
}

fn read_property_value(section: &[u8], offset: usize) -> Option<String> {
    const VT_I2: u32 = 2;
    const VT_I4: u32 = 3;
    const VT_LPSTR: u32 = 30;
    const VT_LPWSTR: u32 = 31;
    const VT_FILETIME: u32 = 64;

    let vt = u32_le(section, offset)? & 0xFFFF;
    let body = offset + 4;
    match vt {
        VT_I2 => Some(i16::from_le_bytes([*section.get(body)?, *section.get(body + 1)?]).to_string()),
        VT_I4 => Some((u32_le(section, body)? as i32).to_string()),
        VT_LPSTR => {
            let length = u32_le(section, body)? as usize;
            let bytes = section.get(body + 4..body + 4 + length)?;
            Some(
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string(),
            )
        }
        VT_LPWSTR => {
            let length = u32_le(section, body)? as usize;
            let bytes = section.get(body + 4..body + 4 + length * 2)?;
            let utf16: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Some(
                String::from_utf16_lossy(&utf16)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string(),
            )
        }
        VT_FILETIME => {
            let low = u32_le(section, body)? as u64;
            let high = u32_le(section, body + 4)? as u64;
            format_filetime((high << 32) | low)
        }
        _ => None,
    }
}

/// FILETIME: ticks de 100 ns desde 1601-01-01. El valor cero se omite.
fn format_filetime(ticks: u64) -> Option<String> {
    const EPOCH_DELTA_SECS: i64 = 11_644_473_600;
    if ticks == 0 {
        return None;
    }
    let secs = (ticks / 10_000_000) as i64 - EPOCH_DELTA_SECS;
    let datetime = chrono::DateTime::from_timestamp(secs, 0)?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn u16_le(data: &[u8], offset: usize) -> Option<u16> {
    Some(u16::from_le_bytes([
        *data.get(offset)?,
        *data.get(offset + 1)?,
    ]))
}

fn u32_le(data: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes([
        *data.get(offset)?,
        *data.get(offset + 1)?,
        *data.get(offset + 2)?,
        *data.get(offset + 3)?,
    ]))
}
