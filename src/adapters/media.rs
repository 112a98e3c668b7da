//! Información técnica de contenedores de audio/video (MP4/MOV, AVI, MKV).
//!
//! Solo lectura a nivel de contenedor: brands, duración y pistas. La
//! eliminación no está implementada para esta familia; la limpieza copia el
//! archivo sin cambios y lo reporta explícitamente.

use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::CleanError;
use crate::output::copy_unchanged;
use crate::report::{MetadataEntry, MetadataMap, RemovalOutcome, RemovalSelection, RemovalStatus};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MediaKind {
    Mp4,
    Avi,
    Mkv,
}

pub fn extract_media_metadata(path: &Path) -> Result<MetadataMap, CleanError> {
    let kind = media_kind(path);
    let entries = match kind {
        MediaKind::Mp4 => read_mp4(path),
        MediaKind::Avi => read_avi(path),
        MediaKind::Mkv => read_mkv(path),
    };

    let entries = entries.ok_or_else(|| {
        CleanError::extraction("no se pudo leer el contenedor multimedia".to_string())
    })?;

    let mut map = MetadataMap::new();
    for entry in entries {
        map.push(entry);
    }
    Ok(map)
}

pub fn remove_media_metadata(
    path: &Path,
    output: &Path,
    selection: &RemovalSelection,
) -> Result<RemovalOutcome, CleanError> {
    copy_unchanged(path, output)?;
    let status = match selection {
        RemovalSelection::None => RemovalStatus::NothingToRemove,
        _ => RemovalStatus::CopiedUnsupported {
            reason: "la eliminación de metadata en contenedores de audio/video no está \
                     implementada; se copió el archivo sin cambios"
                .to_string(),
        },
    };
    Ok(RemovalOutcome {
        output: output.to_path_buf(),
        status,
    })
}

// El despacho es solo por extensión; los parsers validan la firma y fallan
// con error de extracción si no coincide.
fn media_kind(path: &Path) -> MediaKind {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "avi" => MediaKind::Avi,
        "mkv" => MediaKind::Mkv,
        _ => MediaKind::Mp4,
    }
}

// === MP4 / MOV ===

fn read_mp4(path: &Path) -> Option<Vec<MetadataEntry>> {
    let mut file = File::open(path).ok()?;
    let mut entries = Vec::new();
    let mut brands = Vec::new();
    let mut duration = None;
    let mut timescale = None;
    let mut creation_time = None;
    let mut tracks = Vec::new();
    let mut saw_ftyp = false;

    loop {
        let Some(header) = read_box_header(&mut file) else {
            break;
        };
        match &header.kind {
            b"ftyp" => {
                saw_ftyp = true;
                let payload = read_box_payload(&mut file, &header, 1024 * 1024)?;
                if payload.len() >= 4 {
                    brands.push(String::from_utf8_lossy(&payload[0..4]).to_string());
                    let mut offset = 8;
                    while offset + 4 <= payload.len() {
                        brands.push(String::from_utf8_lossy(&payload[offset..offset + 4]).to_string());
                        offset += 4;
                    }
                }
            }
            b"moov" => {
                let payload = read_box_payload(&mut file, &header, 8 * 1024 * 1024)?;
                parse_moov(
                    &payload,
                    &mut duration,
                    &mut timescale,
                    &mut creation_time,
                    &mut tracks,
                );
            }
            _ => match header.payload_size {
                Some(size) => {
                    file.seek(SeekFrom::Current(size as i64)).ok()?;
                }
                // La caja ocupa el resto del archivo; no queda nada por leer.
                None => break,
            },
        }
    }

    if !saw_ftyp {
        return None;
    }
    if !brands.is_empty() {
        entries.push(MetadataEntry::new("Brands", brands.join(", ")));
    }
    if let (Some(duration), Some(timescale)) = (duration, timescale)
        && timescale > 0
    {
        let seconds = duration as f64 / timescale as f64;
        entries.push(MetadataEntry::new("Duración", format!("{seconds:.2} s")));
    }
    if let Some(value) = creation_time {
        entries.push(MetadataEntry::new("Creación", format_mp4_time(value)));
    }
    if !tracks.is_empty() {
        entries.push(MetadataEntry::new("Pistas", tracks.len().to_string()));
        for track in tracks {
            entries.push(MetadataEntry::new("Pista", track));
        }
    }
    Some(entries)
}

fn parse_moov(
    data: &[u8],
    duration: &mut Option<u64>,
    timescale: &mut Option<u32>,
    creation_time: &mut Option<u64>,
    tracks: &mut Vec<String>,
) {
    let mut cursor = Cursor::new(data);
    while let Some(header) = read_box_header(&mut cursor) {
        let Some(payload) = read_box_payload(&mut cursor, &header, 4 * 1024 * 1024) else {
            break;
        };
        match &header.kind {
            b"mvhd" => {
                if payload.len() >= 32 && payload[0] == 1 {
                    *creation_time = Some(u64_be(&payload, 4));
                    *timescale = Some(u32_be(&payload, 20));
                    *duration = Some(u64_be(&payload, 24));
                } else if payload.len() >= 20 && payload[0] == 0 {
                    *creation_time = Some(u32_be(&payload, 4) as u64);
                    *timescale = Some(u32_be(&payload, 12));
                    *duration = Some(u32_be(&payload, 16) as u64);
                }
            }
            b"trak" => {
                if let Some(track) = parse_trak(&payload) {
                    tracks.push(track);
                }
            }
            _ => {}
        }
    }
}

fn parse_trak(data: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(data);
    let mut dimensions = None;
    let mut handler = None;
    let mut codec = None;
    while let Some(header) = read_box_header(&mut cursor) {
        let payload = read_box_payload(&mut cursor, &header, 2 * 1024 * 1024)?;
        match &header.kind {
            b"tkhd" => {
                if payload.len() >= 84 {
                    let width = u32_be(&payload, 76) >> 16;
                    let height = u32_be(&payload, 80) >> 16;
                    if width > 0 && height > 0 {
                        dimensions = Some(format!("{width}x{height}"));
                    }
                }
            }
            b"mdia" => {
                let (h, c) = parse_mdia(&payload);
                handler = h;
                codec = c;
            }
            _ => {}
        }
    }

    let mut parts = Vec::new();
    if let Some(handler) = handler {
        parts.push(format!("tipo:{handler}"));
    }
    if let Some(codec) = codec {
        parts.push(format!("codec:{codec}"));
    }
    if let Some(dimensions) = dimensions {
        parts.push(format!("size:{dimensions}"));
    }
    if parts.is_empty() { None } else { Some(parts.join(" | ")) }
}

fn parse_mdia(data: &[u8]) -> (Option<String>, Option<String>) {
    let mut cursor = Cursor::new(data);
    let mut handler = None;
    let mut codec = None;
    while let Some(header) = read_box_header(&mut cursor) {
        let Some(payload) = read_box_payload(&mut cursor, &header, 2 * 1024 * 1024) else {
            break;
        };
        match &header.kind {
            b"hdlr" => {
                if payload.len() >= 12 {
                    handler = Some(String::from_utf8_lossy(&payload[8..12]).trim().to_string());
                }
            }
            b"minf" => {
                codec = find_stsd_codec(&payload);
            }
            _ => {}
        }
    }
    (handler, codec)
}

/// Desciende minf → stbl → stsd y devuelve el fourcc de la primera entrada.
fn find_stsd_codec(data: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(data);
    while let Some(header) = read_box_header(&mut cursor) {
        let payload = read_box_payload(&mut cursor, &header, 2 * 1024 * 1024)?;
        match &header.kind {
            b"stbl" => return find_stsd_codec(&payload),
            b"stsd" if payload.len() >= 16 => {
                return Some(String::from_utf8_lossy(&payload[12..16]).trim().to_string());
            }
            _ => {}
        }
    }
    None
}

// === AVI (RIFF) ===

fn read_avi(path: &Path) -> Option<Vec<MetadataEntry>> {
    let mut file = File::open(path).ok()?;
    let mut header = [0_u8; 12];
    file.read_exact(&mut header).ok()?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"AVI " {
        return None;
    }

    let mut entries = Vec::new();
    loop {
        let mut chunk_header = [0_u8; 8];
        if file.read_exact(&mut chunk_header).is_err() {
            break;
        }
        let kind = [chunk_header[0], chunk_header[1], chunk_header[2], chunk_header[3]];
        let size = u32::from_le_bytes([
            chunk_header[4],
            chunk_header[5],
            chunk_header[6],
            chunk_header[7],
        ]) as usize;

        if &kind == b"LIST" {
            let mut payload = vec![0_u8; size.min(1024 * 1024)];
            file.read_exact(&mut payload).ok()?;
            if payload.len() >= 4 && &payload[0..4] == b"hdrl" {
                parse_avi_hdrl(&payload[4..], &mut entries);
            }
            if size > payload.len() {
                file.seek(SeekFrom::Current((size - payload.len()) as i64)).ok()?;
            }
        } else {
            file.seek(SeekFrom::Current(size as i64)).ok()?;
        }
        if size % 2 == 1 {
            let _ = file.seek(SeekFrom::Current(1));
        }
    }
    Some(entries)
}

fn parse_avi_hdrl(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut offset = 0;
    while offset + 8 <= data.len() {
        let kind = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        let body_end = (body_start + size).min(data.len());
        let body = &data[body_start..body_end];

        if kind == b"avih" && body.len() >= 40 {
            let us_per_frame = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
            let total_frames = u32::from_le_bytes([body[16], body[17], body[18], body[19]]);
            let streams = u32::from_le_bytes([body[24], body[25], body[26], body[27]]);
            let width = u32::from_le_bytes([body[32], body[33], body[34], body[35]]);
            let height = u32::from_le_bytes([body[36], body[37], body[38], body[39]]);
            if us_per_frame > 0 {
                let fps = 1_000_000.0 / us_per_frame as f64;
                entries.push(MetadataEntry::new("FPS", format!("{fps:.2}")));
            }
            entries.push(MetadataEntry::new("Cuadros", total_frames.to_string()));
            entries.push(MetadataEntry::new("Streams", streams.to_string()));
            if width > 0 && height > 0 {
                entries.push(MetadataEntry::new("Dimensiones", format!("{width}x{height}")));
            }
        } else if kind == b"LIST" && body.len() >= 4 && &body[0..4] == b"strl" {
            parse_avi_strl(&body[4..], entries);
        }

        offset = body_start + size + (size % 2);
    }
}

fn parse_avi_strl(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut offset = 0;
    while offset + 8 <= data.len() {
        let kind = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        let body_end = (body_start + size).min(data.len());
        let body = &data[body_start..body_end];

        if kind == b"strh" && body.len() >= 8 {
            let stream_type = String::from_utf8_lossy(&body[0..4]).trim().to_string();
            let handler = String::from_utf8_lossy(&body[4..8])
                .trim_matches('\0')
                .trim()
                .to_string();
            let label = if handler.is_empty() {
                format!("tipo:{stream_type}")
            } else {
                format!("tipo:{stream_type} | codec:{handler}")
            };
            entries.push(MetadataEntry::new("Stream", label));
        }

        offset = body_start + size + (size % 2);
    }
}

// === MKV (EBML) ===

const EBML_HEADER_ID: u32 = 0x1A45DFA3;
const SEGMENT_ID: u32 = 0x18538067;
const INFO_ID: u32 = 0x1549A966;
const TRACKS_ID: u32 = 0x1654AE6B;

fn read_mkv(path: &Path) -> Option<Vec<MetadataEntry>> {
    let mut file = File::open(path).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).ok()?;
    if data.len() < 4 || data[0..4] != [0x1A, 0x45, 0xDF, 0xA3] {
        return None;
    }

    let mut entries = Vec::new();
    let mut cursor = Cursor::new(data.as_slice());
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        match id {
            EBML_HEADER_ID => parse_mkv_ebml_header(&data[start..end], &mut entries),
            SEGMENT_ID => parse_mkv_segment(&data[start..end], &mut entries),
            _ => {}
        }
        cursor.set_position(end as u64);
    }
    Some(entries)
}

fn parse_mkv_segment(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut cursor = Cursor::new(data);
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        match id {
            INFO_ID => parse_mkv_info(&data[start..end], entries),
            TRACKS_ID => parse_mkv_tracks(&data[start..end], entries),
            _ => {}
        }
        cursor.set_position(end as u64);
    }
}

fn parse_mkv_ebml_header(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut cursor = Cursor::new(data);
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        match id {
            0x4286 => entries.push(MetadataEntry::new(
                "EBML versión",
                read_ebml_uint(&data[start..end]).to_string(),
            )),
            0x4282 => entries.push(MetadataEntry::new(
                "Doc type",
                read_ebml_string(&data[start..end]),
            )),
            _ => {}
        }
        cursor.set_position(end as u64);
    }
}

fn parse_mkv_info(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut cursor = Cursor::new(data);
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        match id {
            0x4D80 => entries.push(MetadataEntry::new(
                "Muxing app",
                read_ebml_string(&data[start..end]),
            )),
            0x5741 => entries.push(MetadataEntry::new(
                "Writing app",
                read_ebml_string(&data[start..end]),
            )),
            0x4489 => {
                if let Some(duration) = read_ebml_float(&data[start..end]) {
                    entries.push(MetadataEntry::new("Duración", format!("{duration:.2}")));
                }
            }
            _ => {}
        }
        cursor.set_position(end as u64);
    }
}

fn parse_mkv_tracks(data: &[u8], entries: &mut Vec<MetadataEntry>) {
    let mut cursor = Cursor::new(data);
    let mut count = 0;
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        if id == 0xAE {
            count += 1;
            let label = parse_mkv_track_entry(&data[start..end])
                .unwrap_or_else(|| format!("Pista {count}"));
            entries.push(MetadataEntry::new("Pista", label));
        }
        cursor.set_position(end as u64);
    }
}

fn parse_mkv_track_entry(data: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(data);
    let mut track_type = None;
    let mut codec_id = None;
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = (start + size as usize).min(data.len());
        match id {
            0x83 => track_type = Some(read_ebml_uint(&data[start..end])),
            0x86 => codec_id = Some(read_ebml_string(&data[start..end])),
            _ => {}
        }
        cursor.set_position(end as u64);
    }

    let mut parts = Vec::new();
    if let Some(track_type) = track_type {
        parts.push(format!("tipo:{}", mkv_track_type_label(track_type)));
    }
    if let Some(codec_id) = codec_id {
        parts.push(format!("codec:{codec_id}"));
    }
    if parts.is_empty() { None } else { Some(parts.join(" | ")) }
}

fn mkv_track_type_label(value: u64) -> &'static str {
    match value {
        1 => "video",
        2 => "audio",
        17 => "subtítulos",
        _ => "otro",
    }
}

// === Helpers ===

struct BoxHeader {
    kind: [u8; 4],
    /// `None` cuando la caja declara tamaño 0 y se extiende hasta el final.
    payload_size: Option<u64>,
}

fn read_box_header<R: Read>(reader: &mut R) -> Option<BoxHeader> {
    let mut buffer = [0_u8; 8];
    reader.read_exact(&mut buffer).ok()?;
    let size = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as u64;
    let mut kind = [0_u8; 4];
    kind.copy_from_slice(&buffer[4..8]);

    let payload_size = match size {
        0 => None,
        // Tamaño extendido de 64 bits a continuación de la cabecera.
        1 => {
            let mut extended = [0_u8; 8];
            reader.read_exact(&mut extended).ok()?;
            Some(u64::from_be_bytes(extended).saturating_sub(16))
        }
        _ => Some(size.saturating_sub(8)),
    };
    Some(BoxHeader { kind, payload_size })
}

fn read_box_payload<R: Read>(reader: &mut R, header: &BoxHeader, limit: usize) -> Option<Vec<u8>> {
    let Some(size) = header.payload_size else {
        let mut buffer = Vec::new();
        reader
            .by_ref()
            .take(limit as u64)
            .read_to_end(&mut buffer)
            .ok()?;
        return Some(buffer);
    };

    let size = size as usize;
    if size > limit {
        let mut buffer = vec![0_u8; limit];
        reader.read_exact(&mut buffer).ok()?;
        let remaining = (size - limit) as u64;
        let _ = std::io::copy(&mut reader.by_ref().take(remaining), &mut std::io::sink());
        return Some(buffer);
    }
    let mut buffer = vec![0_u8; size];
    reader.read_exact(&mut buffer).ok()?;
    Some(buffer)
}

fn read_ebml_element(cursor: &mut Cursor<&[u8]>) -> Option<(u32, u64)> {
    let id = read_ebml_vint(cursor, true)? as u32;
    let size = read_ebml_vint(cursor, false)?;
    Some((id, size))
}

/// Lee un entero de longitud variable EBML. Con `keep_marker` el bit de
/// longitud se conserva (identificadores); sin él se enmascara (tamaños).
fn read_ebml_vint(cursor: &mut Cursor<&[u8]>, keep_marker: bool) -> Option<u64> {
    let mut first = [0_u8; 1];
    cursor.read_exact(&mut first).ok()?;
    let mut mask = 0x80_u8;
    let mut length = 1;
    while length <= 8 && first[0] & mask == 0 {
        mask >>= 1;
        length += 1;
    }
    if length > 8 {
        return None;
    }

    let mut value = if keep_marker {
        first[0] as u64
    } else {
        (first[0] & !mask) as u64
    };
    for _ in 1..length {
        let mut next = [0_u8; 1];
        cursor.read_exact(&mut next).ok()?;
        value = (value << 8) | next[0] as u64;
    }
    Some(value)
}

fn read_ebml_uint(data: &[u8]) -> u64 {
    let mut value = 0_u64;
    for &byte in data {
        value = (value << 8) | byte as u64;
    }
    value
}

fn read_ebml_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim().to_string()
}

fn read_ebml_float(data: &[u8]) -> Option<f64> {
    match data.len() {
        4 => Some(f32::from_be_bytes([data[0], data[1], data[2], data[3]]) as f64),
        8 => Some(f64::from_be_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ])),
        _ => None,
    }
}

fn u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn u64_be(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

/// Época MP4: segundos desde 1904-01-01. Un valor que desborda el rango de
/// fechas representable se muestra como número crudo en vez de fallar.
fn format_mp4_time(seconds: u64) -> String {
    let fallback = seconds.to_string();
    let Some(date) = NaiveDate::from_ymd_opt(1904, 1, 1) else {
        return fallback;
    };
    let Some(epoch) = date.and_hms_opt(0, 0, 0) else {
        return fallback;
    };
    let Some(delta) = i64::try_from(seconds).ok().and_then(Duration::try_seconds) else {
        return fallback;
    };
    match epoch.checked_add_signed(delta) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => fallback,
    }
}
