//! Lectura y limpieza del diccionario Info en documentos PDF.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::io;
use std::path::Path;

use crate::error::CleanError;
use crate::output::{copy_unchanged, write_via_temp};
use crate::report::{MetadataEntry, MetadataMap, RemovalOutcome, RemovalSelection, RemovalStatus};

/// Lee el diccionario Info. Las claves se presentan sin la barra inicial del
/// formato (`/Title` → `Title`); las entradas vacías se omiten.
pub fn extract_pdf_metadata(path: &Path) -> Result<MetadataMap, CleanError> {
    let doc = load_document(path)?;

    let mut map = MetadataMap::new();
    let Some(info) = info_dictionary(&doc) else {
        return Ok(map);
    };

    for (key, object) in info.iter() {
        let key = String::from_utf8_lossy(key).to_string();
        if let Some(value) = object_to_string(&doc, object)
            && !value.is_empty()
        {
            let entry = if is_sensitive_key(&key) {
                MetadataEntry::sensitive(key, value)
            } else {
                MetadataEntry::new(key, value)
            };
            map.push(entry);
        }
    }
    Ok(map)
}

/// Reescribe el documento con el diccionario Info reducido o vacío. Las
/// páginas y los objetos embebidos se copian tal cual.
pub fn remove_pdf_metadata(
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

    let mut doc = load_document(path)?;

    let removed = match selection {
        RemovalSelection::All => clear_info(&mut doc),
        RemovalSelection::Subset(keys) => prune_info(&mut doc, keys),
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
        doc.save(temp)
            .map(|_| ())
            .map_err(|error| CleanError::Write(io::Error::other(error)))
    })?;

    Ok(RemovalOutcome {
        output: output.to_path_buf(),
        status: RemovalStatus::Cleaned { removed },
    })
}

fn load_document(path: &Path) -> Result<Document, CleanError> {
    Document::load(path)
        .map_err(|error| CleanError::extraction(format!("no se pudo leer el PDF: {error}")))
}

/// Dónde vive el diccionario Info dentro del documento.
enum InfoSlot {
    Referenced(ObjectId),
    Inline,
}

fn locate_info(doc: &Document) -> Option<InfoSlot> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(reference) => Some(InfoSlot::Referenced(*reference)),
        Object::Dictionary(_) => Some(InfoSlot::Inline),
        _ => None,
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_dictionary_mut(doc: &mut Document) -> Option<&mut Dictionary> {
    match locate_info(doc)? {
        InfoSlot::Referenced(id) => doc.objects.get_mut(&id)?.as_dict_mut().ok(),
        InfoSlot::Inline => match doc.trailer.get_mut(b"Info").ok()? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        },
    }
}

/// Vacía el diccionario Info completo; devuelve cuántas entradas tenía.
fn clear_info(doc: &mut Document) -> usize {
    let Some(dict) = info_dictionary_mut(doc) else {
        return 0;
    };
    let removed = dict.len();
    *dict = Dictionary::new();
    removed
}

/// Elimina solo las claves seleccionadas, re-agregando la barra implícita.
fn prune_info(doc: &mut Document, keys: &[String]) -> usize {
    let Some(dict) = info_dictionary_mut(doc) else {
        return 0;
    };
    let mut removed = 0;
    for key in keys {
        if dict.remove(key.as_bytes()).is_some() {
            removed += 1;
        }
    }
    removed
}

fn object_to_string(doc: &Document, object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).trim().to_string()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .ok()
            .and_then(|inner| object_to_string(doc, inner)),
        _ => None,
    }
}

/// Cadenas PDF: UTF-16BE con BOM o PDFDocEncoding (tratada como latin-1).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16).trim().to_string();
    }
    bytes
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(key, "Author" | "Creator" | "Producer")
}
