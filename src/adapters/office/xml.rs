//! Propiedades principales (`docProps/core.xml`) de documentos OOXML.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

use super::archive::rewrite_package;
use crate::error::CleanError;
use crate::output::{copy_unchanged, write_via_temp};
use crate::report::{MetadataEntry, MetadataMap};

pub(crate) const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub(crate) const CP_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub(crate) const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

const CORE_PART: &str = "docProps/core.xml";

/// Describe cómo localizar un campo dentro del XML de propiedades.
#[derive(Clone, Copy)]
pub(crate) struct FieldSpec {
    pub(crate) tag: &'static str,
    pub(crate) local_name: &'static str,
    pub(crate) namespace: &'static str,
    pub(crate) sensitive: bool,
}

/// Conjunto completo leído en extracción, en orden de presentación.
const CORE_FIELDS: [FieldSpec; 8] = [
    FieldSpec {
        tag: "dc:title",
        local_name: "title",
        namespace: DC_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "dc:creator",
        local_name: "creator",
        namespace: DC_NS,
        sensitive: true,
    },
    FieldSpec {
        tag: "dc:subject",
        local_name: "subject",
        namespace: DC_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "cp:keywords",
        local_name: "keywords",
        namespace: CP_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "dc:description",
        local_name: "description",
        namespace: DC_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "cp:lastModifiedBy",
        local_name: "lastModifiedBy",
        namespace: CP_NS,
        sensitive: true,
    },
    FieldSpec {
        tag: "dcterms:created",
        local_name: "created",
        namespace: DCTERMS_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "dcterms:modified",
        local_name: "modified",
        namespace: DCTERMS_NS,
        sensitive: false,
    },
];

/// Conjunto fijo que borra la limpieza: autoría y descripción, no fechas.
const CORE_CLEAR_TAGS: [&str; 5] = [
    "dc:title",
    "dc:creator",
    "dc:subject",
    "dc:description",
    "cp:lastModifiedBy",
];

pub(crate) fn extract_core_properties(path: &Path) -> Result<MetadataMap, CleanError> {
    let mut map = MetadataMap::new();
    let Some(root) = read_part_xml(path, CORE_PART)? else {
        return Ok(map);
    };

    for spec in CORE_FIELDS {
        if let Some(value) = field_text(&root, &spec)
            && !value.is_empty()
        {
            let entry = if spec.sensitive {
                MetadataEntry::sensitive(spec.tag, value)
            } else {
                MetadataEntry::new(spec.tag, value)
            };
            map.push(entry);
        }
    }
    Ok(map)
}

/// Vacía el conjunto fijo de campos y reescribe el paquete. Devuelve cuántos
/// campos tenían contenido; con cero, la salida es una copia sin cambios.
pub(crate) fn clear_core_properties(path: &Path, output: &Path) -> Result<usize, CleanError> {
    let clear_specs: Vec<FieldSpec> = CORE_FIELDS
        .into_iter()
        .filter(|spec| CORE_CLEAR_TAGS.contains(&spec.tag))
        .collect();

    let pending = match read_part_xml(path, CORE_PART)? {
        Some(root) => clear_specs
            .iter()
            .filter(|spec| field_text(&root, spec).is_some_and(|value| !value.is_empty()))
            .count(),
        None => 0,
    };

    if pending == 0 {
        copy_unchanged(path, output)?;
        return Ok(0);
    }

    write_via_temp(output, |temp| {
        rewrite_package(path, temp, |name, contents| {
            if name == CORE_PART {
                clear_fields_in_xml(contents, &clear_specs)
            } else {
                Ok((contents, false))
            }
        })
        .map(|_| ())
    })?;

    Ok(pending)
}

/// Lee y parsea un XML interno del paquete; `None` si la entrada no existe.
pub(crate) fn read_part_xml(path: &Path, part: &str) -> Result<Option<Element>, CleanError> {
    let file = File::open(path).map_err(|error| {
        CleanError::extraction(format!("no se pudo abrir el documento: {error}"))
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|error| {
        CleanError::extraction(format!("no es un paquete de documento válido: {error}"))
    })?;

    let mut contents = String::new();
    match archive.by_name(part) {
        Ok(mut entry) => {
            entry.read_to_string(&mut contents).map_err(|error| {
                CleanError::extraction(format!("no se pudo leer `{part}`: {error}"))
            })?;
        }
        Err(_) => return Ok(None),
    }

    Element::parse(contents.as_bytes())
        .map(Some)
        .map_err(|error| CleanError::extraction(format!("XML de `{part}` inválido: {error}")))
}

/// Vacía el texto de los campos indicados dentro del XML de propiedades.
pub(crate) fn clear_fields_in_xml(
    contents: Vec<u8>,
    specs: &[FieldSpec],
) -> Result<(Vec<u8>, bool), CleanError> {
    let mut root = Element::parse(Cursor::new(&contents[..])).map_err(|error| {
        CleanError::extraction(format!("XML de propiedades inválido: {error}"))
    })?;

    let mut modified = false;
    for spec in specs {
        modified |= clear_field(&mut root, spec);
    }

    if !modified {
        return Ok((contents, false));
    }

    let mut output = Vec::new();
    let mut config = EmitterConfig::new();
    config.perform_indent = false;
    config.write_document_declaration = true;
    root.write_with_config(&mut output, config).map_err(|error| {
        CleanError::extraction(format!("no se pudo emitir el XML limpio: {error}"))
    })?;

    Ok((output, true))
}

pub(crate) fn field_text(root: &Element, spec: &FieldSpec) -> Option<String> {
    for node in &root.children {
        if let XMLNode::Element(child) = node
            && element_matches(child, spec)
        {
            return Some(element_text_content(child));
        }
    }
    None
}

pub(crate) fn clear_field(root: &mut Element, spec: &FieldSpec) -> bool {
    for node in root.children.iter_mut() {
        if let XMLNode::Element(child) = node
            && element_matches(child, spec)
        {
            let had_text = child
                .children
                .iter()
                .any(|node| matches!(node, XMLNode::Text(text) if !text.trim().is_empty()));
            child
                .children
                .retain(|node| !matches!(node, XMLNode::Text(_)));
            return had_text;
        }
    }
    false
}

pub(crate) fn element_matches(element: &Element, spec: &FieldSpec) -> bool {
    element.name == spec.local_name && element.namespace.as_deref() == Some(spec.namespace)
}

pub(crate) fn element_text_content(element: &Element) -> String {
    let mut content = String::new();
    for node in &element.children {
        if let XMLNode::Text(text) = node {
            content.push_str(text);
        }
    }
    content.trim().to_string()
}
