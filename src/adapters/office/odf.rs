//! Propiedades de documentos ODF: el bloque `office:meta` dentro de
//! `meta.xml`.

use std::io::Cursor;
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

use super::archive::rewrite_package;
use super::xml::{DC_NS, FieldSpec, clear_field, field_text, read_part_xml};
use crate::error::CleanError;
use crate::output::{copy_unchanged, write_via_temp};
use crate::report::{MetadataEntry, MetadataMap};

const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const META_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";

const META_PART: &str = "meta.xml";

const ODF_FIELDS: [FieldSpec; 9] = [
    FieldSpec {
        tag: "dc:title",
        local_name: "title",
        namespace: DC_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "meta:initial-creator",
        local_name: "initial-creator",
        namespace: META_NS,
        sensitive: true,
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
        tag: "dc:description",
        local_name: "description",
        namespace: DC_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "meta:keyword",
        local_name: "keyword",
        namespace: META_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "meta:generator",
        local_name: "generator",
        namespace: META_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "meta:creation-date",
        local_name: "creation-date",
        namespace: META_NS,
        sensitive: false,
    },
    FieldSpec {
        tag: "dc:date",
        local_name: "date",
        namespace: DC_NS,
        sensitive: false,
    },
];

/// Conjunto fijo que borra la limpieza, paralelo al de OOXML. En ODF el
/// autor original es `meta:initial-creator` y el último editor `dc:creator`.
const ODF_CLEAR_TAGS: [&str; 5] = [
    "dc:title",
    "dc:creator",
    "dc:subject",
    "dc:description",
    "meta:initial-creator",
];

pub(crate) fn extract_meta_properties(path: &Path) -> Result<MetadataMap, CleanError> {
    let mut map = MetadataMap::new();
    let Some(root) = read_part_xml(path, META_PART)? else {
        return Ok(map);
    };
    let Some(meta) = meta_block(&root) else {
        return Ok(map);
    };

    for spec in ODF_FIELDS {
        if let Some(value) = field_text(meta, &spec)
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

pub(crate) fn clear_meta_properties(path: &Path, output: &Path) -> Result<usize, CleanError> {
    let clear_specs: Vec<FieldSpec> = ODF_FIELDS
        .into_iter()
        .filter(|spec| ODF_CLEAR_TAGS.contains(&spec.tag))
        .collect();

    let pending = match read_part_xml(path, META_PART)? {
        Some(root) => meta_block(&root)
            .map(|meta| {
                clear_specs
                    .iter()
                    .filter(|spec| {
                        field_text(meta, spec).is_some_and(|value| !value.is_empty())
                    })
                    .count()
            })
            .unwrap_or(0),
        None => 0,
    };

    if pending == 0 {
        copy_unchanged(path, output)?;
        return Ok(0);
    }

    write_via_temp(output, |temp| {
        rewrite_package(path, temp, |name, contents| {
            if name == META_PART {
                clear_meta_in_xml(contents, &clear_specs)
            } else {
                Ok((contents, false))
            }
        })
        .map(|_| ())
    })?;

    Ok(pending)
}

/// El bloque de propiedades vive un nivel adentro del documento raíz.
fn meta_block(root: &Element) -> Option<&Element> {
    root.children.iter().find_map(|node| match node {
        XMLNode::Element(child)
            if child.name == "meta" && child.namespace.as_deref() == Some(OFFICE_NS) =>
        {
            Some(child)
        }
        _ => None,
    })
}

fn meta_block_mut(root: &mut Element) -> Option<&mut Element> {
    root.children.iter_mut().find_map(|node| match node {
        XMLNode::Element(child)
            if child.name == "meta" && child.namespace.as_deref() == Some(OFFICE_NS) =>
        {
            Some(child)
        }
        _ => None,
    })
}

fn clear_meta_in_xml(
    contents: Vec<u8>,
    specs: &[FieldSpec],
) -> Result<(Vec<u8>, bool), CleanError> {
    let mut root = Element::parse(Cursor::new(&contents[..]))
        .map_err(|error| CleanError::extraction(format!("meta.xml inválido: {error}")))?;

    let mut modified = false;
    if let Some(meta) = meta_block_mut(&mut root) {
        for spec in specs {
            modified |= clear_field(meta, spec);
        }
    }

    if !modified {
        return Ok((contents, false));
    }

    let mut output = Vec::new();
    let mut config = EmitterConfig::new();
    config.perform_indent = false;
    config.write_document_declaration = true;
    root.write_with_config(&mut output, config).map_err(|error| {
        CleanError::extraction(format!("no se pudo emitir meta.xml limpio: {error}"))
    })?;

    Ok((output, true))
}
