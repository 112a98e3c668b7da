//! Flujo de selección: qué metadata eliminar según la decisión del usuario.
//!
//! La lógica de decisión está separada de stdin para poder probarla sin una
//! terminal real: el prompt interactivo solo traduce texto crudo a una
//! `RemovalSelection` ya resuelta contra el snapshot mostrado.

use console::style;
use std::io::{self, Write};

use crate::error::CleanError;
use crate::report::{MetadataMap, RemovalSelection};

/// Respuesta al prompt principal, antes de resolver índices.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Answer {
    All,
    AskSubset,
    Invalid,
}

pub fn interpret_answer(answer: &str) -> Answer {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Answer::All,
        "n" => Answer::AskSubset,
        _ => Answer::Invalid,
    }
}

/// Resuelve una lista de índices separada por comas (base 0) contra el
/// snapshot mostrado. Cualquier índice que no parsee o quede fuera de rango
/// invalida la selección completa; no se tolera a medias.
pub fn resolve_subset(input: &str, map: &MetadataMap) -> Result<RemovalSelection, CleanError> {
    let mut keys = Vec::new();
    for raw in input.split(',') {
        let token = raw.trim();
        let index: usize = token
            .parse()
            .map_err(|_| CleanError::selection(format!("`{token}` no es un índice válido")))?;
        let key = map.key_at(index).ok_or_else(|| {
            CleanError::selection(format!(
                "el índice {index} está fuera de rango (0..={})",
                map.len().saturating_sub(1)
            ))
        })?;
        keys.push(key.to_string());
    }
    Ok(RemovalSelection::Subset(keys))
}

/// Adaptador interactivo: pregunta por stdin y devuelve la selección final.
pub fn prompt_selection(map: &MetadataMap) -> Result<RemovalSelection, CleanError> {
    let answer = read_prompt("¿Eliminar toda la metadata? (y/n)")?;
    match interpret_answer(&answer) {
        Answer::All => Ok(RemovalSelection::All),
        Answer::AskSubset => {
            let indices = read_prompt("Índices a eliminar (separados por comas)")?;
            resolve_subset(&indices, map)
        }
        Answer::Invalid => Err(CleanError::selection(format!(
            "respuesta `{}` no reconocida",
            answer.trim()
        ))),
    }
}

fn read_prompt(question: &str) -> Result<String, CleanError> {
    print!("\n{} {} ", style(question).bold().cyan(), style("›").cyan());
    io::stdout().flush()?;

    let mut buffer = String::new();
    io::stdin().read_line(&mut buffer)?;
    Ok(buffer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MetadataEntry;

    fn sample_map() -> MetadataMap {
        let mut map = MetadataMap::new();
        map.push(MetadataEntry::new("Title", "Informe"));
        map.push(MetadataEntry::sensitive("Author", "Ana"));
        map.push(MetadataEntry::new("Producer", "Escritorio 3.1"));
        map
    }

    #[test]
    fn yes_selects_everything() {
        assert_eq!(interpret_answer("y"), Answer::All);
        assert_eq!(interpret_answer("  YES "), Answer::All);
    }

    #[test]
    fn n_asks_for_indices_and_anything_else_is_invalid() {
        assert_eq!(interpret_answer("n"), Answer::AskSubset);
        assert_eq!(interpret_answer("quizás"), Answer::Invalid);
        assert_eq!(interpret_answer(""), Answer::Invalid);
    }

    #[test]
    fn subset_resolves_indices_against_snapshot_order() {
        let map = sample_map();
        let selection = resolve_subset("0, 2", &map).unwrap();
        assert_eq!(
            selection,
            RemovalSelection::Subset(vec!["Title".to_string(), "Producer".to_string()])
        );
    }

    #[test]
    fn out_of_range_index_invalidates_the_selection() {
        let map = sample_map();
        let error = resolve_subset("0,99", &map).unwrap_err();
        assert!(matches!(error, CleanError::InvalidSelection { .. }));
    }

    #[test]
    fn non_numeric_index_invalidates_the_selection() {
        let map = sample_map();
        assert!(resolve_subset("0,dos", &map).is_err());
        assert!(resolve_subset("", &map).is_err());
    }
}
