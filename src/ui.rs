//! Presentación en consola con el estilo de MetaLimpia.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row, Table};
use console::style;

use crate::report::MetadataMap;

const HEADER_WIDTH: usize = 66;

pub fn render_header() {
    let border = "─".repeat(HEADER_WIDTH - 2);
    println!("\n{}", style(format!("┌{}┐", border)).cyan());
    println!(
        "{}",
        style(format!(
            "│ {:^inner_width$} │",
            "▸ MetaLimpia · Inspector y Limpiador de Metadata ◂",
            inner_width = HEADER_WIDTH - 4
        ))
        .cyan()
        .bold()
    );
    println!("{}", style(format!("└{}┘", border)).cyan());
}

/// Muestra la metadata extraída como tabla indexada. Los índices de la
/// primera columna son los que acepta la selección por subconjunto.
pub fn render_metadata_table(map: &MetadataMap) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        header_cell("#"),
        header_cell("Campo"),
        header_cell("Valor"),
    ]);

    for (index, entry) in map.entries().iter().enumerate() {
        let key = if entry.sensitive {
            format!("⚠  {}", entry.key)
        } else {
            entry.key.clone()
        };
        let value_color = if entry.sensitive {
            Color::Yellow
        } else {
            Color::White
        };
        table.add_row(Row::from(vec![
            Cell::new(index).fg(Color::Rgb {
                r: 160,
                g: 196,
                b: 255,
            }),
            Cell::new(key).fg(Color::Cyan),
            Cell::new(&entry.value).fg(value_color),
        ]));
    }

    println!("\n{table}");
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Underlined)
}

pub fn print_muted(message: &str) {
    println!("{}", style(format!("│ {message}")).dim());
}

pub fn print_warning(message: &str) {
    println!("{}", style(format!("│ {message}")).yellow());
}

pub fn print_success(message: &str) {
    println!("{}", style(format!("│ {message}")).green());
}
