use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

mod adapters;
mod dispatch;
mod error;
mod output;
mod report;
mod ui;
mod workflow;

use crate::dispatch::FileFamily;
use crate::error::CleanError;
use crate::output::resolve_output_path;
use crate::report::{RemovalSelection, RemovalStatus};
use crate::workflow::prompt_selection;

/// Inspecciona y elimina la metadata embebida de un archivo.
///
/// La copia limpia se escribe en el directorio `limpios/` junto al original;
/// el archivo de entrada nunca se modifica.
#[derive(Parser)]
#[command(name = "metalimpia", version, about)]
struct Cli {
    /// Archivo a inspeccionar (imagen, PDF, documento de oficina o video)
    #[arg(value_name = "ARCHIVO")]
    file: PathBuf,

    /// Elimina toda la metadata sin preguntar
    #[arg(long)]
    remove: bool,

    /// Imprime la metadata extraída como JSON y termina
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", style("✗").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CleanError> {
    if !cli.file.is_file() {
        return Err(CleanError::FileNotFound(cli.file.clone()));
    }

    let family = FileFamily::from_path(&cli.file)?;
    let map = family.extract(&cli.file)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&map).map_err(|error| CleanError::Extraction {
            detail: format!("no se pudo serializar: {error}"),
        })?;
        println!("{json}");
        return Ok(());
    }

    ui::render_header();
    ui::print_muted(&format!("{} · {}", family.label(), cli.file.display()));

    if map.is_empty() {
        ui::print_muted("No se encontró metadata embebida en el archivo.");
        return Ok(());
    }

    ui::render_metadata_table(&map);

    let selection = if cli.remove {
        RemovalSelection::All
    } else {
        prompt_selection(&map)?
    };

    if matches!(selection, RemovalSelection::None) {
        ui::print_muted("No se eliminó nada; el archivo queda intacto.");
        return Ok(());
    }

    let output = resolve_output_path(&cli.file)?;
    let outcome = family.remove(&cli.file, &output, &selection)?;

    match &outcome.status {
        RemovalStatus::Cleaned { removed } => {
            ui::print_success(&format!(
                "Se eliminaron {removed} campos. Copia limpia en `{}`.",
                outcome.output.display()
            ));
        }
        RemovalStatus::NothingToRemove => {
            ui::print_muted(&format!(
                "No había nada que eliminar. Copia idéntica en `{}`.",
                outcome.output.display()
            ));
        }
        RemovalStatus::CopiedUnsupported { reason } => {
            ui::print_warning(reason);
            ui::print_muted(&format!(
                "Copia sin cambios en `{}`.",
                outcome.output.display()
            ));
        }
    }
    Ok(())
}
