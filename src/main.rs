mod analysis;
mod color;
mod config;
mod data;
mod error;
mod intake;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use analysis::Pipeline;
use analysis::bands::{BandEntry, band_label};
use config::Settings;
use data::filter::MwRange;
use data::loader::load_table;
use intake::{RangePrompt, TerminalPrompt, confirm, parse_range, pick_table};
use report::OutputLocation;

/// Remove contaminants, apply MW cut-offs and cross-reference gel bands
/// with each other and with a pull-down experiment.
#[derive(Debug, Parser)]
#[command(name = "proteo-cross", version, about)]
struct Cli {
    /// Band export, repeated once per band in gel order (first is B1)
    #[arg(short, long = "band", value_name = "FILE")]
    bands: Vec<PathBuf>,

    /// MW cut-offs in Dalton for the band at the same position; bands without
    /// one are asked for on the terminal
    #[arg(long = "mw", value_name = "MIN,MAX", value_parser = parse_mw)]
    ranges: Vec<MwRange>,

    /// Pull-down export to cross with the bands
    #[arg(short, long, value_name = "FILE")]
    pulldown: Option<PathBuf>,

    /// Choose N band files (and the pull-down) in file dialogs instead
    #[arg(long, value_name = "N", conflicts_with_all = ["bands", "pulldown"])]
    pick: Option<usize>,

    /// JSON settings (column names, thresholds, …)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Workbook sheet holding the protein list
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// Write every output here instead of beside the inputs
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn parse_mw(s: &str) -> Result<MwRange, String> {
    parse_range(s).map_err(|e| e.to_string())
}

/// Files chosen for this run.
struct Inputs {
    bands: Vec<PathBuf>,
    pulldown: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    if let Some(sheet) = &cli.sheet {
        settings.input_sheet = sheet.clone();
    }
    let location = match &cli.out_dir {
        Some(dir) => OutputLocation::Directory(dir.clone()),
        None => OutputLocation::BesideInput,
    };

    let inputs = select_inputs(&cli)?;
    if cli.ranges.len() > inputs.bands.len() {
        bail!(
            "{} MW ranges given for {} bands",
            cli.ranges.len(),
            inputs.bands.len()
        );
    }

    let pipeline = Pipeline::new(settings);
    run(&pipeline, &inputs, &cli.ranges, &location)
}

fn select_inputs(cli: &Cli) -> Result<Inputs> {
    let Some(n) = cli.pick else {
        if cli.bands.is_empty() {
            bail!("no band given; use --band FILE (repeatable) or --pick N");
        }
        return Ok(Inputs {
            bands: cli.bands.clone(),
            pulldown: cli.pulldown.clone(),
        });
    };

    if n == 0 {
        bail!("--pick needs at least one band");
    }
    let mut bands = Vec::with_capacity(n);
    for i in 0..n {
        let path = pick_table(&format!("Band {}", band_label(i)))
            .context("band selection cancelled")?;
        bands.push(path);
    }
    let pulldown = if confirm(
        "Pulldown",
        "Do you have pulldown results to cross with your bands?",
    ) {
        Some(pick_table("Pull-down results").context("pull-down selection cancelled")?)
    } else {
        None
    };
    Ok(Inputs { bands, pulldown })
}

fn run(
    pipeline: &Pipeline,
    inputs: &Inputs,
    ranges: &[MwRange],
    location: &OutputLocation,
) -> Result<()> {
    let settings = pipeline.settings();
    let mut prompt = TerminalPrompt::stdio();

    let mut entries = Vec::with_capacity(inputs.bands.len());
    for (i, path) in inputs.bands.iter().enumerate() {
        let label = band_label(i);
        let table = load_table(path, &settings.input_sheet, &label)?;
        let range = match ranges.get(i) {
            Some(r) => *r,
            None => prompt.ask_range(&label, &file_name(path))?,
        };
        entries.push(BandEntry::new(i, path.clone(), range, table));
    }

    let bands = pipeline.run_bands(&entries)?;
    print_notes(&bands.notes);

    // `select_inputs` guarantees at least one band.
    let last_band = inputs.bands.last().context("no band given")?;
    let written = report::write_bands_report(&bands, last_band, location)?;
    println!("Band results saved to {}", written.display());

    if let Some(path) = &inputs.pulldown {
        let table = load_table(path, &settings.input_sheet, "pulldown")?;
        let outcome = pipeline.run_pulldown(&table, &bands)?;
        print_notes(&outcome.notes);
        for p in report::write_pulldown_report(&outcome, path, location, settings)? {
            println!("Saved {}", p.display());
        }
    }

    info!("run complete");
    println!("Thanks for using this automated program!");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_notes(notes: &[String]) {
    for note in notes {
        println!("{note}");
    }
    println!();
}
