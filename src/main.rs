use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use reptool::{Error, InputDocument, OutputConfig, OutputType, TableModel, render};

#[derive(Parser)]
#[command(name = "reptool")]
#[command(version)]
#[command(about = "Lay out a report definition into pages and render it", long_about = None)]
struct Cli {
    /// Report definition (<reptool>) or fixed-layout document (<reptool_report>)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file; per-page formats number it (report1.svg, report2.svg, ...)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output type: pdf, svg, png, ps, gtk, gtk-default
    #[arg(short, long)]
    format: Option<String>,

    /// Number of copies
    #[arg(long)]
    copies: Option<u32>,

    /// Table data as JSON, replacing the report's data source
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Write the paginated fixed-layout document here instead of rendering
    #[arg(long, value_name = "FILE")]
    fixed_layout: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<(), Error> {
    let mut input = InputDocument::from_file(&cli.input)?;
    if let Some(data) = &cli.data {
        match &mut input {
            InputDocument::Report(report) => {
                let table = TableModel::from_json(&std::fs::read_to_string(data)?)?;
                log::info!("Loaded {} row(s) from {}", table.row_count(), data.display());
                report.set_table_model(table);
            }
            InputDocument::Fixed(_) => {
                log::warn!("--data has no effect on a fixed-layout document");
            }
        }
    }
    let doc = input.into_fixed()?;

    if let Some(path) = &cli.fixed_layout {
        doc.save(path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut config = OutputConfig::from_properties(&doc.properties);
    if let Some(format) = &cli.format {
        let output_type =
            OutputType::parse(format).ok_or_else(|| Error::UnsupportedOutput(format.clone()))?;
        config = config.with_output_type(output_type);
    }
    if let Some(output) = &cli.output {
        config = config.with_filename(output);
    }
    if let Some(copies) = cli.copies {
        config = config.with_copies(copies);
    }
    if let Some(dir) = cli.input.parent() {
        config = config.with_resource_dir(dir);
    }

    for path in render::render(&doc, &config)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
