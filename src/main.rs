use clap::Parser;
use log::error;
use serde_json::{json, Value};
use std::{path::PathBuf, process::ExitCode};

use spectrascan::{
    extractor::{timestamp, ErrorReport},
    ExtractOptions, Extractor,
};

#[derive(Parser, Debug)]
#[command(name = "spectrascan")]
#[command(version, about = "Describe a georeferenced raster as JSON", long_about = None)]
struct Cli {
    /// Raster file to describe
    file: PathBuf,

    /// Single line output
    #[arg(long)]
    compact: bool,

    /// Leave out metadata dumps, pixel samples and reconstruction info
    #[arg(long)]
    no_raw_storage: bool,

    /// Pixel samples kept per band
    #[arg(long, value_name = "N", default_value_t = ExtractOptions::default().max_pixel_samples)]
    max_samples: usize,
}

impl From<&Cli> for ExtractOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            include_raw_storage: !cli.no_raw_storage,
            max_pixel_samples: cli.max_samples,
            pretty: !cli.compact,
            ..Default::default()
        }
    }
}

fn print(document: &Value, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    match text {
        Ok(text) => println!("{text}"),
        Err(err) => error!("could not encode document: {err}"),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let usage = json!({
                "error": err.to_string().trim(),
                "usage": "spectrascan [OPTIONS] <FILE>",
                "example": "spectrascan /path/to/file.tif",
                "extraction_timestamp": timestamp(),
            });
            print(&usage, true);
            return ExitCode::FAILURE;
        }
    };
    let options = ExtractOptions::from(&cli);
    let pretty = options.pretty;

    if !cli.file.exists() {
        let report = ErrorReport::new(format!("File not found: {}", cli.file.display()), &cli.file);
        print(&report.into_value(), pretty);
        return ExitCode::FAILURE;
    }

    let extractor: Extractor = Extractor::new(options);
    match extractor.run(&cli.file) {
        Ok(document) => {
            print(&document, pretty);
            ExitCode::SUCCESS
        }
        Err(document) => {
            print(&document, pretty);
            ExitCode::FAILURE
        }
    }
}
