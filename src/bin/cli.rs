#![cfg(not(tarpaulin_include))]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use refill::filter::ReportOrder;
use refill::{Diagnostics, EXPORT_FILE_NAME, RefillConfig, RefillError, Upload};

#[derive(Parser)]
#[command(name = "refill", about = "List item/color combinations that need a refill")]
struct Args {
    /// Stock spreadsheet (.xlsx, .xls or .csv)
    file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sales threshold; groups selling fewer units are listed
    #[arg(long)]
    threshold: Option<u32>,

    /// Sheet to read instead of the first one
    #[arg(long)]
    sheet: Option<String>,

    /// Sort by item code and color code instead of first appearance
    #[arg(long)]
    sorted: bool,

    /// Write the export spreadsheet (default name when no path is given)
    #[arg(long, num_args = 0..=1, default_missing_value = EXPORT_FILE_NAME)]
    export: Option<PathBuf>,

    /// Export CSV instead of XLSX
    #[arg(long, requires = "export")]
    csv: bool,

    /// Print the diagnostic log
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let mut diagnostics = Diagnostics::new();
    let result = run(&args, &mut diagnostics);

    if args.verbose {
        for line in diagnostics.lines() {
            eprintln!("{}", line);
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, diagnostics: &mut Diagnostics) -> Result<(), RefillError> {
    let mut config = match &args.config {
        Some(path) => RefillConfig::load(path)?,
        None => RefillConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.sales_threshold = threshold;
    }
    if let Some(sheet) = &args.sheet {
        config.sheet = Some(sheet.clone());
    }
    if args.sorted {
        config.order = ReportOrder::ProductCode;
    }

    let Some(path) = &args.file else {
        return Err(RefillError::NoFileSelected);
    };
    let upload = Upload::from_path(path)?;
    let report = refill::run(&upload, &config, diagnostics)?;

    print!("{}", refill::render_table(report.candidates()));
    if let Some(headline) = diagnostics.headline() {
        println!("{}", headline.message);
    }

    if let Some(target) = &args.export {
        if args.csv {
            let target = if target.as_os_str() == EXPORT_FILE_NAME {
                target.with_extension("csv")
            } else {
                target.clone()
            };
            std::fs::write(&target, refill::to_csv(report.candidates())?).map_err(write_failed)?;
            println!("exported {}", target.display());
        } else {
            std::fs::write(target, refill::to_xlsx(report.candidates())?).map_err(write_failed)?;
            println!("exported {}", target.display());
        }
    }

    Ok(())
}

fn write_failed(err: std::io::Error) -> RefillError {
    RefillError::ExportFailed(err.to_string())
}
