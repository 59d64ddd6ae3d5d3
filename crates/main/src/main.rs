use std::error::Error;
use std::io::{self, Write};

use research_report::{generate_report, Payload, ReportError, ReportOptions};

/// Reads a statistics payload from stdin, writes the PDF report and prints its path.
///
/// Diagnostics go to stderr; set `RUST_LOG=debug` for a trace of each stage.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("ERROR: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ReportError> {
    let payload = Payload::from_reader(io::stdin().lock())?;
    let path = generate_report(&payload, &ReportOptions::default())?;

    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", path.display())?;
    stdout.flush()?;
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
