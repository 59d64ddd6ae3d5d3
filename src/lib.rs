//! Research statistics PDF reports.
//!
//! A JSON analytics payload is parsed leniently ([`payload`]), turned into
//! label-normalized tables ([`table`]), arranged into sections
//! ([`assembler`]) and rendered with a repeating branded header
//! ([`builder`], [`decorator`]). [`generate_report`] runs the whole pipeline
//! and returns the path of the written file.

use std::path::PathBuf;

use chrono::NaiveDateTime;

pub mod assembler;
pub mod builder;
pub mod decorator;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod labels;
pub mod model;
pub mod output;
pub mod payload;
pub mod style;
pub mod table;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use builder::{RenderedReport, ReportBuilder};
pub use error::ReportError;
pub use payload::Payload;

use assembler::FooterInfo;
use decorator::{Branding, FilterDescription};

/// Per-run settings that are not part of the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportOptions {
    output_dir: Option<PathBuf>,
    logo_path: Option<PathBuf>,
    generated_at: Option<NaiveDateTime>,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the report into `dir` instead of the system temp directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Uses an explicit logo file instead of the conventional locations.
    pub fn with_logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Fixes the "Generated on" timestamp instead of reading the clock.
    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Final location of the report file.
    pub fn output_path(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(output::DEFAULT_FILE_NAME),
            None => output::default_output_path(),
        }
    }

    fn generated_at(&self) -> NaiveDateTime {
        self.generated_at
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    fn branding(&self) -> Branding {
        match &self.logo_path {
            Some(path) => Branding::default().with_logo_path(path.clone()),
            None => Branding::default(),
        }
    }
}

/// Renders `payload` into PDF bytes without touching the filesystem.
pub fn render_report(payload: &Payload, options: &ReportOptions) -> Result<RenderedReport, ReportError> {
    let footer = FooterInfo::new(payload.account_name(), options.generated_at());
    let document = assembler::assemble(payload, &footer);
    let filter = FilterDescription::from_payload(payload);

    ReportBuilder::new()
        .with_branding(options.branding())
        .with_filter(filter)
        .render(&document)
}

/// Renders `payload` and writes it to the configured output path.
///
/// Returns the absolute path of the written PDF.
pub fn generate_report(payload: &Payload, options: &ReportOptions) -> Result<PathBuf, ReportError> {
    let rendered = render_report(payload, options)?;
    let path = output::write_report(&rendered.bytes, &options.output_path())?;
    log::info!("wrote {}-page report to {}", rendered.page_count, path.display());
    Ok(path)
}
