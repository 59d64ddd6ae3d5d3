//! The repeating page header.
//!
//! [`HeaderDecorator`] runs once per page before any content: it draws the
//! logo, the institutional block, the divider, the report title and the filter
//! line, then shrinks the page to the body area.

use std::env;
use std::path::{Path, PathBuf};

use genpdf::elements::Image;
use genpdf::error::Error;
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Alignment, Context, Element, Margins, Mm, PageDecorator, Position, Scale};
use log::{debug, warn};

use crate::elements::{decode_image_from_path, draw_text, estimated_image_size, fit_scale, PageTracker};
use crate::payload::Payload;
use crate::style::{pt, HeaderStyle, ReportStyle};

/// Logo location relative to the executable or the crate root.
pub const LOGO_RELATIVE_PATH: &str = "assets/branding/logo.png";

/// Fixed institutional texts and the optional logo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branding {
    pub institution: [String; 3],
    pub report_title: String,
    /// Explicit logo file. When unset the conventional locations are searched.
    pub logo_path: Option<PathBuf>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            institution: [
                "Research and Publication Department".to_owned(),
                "EXACT COLLEGES OF ASIA".to_owned(),
                "Suclayin, Arayat, Pampanga".to_owned(),
            ],
            report_title: "Research Repository Analytics Report".to_owned(),
            logo_path: None,
        }
    }
}

impl Branding {
    pub fn with_logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// The logo file to draw, if one exists.
    pub fn resolve_logo(&self) -> Option<PathBuf> {
        match &self.logo_path {
            Some(path) => Some(path.clone()),
            None => default_logo_candidates()
                .into_iter()
                .find(|candidate| candidate.is_file()),
        }
    }
}

fn default_logo_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(bin_dir.join(LOGO_RELATIVE_PATH));
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(LOGO_RELATIVE_PATH));
    candidates
}

/// The semester and year the report was filtered by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterDescription {
    pub semester: String,
    pub year: String,
}

impl Default for FilterDescription {
    fn default() -> Self {
        Self::from_payload(&Payload::default())
    }
}

impl FilterDescription {
    pub fn new(semester: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            year: year.into(),
        }
    }

    pub fn from_payload(payload: &Payload) -> Self {
        Self::new(payload.semester_label(), payload.year_label())
    }

    /// Text of the header's filter line.
    pub fn line(&self) -> String {
        format!("Semester: {}    Year: {}", self.semester, self.year)
    }

    /// Download name for the report, e.g. `Research_Statistics_1st_Semester_2024.pdf`.
    pub fn suggested_file_name(&self) -> String {
        format!(
            "Research_Statistics_{}_{}.pdf",
            underscored(&self.semester),
            underscored(&self.year)
        )
    }
}

fn underscored(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Page decorator drawing the report header and applying the body margins.
pub struct HeaderDecorator {
    header: HeaderStyle,
    margins: Margins,
    institution: [String; 3],
    title: String,
    filter_line: String,
    logo: Option<image::DynamicImage>,
    tracker: PageTracker,
}

impl HeaderDecorator {
    /// Binds the header content once. The logo is decoded here, not per page.
    pub fn new(
        style: &ReportStyle,
        branding: &Branding,
        filter: &FilterDescription,
        tracker: PageTracker,
    ) -> Self {
        let logo = branding.resolve_logo().and_then(|path| {
            match decode_image_from_path(&path) {
                Ok(image) => {
                    debug!("using logo {}", path.display());
                    Some(image)
                }
                Err(err) => {
                    warn!("Skipping logo {}: {}", path.display(), err);
                    None
                }
            }
        });

        Self {
            header: style.header,
            margins: style.page.margins(),
            institution: branding.institution.clone(),
            title: branding.report_title.clone(),
            filter_line: filter.line(),
            logo,
            tracker,
        }
    }

    fn draw_logo(
        &self,
        context: &Context,
        area: &Area<'_>,
        style: Style,
        logo: &image::DynamicImage,
    ) -> Result<(), Error> {
        let scale = fit_scale(estimated_image_size(logo), pt(self.header.logo_size_pt));
        let mut image = Image::from_dynamic_image(logo.clone())?;
        image.set_scale(Scale::new(scale, scale));

        let mut logo_area = area.clone();
        logo_area.add_offset(Position::new(
            pt(self.header.logo_left_pt),
            pt(self.header.logo_top_pt),
        ));
        image.render(context, logo_area, style)?;
        Ok(())
    }
}

impl PageDecorator for HeaderDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        let page = self.tracker.start_page();
        debug!("decorating page {page}");
        let width = area.size().width;

        if let Some(logo) = &self.logo {
            if let Err(err) = self.draw_logo(context, &area, style, logo) {
                warn!("Failed to draw logo on page {page}: {err}");
            }
        }

        let text_left = pt(self.header.text_left_pt);
        for (line, text) in self.header.institution.iter().zip(&self.institution) {
            draw_text(
                context,
                &area,
                Position::new(text_left, pt(line.top_pt)),
                width - text_left,
                text,
                style.and(line.text()),
                Alignment::Left,
            )?;
        }

        let inset = pt(self.header.divider_inset_pt);
        let divider_top = pt(self.header.divider_top_pt);
        area.draw_line(
            vec![
                Position::new(inset, divider_top),
                Position::new(width - inset, divider_top),
            ],
            Style::new().with_color(self.header.divider_color),
        );

        for (line, text) in [
            (self.header.title, &self.title),
            (self.header.filter, &self.filter_line),
        ] {
            draw_text(
                context,
                &area,
                Position::new(Mm::default(), pt(line.top_pt)),
                width,
                text,
                style.and(line.text()),
                Alignment::Center,
            )?;
        }

        area.add_margins(self.margins);
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_line_separates_semester_and_year() {
        let filter = FilterDescription::new("1st Semester", "2024");
        assert_eq!(filter.line(), "Semester: 1st Semester    Year: 2024");
    }

    #[test]
    fn suggested_file_name_replaces_whitespace() {
        let filter = FilterDescription::new("1st Semester", "2024");
        assert_eq!(filter.suggested_file_name(), "Research_Statistics_1st_Semester_2024.pdf");
    }

    #[test]
    fn default_filter_uses_sentinels() {
        let filter = FilterDescription::default();
        assert_eq!(filter.line(), "Semester: All Semesters    Year: All Years");
        assert_eq!(
            filter.suggested_file_name(),
            "Research_Statistics_All_Semesters_All_Years.pdf"
        );
    }

    #[test]
    fn explicit_logo_path_wins_even_if_missing() {
        let branding = Branding::default().with_logo_path("/nonexistent/logo.png");
        assert_eq!(
            branding.resolve_logo(),
            Some(PathBuf::from("/nonexistent/logo.png"))
        );
    }

    #[test]
    fn missing_logo_is_not_fatal() {
        let branding = Branding::default().with_logo_path("/nonexistent/logo.png");
        let decorator = HeaderDecorator::new(
            &ReportStyle::default(),
            &branding,
            &FilterDescription::default(),
            PageTracker::new(),
        );
        assert!(decorator.logo.is_none());
        assert_eq!(decorator.title, "Research Repository Analytics Report");
    }
}
