//! Turns a [`ReportDocument`] into PDF bytes.

use genpdf::elements::PageBreak;
use genpdf::Document;
use log::debug;

use crate::decorator::{Branding, FilterDescription, HeaderDecorator};
use crate::elements::{
    AnchorMarker, DataTable, FlowElement, FooterLine, HeadingText, KeepTogether, PageTracker,
    Spacer,
};
use crate::error::ReportError;
use crate::fonts;
use crate::model::{Block, Heading, HeadingLevel, ReportDocument};
use crate::style::{pt, ReportStyle};

/// Output of a successful render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedReport {
    /// Complete PDF file contents.
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Download name derived from the filter, e.g. `Research_Statistics_All_Semesters_All_Years.pdf`.
    pub file_name: String,
    /// Anchor names with the 1-based page each one landed on, in render order.
    pub anchors: Vec<(String, usize)>,
}

impl RenderedReport {
    /// Page the named anchor landed on.
    pub fn page_of(&self, anchor: &str) -> Option<usize> {
        self.anchors
            .iter()
            .find(|(name, _)| name == anchor)
            .map(|(_, page)| *page)
    }
}

/// Renders report documents with a fixed style, branding and filter line.
#[derive(Clone, Debug, Default)]
pub struct ReportBuilder {
    style: ReportStyle,
    branding: Branding,
    filter: FilterDescription,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    pub fn with_filter(mut self, filter: FilterDescription) -> Self {
        self.filter = filter;
        self
    }

    /// Lays out and renders `document`.
    pub fn render(&self, document: &ReportDocument) -> Result<RenderedReport, ReportError> {
        let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        let mut pdf = Document::new(font_family);
        pdf.set_title(self.branding.report_title.clone());
        pdf.set_paper_size(self.style.page.paper_size());
        pdf.set_font_size(self.style.base_font_size);

        let tracker = PageTracker::new();
        pdf.set_page_decorator(HeaderDecorator::new(
            &self.style,
            &self.branding,
            &self.filter,
            tracker.clone(),
        ));

        for block in document.blocks() {
            match block {
                Block::PageBreak => pdf.push(PageBreak::new()),
                Block::Spacer(height) => pdf.push(Spacer::points(*height)),
                Block::Heading(heading) => pdf.push(self.heading(heading)),
                Block::Table(table) => pdf.push(DataTable::new(table, self.style.table(table.kind))),
                Block::Footer(footer) => pdf.push(FooterLine::new(footer, self.style.footer)),
                Block::Anchor(name) => pdf.push(AnchorMarker::new(name.clone(), tracker.clone())),
                Block::KeepTogether(children) => pdf.push(self.group(children, &tracker)),
            }
        }

        let mut bytes = Vec::new();
        pdf.render(&mut bytes).map_err(ReportError::Render)?;

        let page_count = tracker.page_count();
        let anchors = tracker.anchors();
        debug!("rendered {} bytes over {} pages", bytes.len(), page_count);

        #[cfg(feature = "bookmarks")]
        let bytes = {
            let section_pages: Vec<Option<usize>> = document
                .sections()
                .iter()
                .map(|section| tracker.page_of(section.identifier()))
                .collect();
            crate::bookmarks::apply_section_bookmarks(&bytes, document.sections(), &section_pages)?
        };

        Ok(RenderedReport {
            bytes,
            page_count,
            file_name: self.filter.suggested_file_name(),
            anchors,
        })
    }

    fn heading(&self, heading: &Heading) -> HeadingText {
        let style = match heading.level {
            HeadingLevel::Title => self.style.summary_heading,
            HeadingLevel::Section => self.style.section_heading,
        };
        HeadingText::new(heading.text.clone(), style.text(), pt(style.space_after_pt))
    }

    fn group(&self, children: &[Block], tracker: &PageTracker) -> KeepTogether {
        let elements = children
            .iter()
            .filter_map(|child| self.flow_element(child, tracker))
            .collect();
        KeepTogether::new(elements, self.style.page.body_height())
    }

    /// Element for a block nested in a keep-together group.
    ///
    /// Page breaks make no sense inside a group and are dropped.
    fn flow_element(&self, block: &Block, tracker: &PageTracker) -> Option<Box<dyn FlowElement>> {
        let element: Box<dyn FlowElement> = match block {
            Block::PageBreak => {
                log::warn!("Ignoring page break inside a keep-together group");
                return None;
            }
            Block::Spacer(height) => Box::new(Spacer::points(*height)),
            Block::Heading(heading) => Box::new(self.heading(heading)),
            Block::Table(table) => Box::new(DataTable::new(table, self.style.table(table.kind))),
            Block::Footer(footer) => Box::new(FooterLine::new(footer, self.style.footer)),
            Block::Anchor(name) => Box::new(AnchorMarker::new(name.clone(), tracker.clone())),
            Block::KeepTogether(children) => Box::new(self.group(children, tracker)),
        };
        Some(element)
    }
}
