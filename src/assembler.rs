//! Arranges the report tables into the ordered block sequence.

use chrono::NaiveDateTime;

use crate::model::{Block, FooterBlock, HeadingLevel, ReportDocument, Section};
use crate::payload::Payload;
use crate::table::{build_adviser_table, build_department_table, build_summary_table};

/// Format of the generation timestamp printed in footers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const SUMMARY_SECTION: &str = "summary";
pub const DEPARTMENT_SECTION: &str = "departments";
pub const ADVISER_SECTION: &str = "advisers";

/// Anchor placed right after the department table inside its group.
pub const DEPARTMENT_TABLE_END: &str = "departments-table-end";
/// Anchor placed right after the department footer inside its group.
pub const DEPARTMENT_FOOTER_END: &str = "departments-footer-end";

const SUMMARY_TITLE: &str = "Summary";
const DEPARTMENT_TITLE: &str = "Uploads by Department";
const ADVISER_TITLE: &str = "Research Submissions by Advisee Students";

/// Gaps between the page header region and the first heading, in points.
const SUMMARY_TOP_GAP_PT: f64 = 30.0;
const DEPARTMENT_TOP_GAP_PT: f64 = 20.0;
const ADVISER_TOP_GAP_PT: f64 = 30.0;

/// Gaps between a table and its footer, in points.
const FOOTER_GAP_PT: f64 = 20.0;
const DEPARTMENT_FOOTER_GAP_PT: f64 = 15.0;

/// Exporter identity and generation time shown after each table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FooterInfo {
    pub account_name: String,
    pub generated_at: NaiveDateTime,
}

impl FooterInfo {
    pub fn new(account_name: impl Into<String>, generated_at: NaiveDateTime) -> Self {
        Self {
            account_name: account_name.into(),
            generated_at,
        }
    }

    fn block(&self) -> Block {
        Block::Footer(FooterBlock {
            left: format!("Exported by: {}", self.account_name),
            right: format!(
                "Generated on: {}",
                self.generated_at.format(TIMESTAMP_FORMAT)
            ),
        })
    }
}

/// Builds the summary, department and adviser sections.
pub fn assemble(payload: &Payload, footer: &FooterInfo) -> ReportDocument {
    let summary_table = build_summary_table(&payload.summary);
    let department_table = build_department_table(&payload.departments);
    let adviser_table = build_adviser_table(&payload.advisers);

    log::debug!(
        "assembling report with {} department rows and {} adviser rows",
        department_table.rows.len(),
        adviser_table.rows.len()
    );

    let summary = Section::builder(SUMMARY_SECTION, SUMMARY_TITLE)
        .extend_blocks([
            Block::Spacer(SUMMARY_TOP_GAP_PT),
            Block::heading(SUMMARY_TITLE, HeadingLevel::Title),
            Block::Table(summary_table.into_block()),
            Block::Spacer(FOOTER_GAP_PT),
            footer.block(),
        ])
        .page_break_after(true)
        .build();

    let departments = Section::builder(DEPARTMENT_SECTION, DEPARTMENT_TITLE)
        .extend_blocks([
            Block::Spacer(DEPARTMENT_TOP_GAP_PT),
            Block::heading(DEPARTMENT_TITLE, HeadingLevel::Section),
            Block::KeepTogether(vec![
                Block::Table(department_table.into_block()),
                Block::anchor(DEPARTMENT_TABLE_END),
                Block::Spacer(DEPARTMENT_FOOTER_GAP_PT),
                footer.block(),
                Block::anchor(DEPARTMENT_FOOTER_END),
            ]),
        ])
        .page_break_after(true)
        .build();

    let advisers = Section::builder(ADVISER_SECTION, ADVISER_TITLE)
        .extend_blocks([
            Block::Spacer(ADVISER_TOP_GAP_PT),
            Block::heading(ADVISER_TITLE, HeadingLevel::Section),
            Block::Table(adviser_table.into_block()),
            Block::Spacer(FOOTER_GAP_PT),
            footer.block(),
        ])
        .build();

    ReportDocument::new(vec![summary, departments, advisers])
}
