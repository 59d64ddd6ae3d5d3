//! Row-oriented tables built from payload records.
//!
//! Field defects are absorbed here, one row at a time: a record with no name,
//! count or readable percentage still produces a row with documented defaults.

use crate::labels::{self, NOT_AVAILABLE};
use crate::model::{TableBlock, TableKind};
use crate::payload::{EntryRecord, Label, Summary, UNKNOWN_NAME};

/// Header of the count and percentage columns.
const COUNT_HEADER: &str = "Count";
const PERCENTAGE_HEADER: &str = "Percentage";

/// Formats a percentage with exactly two decimals, substituting `0.0` when absent.
pub fn format_percentage(value: Option<f64>) -> String {
    format!("{:.2}%", value.unwrap_or(0.0))
}

/// One department or adviser row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRow {
    pub label: String,
    pub count: i64,
    pub percentage: String,
}

impl EntryRow {
    /// Cell texts in column order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.count.to_string(),
            self.percentage.clone(),
        ]
    }
}

/// A label/count/percentage table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryTable {
    pub kind: TableKind,
    pub header: [String; 3],
    pub rows: Vec<EntryRow>,
}

impl EntryTable {
    /// Converts the table into a layout block.
    pub fn into_block(self) -> TableBlock {
        TableBlock {
            kind: self.kind,
            header: self.header.to_vec(),
            rows: self.rows.iter().map(EntryRow::cells).collect(),
            repeat_header: true,
        }
    }
}

/// Builds the department table, mapping names to program codes.
pub fn build_department_table(records: &[EntryRecord]) -> EntryTable {
    build_entry_table(
        TableKind::Department,
        "Department",
        records,
        labels::normalize_department,
    )
}

/// Builds the adviser table, upper-casing names.
pub fn build_adviser_table(records: &[EntryRecord]) -> EntryTable {
    build_entry_table(
        TableKind::Adviser,
        "Adviser",
        records,
        labels::normalize_adviser,
    )
}

fn build_entry_table(
    kind: TableKind,
    label_header: &str,
    records: &[EntryRecord],
    normalize: fn(&str) -> String,
) -> EntryTable {
    let rows = records
        .iter()
        .map(|record| EntryRow {
            label: labels::resolve_label(record.name.as_ref(), UNKNOWN_NAME, normalize),
            count: record.count,
            percentage: format_percentage(record.percentage),
        })
        .collect();

    EntryTable {
        kind,
        header: [
            label_header.to_owned(),
            COUNT_HEADER.to_owned(),
            PERCENTAGE_HEADER.to_owned(),
        ],
        rows,
    }
}

/// The key/value summary table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryTable {
    pub total_research: i64,
    pub top_department: String,
    pub top_adviser: String,
}

impl SummaryTable {
    pub const HEADER: [&'static str; 2] = ["Metric", "Value"];

    /// Metric/value pairs in display order.
    pub fn rows(&self) -> Vec<[String; 2]> {
        vec![
            [
                "Total Research Uploaded".to_owned(),
                self.total_research.to_string(),
            ],
            ["Top Department".to_owned(), self.top_department.clone()],
            ["Top Adviser".to_owned(), self.top_adviser.clone()],
        ]
    }

    /// Converts the table into a layout block.
    pub fn into_block(self) -> TableBlock {
        TableBlock {
            kind: TableKind::Summary,
            header: Self::HEADER.iter().map(|cell| (*cell).to_owned()).collect(),
            rows: self.rows().into_iter().map(|row| row.to_vec()).collect(),
            repeat_header: false,
        }
    }
}

/// Builds the summary table, normalizing tie lists for the top entries.
pub fn build_summary_table(summary: &Summary) -> SummaryTable {
    SummaryTable {
        total_research: summary.total_research,
        top_department: resolve_ties(
            summary.most_active_department.as_ref(),
            labels::normalize_department_ties,
        ),
        top_adviser: resolve_ties(
            summary.most_active_adviser.as_ref(),
            labels::normalize_adviser_ties,
        ),
    }
}

fn resolve_ties(label: Option<&Label>, normalize: fn(&str) -> String) -> String {
    labels::resolve_label(label, NOT_AVAILABLE, normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;

    fn payload(json: &str) -> Payload {
        Payload::from_json_str(json).expect("payload parses")
    }

    #[test]
    fn adviser_row_is_upper_cased_and_formatted() {
        let input = payload(
            r#"{"advisers": [{"name": "jane doe", "count": 5, "percentage": "12.5"}]}"#,
        );
        let table = build_adviser_table(&input.advisers);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.rows[0],
            EntryRow {
                label: "JANE DOE".into(),
                count: 5,
                percentage: "12.50%".into(),
            }
        );
        assert_eq!(table.rows[0].cells(), ["JANE DOE", "5", "12.50%"]);
    }

    #[test]
    fn unparseable_percentages_format_as_zero() {
        let input = payload(
            r#"{"departments": [
                {"name": "Nursing", "count": 1, "percentage": "N/A"},
                {"name": "Nursing", "count": 1, "percentage": null},
                {"name": "Nursing", "count": 1, "percentage": [3]},
                {"name": "Nursing", "count": 1}
            ]}"#,
        );
        let table = build_department_table(&input.departments);
        assert!(table.rows.iter().all(|row| row.percentage == "0.00%"));
    }

    #[test]
    fn rows_keep_input_order_and_count() {
        let input = payload(
            r#"{"departments": [
                {"name": "Nursing", "count": 1, "percentage": 10},
                {"name": "Criminology", "count": 9, "percentage": 90},
                {"name": "Fine Arts (BFA)", "count": 4, "percentage": 40}
            ]}"#,
        );
        let table = build_department_table(&input.departments);
        let labels: Vec<_> = table.rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, ["BSN", "BSCRIM", "BFA"]);
        assert_eq!(table.rows[1].count, 9);
        assert_eq!(table.rows[0].percentage, "10.00%");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let input = payload(r#"{"departments": [{}], "advisers": [{}]}"#);
        let department = &build_department_table(&input.departments).rows[0];
        assert_eq!(department.label, "Unknown");
        assert_eq!(department.count, 0);
        assert_eq!(department.percentage, "0.00%");
        assert_eq!(build_adviser_table(&input.advisers).rows[0].label, "UNKNOWN");
    }

    #[test]
    fn summary_normalizes_tie_lists() {
        let input = payload(
            r#"{"summary": {
                "totalResearch": 8,
                "mostActiveDepartment": "Marine Engineering, Criminology",
                "mostActiveAdviser": "jane doe, john roe"
            }}"#,
        );
        let summary = build_summary_table(&input.summary);
        assert_eq!(summary.total_research, 8);
        assert_eq!(summary.top_department, "BSME, BSCRIM");
        assert_eq!(summary.top_adviser, "JANE DOE, JOHN ROE");
    }

    #[test]
    fn empty_payload_yields_placeholder_summary_and_header_only_tables() {
        let input = payload("{}");
        let summary = build_summary_table(&input.summary);
        assert_eq!(summary.total_research, 0);
        assert_eq!(summary.top_department, NOT_AVAILABLE);
        assert_eq!(summary.top_adviser, NOT_AVAILABLE);

        let block = build_department_table(&input.departments).into_block();
        assert_eq!(block.header, ["Department", "Count", "Percentage"]);
        assert_eq!(block.row_count(), 0);
    }

    #[test]
    fn summary_block_has_metric_value_columns() {
        let block = SummaryTable {
            total_research: 3,
            top_department: "BSN".into(),
            top_adviser: "JANE DOE".into(),
        }
        .into_block();
        assert_eq!(block.header, ["Metric", "Value"]);
        assert_eq!(block.rows[0], ["Total Research Uploaded", "3"]);
        assert!(!block.repeat_header);
    }
}
