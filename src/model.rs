// Report data model: the hydrated inspection record handed to the renderer,
// plus the fixed column definitions for the two table variants.

use chrono::NaiveDate;
use serde::Deserialize;

// ============================================================================
// Report record
// ============================================================================

/// A fully-hydrated inspection record. Immutable input to one render call;
/// entry ordering (by serial) is fixed by the caller and preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub vessel_name: String,
    pub file_no: String,
    pub revision_no: String,
    pub form_no: String,
    pub inspection_date: NaiveDate,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub logo_ref: Option<String>,
    /// Selects the ship-staff+office table variant
    #[serde(default)]
    pub include_office_columns: bool,
    pub entries: Vec<Entry>,
}

/// One deficiency row within a report.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub serial_no: String,
    pub deficiency: String,
    #[serde(default)]
    pub cause_analysis: Option<String>,
    #[serde(default)]
    pub corrective_action: Option<String>,
    #[serde(default)]
    pub preventive_action: Option<String>,
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(default)]
    pub signed_by: Option<String>,
    #[serde(default)]
    pub signature_ref: Option<String>,
    #[serde(default)]
    pub sign_date: Option<NaiveDate>,
    #[serde(default)]
    pub company_analysis: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    #[default]
    Open,
    FurtherActionNeeded,
    ClosedSatisfactorily,
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Open => "OPEN",
            EntryStatus::FurtherActionNeeded => "FURTHER ACTION NEEDED",
            EntryStatus::ClosedSatisfactorily => "CLOSED SATISFACTORILY",
        }
    }
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

impl Entry {
    /// Display text for a non-remarks column.
    pub fn text_for(&self, key: FieldKey) -> String {
        match key {
            FieldKey::Serial => self.serial_no.clone(),
            FieldKey::Deficiency => self.deficiency.clone(),
            FieldKey::CauseAnalysis => self.cause_analysis.clone().unwrap_or_default(),
            FieldKey::CorrectiveAction => self.corrective_action.clone().unwrap_or_default(),
            FieldKey::PreventiveAction => self.preventive_action.clone().unwrap_or_default(),
            FieldKey::CompletionDate => {
                self.completion_date.as_ref().map(format_date).unwrap_or_default()
            }
            FieldKey::CompanyAnalysis => self.company_analysis.clone().unwrap_or_default(),
            FieldKey::Remarks => String::new(),
        }
    }
}

// ============================================================================
// Column definitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
    Remarks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    ShipStaff,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Serial,
    Deficiency,
    CauseAnalysis,
    CorrectiveAction,
    PreventiveAction,
    CompletionDate,
    CompanyAnalysis,
    Remarks,
}

/// One column of a table variant. Fractional widths per variant sum to 1.0
/// and are never recomputed mid-document.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub label: &'static str,
    pub width: f32,
    pub key: FieldKey,
    pub kind: ColumnKind,
    pub group: ColumnGroup,
}

const SHIP_STAFF_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { label: "Sr No", width: 0.05, key: FieldKey::Serial, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Deficiency", width: 0.23, key: FieldKey::Deficiency, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Analysis of Cause", width: 0.18, key: FieldKey::CauseAnalysis, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Corrective Action", width: 0.17, key: FieldKey::CorrectiveAction, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Preventive Action", width: 0.17, key: FieldKey::PreventiveAction, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Completion Date", width: 0.08, key: FieldKey::CompletionDate, kind: ColumnKind::Date, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Remarks / Signature", width: 0.12, key: FieldKey::Remarks, kind: ColumnKind::Remarks, group: ColumnGroup::Office },
];

const SHIP_OFFICE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { label: "Sr No", width: 0.05, key: FieldKey::Serial, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Deficiency", width: 0.20, key: FieldKey::Deficiency, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Analysis of Cause", width: 0.15, key: FieldKey::CauseAnalysis, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Corrective Action", width: 0.14, key: FieldKey::CorrectiveAction, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Preventive Action", width: 0.14, key: FieldKey::PreventiveAction, kind: ColumnKind::Text, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Completion Date", width: 0.08, key: FieldKey::CompletionDate, kind: ColumnKind::Date, group: ColumnGroup::ShipStaff },
    ColumnSpec { label: "Company Analysis", width: 0.13, key: FieldKey::CompanyAnalysis, kind: ColumnKind::Text, group: ColumnGroup::Office },
    ColumnSpec { label: "Remarks / Signature", width: 0.11, key: FieldKey::Remarks, kind: ColumnKind::Remarks, group: ColumnGroup::Office },
];

/// Columns for a table variant. Staff columns always precede office columns.
pub fn column_specs(include_office: bool) -> &'static [ColumnSpec] {
    let columns = if include_office {
        SHIP_OFFICE_COLUMNS
    } else {
        SHIP_STAFF_COLUMNS
    };
    debug_assert!(
        (columns.iter().map(|c| c.width).sum::<f32>() - 1.0).abs() < 1e-4,
        "column fractional widths must sum to 1.0"
    );
    columns
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_widths_sum_to_one() {
        for variant in [false, true] {
            let total: f32 = column_specs(variant).iter().map(|c| c.width).sum();
            assert!((total - 1.0).abs() < 1e-4, "variant {variant}: sum {total}");
        }
    }

    #[test]
    fn office_variant_adds_company_analysis() {
        assert_eq!(column_specs(false).len(), 7);
        assert_eq!(column_specs(true).len(), 8);
        assert!(column_specs(true)
            .iter()
            .any(|c| c.key == FieldKey::CompanyAnalysis));
    }

    #[test]
    fn staff_columns_precede_office_columns() {
        for variant in [false, true] {
            let columns = column_specs(variant);
            let first_office = columns
                .iter()
                .position(|c| c.group == ColumnGroup::Office)
                .unwrap();
            assert!(columns[first_office..]
                .iter()
                .all(|c| c.group == ColumnGroup::Office));
        }
    }

    #[test]
    fn status_parses_from_screaming_snake_case() {
        let status: EntryStatus = serde_json::from_str("\"FURTHER_ACTION_NEEDED\"").unwrap();
        assert_eq!(status, EntryStatus::FurtherActionNeeded);
        let status: EntryStatus = serde_json::from_str("\"CLOSED_SATISFACTORILY\"").unwrap();
        assert_eq!(status.label(), "CLOSED SATISFACTORILY");
    }

    #[test]
    fn entry_text_for_missing_optional_is_empty() {
        let entry: Entry = serde_json::from_str(
            r#"{"serial_no": "1", "deficiency": "Lifeboat davit corroded"}"#,
        )
        .unwrap();
        assert_eq!(entry.status, EntryStatus::Open);
        assert_eq!(entry.text_for(FieldKey::CauseAnalysis), "");
        assert_eq!(entry.text_for(FieldKey::Serial), "1");
    }
}
