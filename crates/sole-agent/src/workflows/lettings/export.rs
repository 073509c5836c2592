use serde::Serialize;

use super::store::LettingsSnapshot;

/// One titled table handed to an export collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSection {
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Applicants, properties and matches as plain string tables.
#[derive(Debug, Clone, Serialize)]
pub struct ExportTables {
    pub sections: Vec<ExportSection>,
}

impl ExportTables {
    pub fn section(&self, title: &str) -> Option<&ExportSection> {
        self.sections.iter().find(|section| section.title == title)
    }
}

impl LettingsSnapshot {
    pub fn export_tables(&self) -> ExportTables {
        let applicants = ExportSection {
            title: "APPLICANTS",
            headers: vec![
                "ID",
                "Name",
                "Email",
                "Phone",
                "Budget Min",
                "Budget Max",
                "Bedrooms",
                "Employment",
                "Status",
                "Created",
                "Updated",
            ],
            rows: self
                .applicants()
                .iter()
                .map(|applicant| {
                    let details = &applicant.details;
                    vec![
                        applicant.applicant_id.to_string(),
                        details.name.clone(),
                        details.email.clone(),
                        details.phone.clone(),
                        details.preferences.budget_min.to_string(),
                        details.preferences.budget_max.to_string(),
                        details.preferences.bedrooms.to_string(),
                        details.finances.employment_status.clone(),
                        applicant.status.label().to_string(),
                        applicant.created_at.to_rfc3339(),
                        applicant.last_updated.to_rfc3339(),
                    ]
                })
                .collect(),
        };

        let properties = ExportSection {
            title: "PROPERTIES",
            headers: vec![
                "ID", "Address", "Postcode", "Bedrooms", "Rent", "Type", "Landlord", "Status",
                "Created", "Updated",
            ],
            rows: self
                .properties()
                .iter()
                .map(|property| {
                    let details = &property.details;
                    vec![
                        property.property_id.to_string(),
                        details.address.clone(),
                        details.postcode.clone(),
                        details.bedrooms.to_string(),
                        details.rent.to_string(),
                        details.property_type.clone(),
                        details.landlord_name.clone(),
                        property.status.label().to_string(),
                        property.created_at.to_rfc3339(),
                        property.last_updated.to_rfc3339(),
                    ]
                })
                .collect(),
        };

        let matches = ExportSection {
            title: "MATCHES",
            headers: vec![
                "ID",
                "Applicant ID",
                "Property ID",
                "Matched At",
                "Current Stage",
                "Applicant Stage",
                "Property Stage",
                "Notes",
                "Updated",
            ],
            rows: self
                .matches()
                .iter()
                .map(|record| {
                    vec![
                        record.match_id.to_string(),
                        record.applicant_id.to_string(),
                        record.property_id.to_string(),
                        record.matched_at.to_rfc3339(),
                        record.current_stage.to_string(),
                        record.applicant_stage.to_string(),
                        record.property_stage.to_string(),
                        record.notes.clone(),
                        record.updated_at.to_rfc3339(),
                    ]
                })
                .collect(),
        };

        ExportTables {
            sections: vec![applicants, properties, matches],
        }
    }
}
