use serde::Deserialize;

use crate::errors::AppError;

/// Structured job details from the "advanced" input mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvancedJobDetails {
    pub title: Option<String>,
    pub location: Option<String>,
    pub visa_status: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub min_qualifications: Option<String>,
    pub adv_qualifications: Option<String>,
}

impl AdvancedJobDetails {
    /// Sets a field by its form name. Returns false for names that are not job fields.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "location" => &mut self.location,
            "visa_status" => &mut self.visa_status,
            "salary" => &mut self.salary,
            "description" => &mut self.description,
            "requirements" => &mut self.requirements,
            "min_qualifications" => &mut self.min_qualifications,
            "adv_qualifications" => &mut self.adv_qualifications,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Renders the non-empty fields as one job description, blank-line separated.
    pub fn compose(&self) -> String {
        let inline = [
            ("Job Title: ", &self.title),
            ("Location: ", &self.location),
            ("Visa / Residency Status: ", &self.visa_status),
            ("Estimated Salary: ", &self.salary),
        ];
        let blocks = [
            ("Job Description:\n", &self.description),
            ("Candidate Requirements:\n", &self.requirements),
            ("Minimum Qualifications:\n", &self.min_qualifications),
            ("Advanced Qualifications:\n", &self.adv_qualifications),
        ];

        inline
            .iter()
            .chain(blocks.iter())
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{label}{v}"))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Picks the simple description when present, otherwise composes the advanced fields.
pub fn resolve_job_description(
    simple: Option<&str>,
    advanced: &AdvancedJobDetails,
) -> Result<String, AppError> {
    if let Some(text) = simple.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(text.to_string());
    }

    let composed = advanced.compose();
    if composed.is_empty() {
        return Err(AppError::Validation(
            "Please provide the job description or advanced details".to_string(),
        ));
    }
    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_orders_and_labels_fields() {
        let details = AdvancedJobDetails {
            title: Some("Backend Engineer".into()),
            location: Some("Berlin".into()),
            salary: Some("  ".into()),
            description: Some("Build APIs".into()),
            min_qualifications: Some("3 years Rust".into()),
            ..Default::default()
        };
        assert_eq!(
            details.compose(),
            "Job Title: Backend Engineer\n\nLocation: Berlin\n\n\
             Job Description:\nBuild APIs\n\nMinimum Qualifications:\n3 years Rust"
        );
    }

    #[test]
    fn test_set_field_rejects_unknown_names() {
        let mut details = AdvancedJobDetails::default();
        assert!(details.set_field("visa_status", "EU citizens".into()));
        assert!(!details.set_field("resumes", "x".into()));
        assert_eq!(details.compose(), "Visa / Residency Status: EU citizens");
    }

    #[test]
    fn test_simple_description_wins() {
        let details = AdvancedJobDetails {
            title: Some("Ignored".into()),
            ..Default::default()
        };
        let jd = resolve_job_description(Some("  Senior Rust role "), &details).unwrap();
        assert_eq!(jd, "Senior Rust role");
    }

    #[test]
    fn test_blank_inputs_are_rejected() {
        let err = resolve_job_description(Some("   "), &AdvancedJobDetails::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
