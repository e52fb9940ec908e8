use serde::{Deserialize, Serialize};

/// Structured resume returned by the AI parser. Every field is optional or
/// defaulted: resumes in the wild omit sections freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceItem {
    pub company: String,
    pub title: String,
    /// `YYYY-MM` or `YYYY`.
    pub start_date: Option<String>,
    /// `None` for a current position.
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    pub institution: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_date: Option<String>,
}

impl ParsedResume {
    /// Trims strings, drops blank entries and de-duplicates skills case-insensitively.
    pub fn tidy(mut self) -> Self {
        fn clean(field: &mut Option<String>) {
            *field = field
                .take()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }

        clean(&mut self.full_name);
        clean(&mut self.email);
        clean(&mut self.phone);
        clean(&mut self.location);
        clean(&mut self.summary);

        for item in &mut self.experience {
            item.company = item.company.trim().to_string();
            item.title = item.title.trim().to_string();
            clean(&mut item.start_date);
            clean(&mut item.end_date);
            clean(&mut item.location);
            item.bullets = item
                .bullets
                .iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
        }
        self.experience
            .retain(|e| !e.company.is_empty() || !e.title.is_empty());

        for item in &mut self.education {
            item.institution = item.institution.trim().to_string();
            clean(&mut item.degree);
            clean(&mut item.field);
            clean(&mut item.graduation_date);
        }
        self.education.retain(|e| !e.institution.is_empty());

        let mut seen = std::collections::HashSet::new();
        self.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
            .collect();

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_deserializes_with_defaults() {
        let parsed: ParsedResume = serde_json::from_str(
            r#"{"full_name": "Jane Doe", "skills": ["Rust"], "experience": [{"company": "Acme"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.full_name.as_deref(), Some("Jane Doe"));
        assert!(parsed.education.is_empty());
        assert_eq!(parsed.experience[0].company, "Acme");
        assert!(parsed.experience[0].bullets.is_empty());
        assert_eq!(parsed.experience[0].end_date, None);
    }

    #[test]
    fn test_tidy_drops_blanks_and_duplicate_skills() {
        let resume = ParsedResume {
            full_name: Some("  Jane Doe ".to_string()),
            email: Some("   ".to_string()),
            skills: vec!["Rust".into(), "rust".into(), " Go ".into(), "".into()],
            experience: vec![
                ExperienceItem {
                    company: " Acme ".into(),
                    title: "Engineer".into(),
                    bullets: vec!["Shipped it".into(), "  ".into()],
                    ..Default::default()
                },
                ExperienceItem::default(),
            ],
            education: vec![EducationItem::default()],
            ..Default::default()
        }
        .tidy();

        assert_eq!(resume.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(resume.email, None);
        assert_eq!(resume.skills, vec!["Rust", "Go"]);
        assert_eq!(resume.experience.len(), 1);
        assert_eq!(resume.experience[0].company, "Acme");
        assert_eq!(resume.experience[0].bullets, vec!["Shipped it"]);
        assert!(resume.education.is_empty());
    }
}
