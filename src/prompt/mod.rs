mod editorial;
mod social;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use thiserror::Error;

use crate::form::FormSnapshot;
use crate::templates::{Template, TemplateCategory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("No brief strategy exists for the category of template '{0}'")]
    UnknownTemplateCategory(String),
}

/// The one non-deterministic input to brief compilation: a corner date/issue
/// stamp. Sampled once per submission; injected so compilation itself stays
/// pure and tests can pin it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueStamp {
    pub date_line: String,
    pub issue_line: String,
}

impl IssueStamp {
    pub fn new(date: DateTime<Utc>, issue_index: u32) -> Self {
        let month = date.format("%B").to_string().to_uppercase();
        Self {
            date_line: format!("{month} {}", date.year()),
            issue_line: format!("ISSUE Nº {issue_index}"),
        }
    }

    pub fn sample() -> Self {
        let issue_index = rand::thread_rng().gen_range(1..=20);
        Self::new(Utc::now(), issue_index)
    }
}

/// Compile the creative brief for one generation attempt. Pure: identical
/// inputs and stamp yield an identical brief. Routing is by category and
/// fails closed on anything outside the two known families.
pub fn compile_brief(
    template: &Template,
    snapshot: &FormSnapshot,
    stylize: bool,
    issue: &IssueStamp,
) -> Result<String, CompileError> {
    match template.category {
        TemplateCategory::Social => Ok(social::build_brief(template, snapshot, stylize)),
        TemplateCategory::Magazine | TemplateCategory::Print => {
            Ok(editorial::build_brief(template, snapshot, stylize, issue))
        }
        TemplateCategory::Unknown => {
            Err(CompileError::UnknownTemplateCategory(template.id.clone()))
        }
    }
}

/// One `- Label: "value"` line per field whose trimmed value is non-blank,
/// in template field order. Blank or unset fields are omitted entirely; that
/// omission is what flips the strategies into their invent-the-text branches.
pub(crate) fn project_fields(template: &Template, snapshot: &FormSnapshot) -> Vec<String> {
    template
        .inputs
        .iter()
        .filter_map(|field| {
            let value = snapshot.get(&field.id)?.trim();
            if value.is_empty() {
                return None;
            }
            Some(format!("- {}: \"{}\"", field.label, value))
        })
        .collect()
}

pub(crate) fn background_directive(stylize: bool) -> &'static str {
    if stylize {
        "Analyze the existing background. If it is busy or distracting, replace it with a clean, \
         minimalist studio background. Valid Backgrounds: A solid color, a subtle gradient, or an \
         abstract, atmospheric, out-of-focus texture."
    } else {
        "DO NOT CHANGE THE BACKGROUND. Keep it as close to the original as possible, applying only \
         lighting and color adjustments."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::templates::{Template, TemplateCatalog, TemplateCategory};
    use chrono::TimeZone;

    fn stamp() -> IssueStamp {
        IssueStamp::new(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(), 7)
    }

    fn vogue_form(catalog: &TemplateCatalog) -> FormState {
        FormState::for_template(catalog.get("vogue").unwrap())
    }

    #[test]
    fn issue_stamp_formats_month_year_and_index() {
        let stamp = stamp();
        assert_eq!(stamp.date_line, "AUGUST 2026");
        assert_eq!(stamp.issue_line, "ISSUE Nº 7");
    }

    #[test]
    fn compilation_is_deterministic_given_a_fixed_stamp() {
        let catalog = TemplateCatalog::builtin();
        let mut form = vogue_form(&catalog);
        form.set_field("headline", "The Future of Fashion".to_string())
            .unwrap();

        let first =
            compile_brief(form.template(), form.snapshot(), true, &stamp()).unwrap();
        let second =
            compile_brief(form.template(), form.snapshot(), true, &stamp()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn blank_fields_never_reach_the_projection() {
        let catalog = TemplateCatalog::builtin();
        let mut form = vogue_form(&catalog);
        form.set_field("headline", "The Future of Fashion".to_string())
            .unwrap();
        form.set_field("tagline", "   ".to_string()).unwrap();

        let lines = project_fields(form.template(), form.snapshot());
        assert!(lines
            .iter()
            .any(|line| line == "- Headline: \"The Future of Fashion\""));
        assert!(lines.iter().all(|line| !line.contains("Tagline")));
    }

    #[test]
    fn projection_follows_template_field_order() {
        let catalog = TemplateCatalog::builtin();
        let mut form = vogue_form(&catalog);
        form.set_field("tagline", "Later".to_string()).unwrap();
        form.set_field("headline", "First".to_string()).unwrap();

        let lines = project_fields(form.template(), form.snapshot());
        // masthead has a default, so it leads; headline precedes tagline.
        assert_eq!(lines[0], "- Masthead: \"VOGUE\"");
        assert_eq!(lines[1], "- Headline: \"First\"");
        assert_eq!(lines[2], "- Tagline: \"Later\"");
    }

    #[test]
    fn unknown_category_fails_closed() {
        let template = Template {
            id: "mystery".to_string(),
            category: TemplateCategory::Unknown,
            name: "Mystery".to_string(),
            description: "no known family".to_string(),
            preview_image: None,
            aspect_ratio: "1/1".to_string(),
            inputs: Vec::new(),
        };
        let err = compile_brief(&template, &FormSnapshot::default(), true, &stamp());
        assert_eq!(
            err,
            Err(CompileError::UnknownTemplateCategory("mystery".to_string()))
        );
    }

    #[test]
    fn print_category_routes_to_the_editorial_strategy() {
        let mut template = TemplateCatalog::builtin().get("vogue").unwrap().clone();
        template.category = TemplateCategory::Print;
        let brief =
            compile_brief(&template, &FormSnapshot::default(), true, &stamp()).unwrap();
        assert!(brief.contains("magazine cover"));
    }
}
