use crate::form::FormSnapshot;
use crate::templates::Template;

use super::{background_directive, project_fields, IssueStamp};

const STOCK_HEADLINES: &str = "\"FREE SPIRIT\", \"POWER IN STILLNESS\", \"FASHION NOW\", \
\"THE NEW ERA\", \"BOLD & FEARLESS\", \"CUTTING-EDGE STYLE\"";

const FALLBACK_MASTHEAD: &str = "MAGAZINE";

/// Masthead precedence: non-blank snapshot value, then the template's declared
/// default for the `masthead` field, then a literal fallback.
fn masthead_value(template: &Template, snapshot: &FormSnapshot) -> String {
    if let Some(value) = snapshot.get("masthead") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if let Some(default) = template
        .field("masthead")
        .and_then(|field| field.default_value.as_deref())
    {
        let trimmed = default.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    FALLBACK_MASTHEAD.to_string()
}

fn content_instructions(projected: &[String]) -> String {
    if projected.is_empty() {
        format!(
            "No custom text was provided: you must generate all cover lines. Create one (1) \
             primary headline and 2-4 secondary lines.\nValid Headlines: {STOCK_HEADLINES}."
        )
    } else {
        format!(
            "The user-supplied text is the main content. Place the headline prominently. Use the \
             following text content:\n{}\nThen, generate 2-3 smaller, secondary placeholder lines \
             to support it based on the masthead/headline/tagline input.",
            projected.join("\n")
        )
    }
}

pub(super) fn build_brief(
    template: &Template,
    snapshot: &FormSnapshot,
    stylize: bool,
    issue: &IssueStamp,
) -> String {
    let projected = project_fields(template, snapshot);
    let masthead = masthead_value(template, snapshot);

    format!(
        "CRITICAL MISSION: You are an expert Art Director for a world-class fashion magazine. \
Your task is to take a user-uploaded image and transform it into a stunning, high-fashion \
magazine cover.

TEMPLATE STYLE: {name} ({description})
ASPECT RATIO: {aspect_ratio} (Vertical Editorial)

STEP 1: ANALYZE & ENHANCE THE UPLOADED IMAGE
You must first elevate the user's base image to a professional editorial standard.
- Re-light the image with dramatic, high-end studio lighting.
- Enhance skin texture and clothing details.
- Color Grade: Apply a sophisticated, cinematic color grade appropriate for {name}.
- {background}

STEP 2: ARTISTIC TYPOGRAPHY & COMPOSITION
Magazine Title (The Masthead):
- Content: \"{masthead}\"
- Font: Iconic, bold, high-contrast.
- Placement: TOP of the image, centered.
- CRITICAL LAYERING: The title must appear BEHIND the subject's head if they overlap.

Cover Lines (The Text):
- Intelligent Layout: Analyze negative space.
- Font: Mix of weights (BOLD, REGULAR) and sizes.
- Content Generation:
{content}

Final Realistic Details:
- Add a barcode in the corner.
- Add issue date: \"{date_line}\" or \"{issue_line}\".

FINAL CHECK: The output must be a single, cohesive image.",
        name = template.name,
        description = template.description,
        aspect_ratio = template.aspect_ratio,
        background = background_directive(stylize),
        masthead = masthead,
        content = content_instructions(&projected),
        date_line = issue.date_line,
        issue_line = issue.issue_line,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::prompt::IssueStamp;
    use crate::templates::TemplateCatalog;
    use chrono::{TimeZone, Utc};

    fn stamp() -> IssueStamp {
        IssueStamp::new(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(), 3)
    }

    #[test]
    fn vogue_scenario_projects_headline_and_replaces_background() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        form.set_field("masthead", "VOGUE".to_string()).unwrap();
        form.set_field("headline", "The Future of Fashion".to_string())
            .unwrap();

        let brief = build_brief(form.template(), form.snapshot(), true, &stamp());

        assert!(brief.contains("- Headline: \"The Future of Fashion\""));
        assert!(brief.contains("replace it with a clean, minimalist studio background"));
        assert!(!brief.contains("Tagline:"), "blank tagline must not project");
        assert!(!brief.contains("generate all cover lines"));
    }

    #[test]
    fn all_blank_fields_switch_to_the_cover_line_fallback() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        form.set_field("masthead", String::new()).unwrap();

        let brief = build_brief(form.template(), form.snapshot(), true, &stamp());

        assert!(brief.contains("generate all cover lines"));
        assert!(brief.contains("\"FREE SPIRIT\""));
        assert!(brief.contains("\"CUTTING-EDGE STYLE\""));
        assert!(!brief.contains("- Masthead:"));
    }

    #[test]
    fn masthead_falls_back_from_snapshot_to_default_to_literal() {
        let catalog = TemplateCatalog::builtin();
        let vogue = catalog.get("vogue").unwrap();

        let mut form = FormState::for_template(vogue);
        form.set_field("masthead", "W".to_string()).unwrap();
        assert_eq!(masthead_value(vogue, form.snapshot()), "W");

        form.set_field("masthead", "  ".to_string()).unwrap();
        assert_eq!(masthead_value(vogue, form.snapshot()), "VOGUE");

        let mut stripped = vogue.clone();
        stripped.inputs.retain(|field| field.id != "masthead");
        let bare = FormState::for_template(&stripped);
        assert_eq!(masthead_value(&stripped, bare.snapshot()), "MAGAZINE");
    }

    #[test]
    fn preserving_the_background_is_the_default_off_path() {
        let catalog = TemplateCatalog::builtin();
        let form = FormState::for_template(catalog.get("natgeo").unwrap());
        let brief = build_brief(form.template(), form.snapshot(), false, &stamp());
        assert!(brief.contains("DO NOT CHANGE THE BACKGROUND"));
        assert!(!brief.contains("minimalist studio background"));
    }

    #[test]
    fn issue_stamp_tokens_land_in_the_realism_block() {
        let catalog = TemplateCatalog::builtin();
        let form = FormState::for_template(catalog.get("forbes").unwrap());
        let brief = build_brief(form.template(), form.snapshot(), true, &stamp());
        assert!(brief.contains("AUGUST 2026"));
        assert!(brief.contains("ISSUE Nº 3"));
        assert!(brief.contains("barcode"));
    }
}
