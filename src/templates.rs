use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CONFIG;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Magazine,
    Social,
    Print,
    /// Catch-all for categories introduced by a hand-edited catalog file.
    /// Compilation fails closed on it instead of guessing a strategy.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Color,
    Select,
    Date,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub id: String,
    pub category: TemplateCategory,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub preview_image: Option<String>,
    /// `"<w>/<h>"`, e.g. `"3/4"` for vertical editorial covers.
    pub aspect_ratio: String,
    pub inputs: Vec<FieldSpec>,
}

impl Template {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.inputs.iter().find(|field| field.id == id)
    }
}

#[derive(Debug, Error)]
#[error("Unknown template id '{0}'")]
pub struct TemplateNotFound(pub String);

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Catalog from explicit templates; an empty list falls back to the
    /// built-ins so `default_template` always has something to return.
    pub fn new(templates: Vec<Template>) -> Self {
        if templates.is_empty() {
            warn!("Refusing to build an empty template catalog; using built-ins");
            return Self::builtin();
        }
        Self { templates }
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// First catalog entry; the catalog is never empty (built-ins are the
    /// floor the file loader falls back to).
    pub fn default_template(&self) -> &Template {
        &self.templates[0]
    }
}

static ASPECT_RATIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+/\d+$").expect("valid aspect ratio regex"));

#[derive(Debug, Deserialize)]
struct CatalogFile {
    templates: Vec<Template>,
}

fn validate_templates(templates: Vec<Template>, source: &str) -> Vec<Template> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut valid = Vec::new();

    for template in templates {
        if template.id.trim().is_empty() || template.name.trim().is_empty() {
            warn!("Skipping template with empty id or name in {source}");
            continue;
        }
        if !seen_ids.insert(template.id.clone()) {
            warn!("Skipping duplicate template id '{}' in {source}", template.id);
            continue;
        }
        if !ASPECT_RATIO_RE.is_match(template.aspect_ratio.trim()) {
            warn!(
                "Skipping template '{}' with malformed aspect ratio '{}' in {source}",
                template.id, template.aspect_ratio
            );
            continue;
        }
        if template.category == TemplateCategory::Unknown {
            warn!(
                "Template '{}' in {source} has an unrecognized category; it will fail at brief compilation",
                template.id
            );
        }

        let mut field_ids: HashSet<String> = HashSet::new();
        let fields_ok = template.inputs.iter().all(|field| {
            if field.id.trim().is_empty() || !field_ids.insert(field.id.clone()) {
                warn!(
                    "Template '{}' in {source} has an empty or duplicate field id",
                    template.id
                );
                return false;
            }
            if field.field_type == FieldType::Select && field.options.is_empty() {
                warn!(
                    "Template '{}' field '{}' in {source} is a select without options",
                    template.id, field.id
                );
                return false;
            }
            true
        });
        if !fields_ok {
            continue;
        }

        valid.push(template);
    }

    valid
}

fn parse_catalog(raw: &str, source: &str) -> Vec<Template> {
    match serde_yaml::from_str::<CatalogFile>(raw) {
        Ok(file) => validate_templates(file.templates, source),
        Err(err) => {
            warn!("Failed to parse template catalog {source}: {err}");
            Vec::new()
        }
    }
}

fn load_catalog_from_path(path: &Path) -> Vec<Template> {
    if !path.exists() {
        info!("Template catalog not found at {}", path.display());
        return Vec::new();
    }

    match fs::read_to_string(path) {
        Ok(raw) => parse_catalog(&raw, &path.display().to_string()),
        Err(err) => {
            warn!(
                "Failed to read template catalog at {}: {}",
                path.display(),
                err
            );
            Vec::new()
        }
    }
}

fn build_catalog() -> TemplateCatalog {
    if let Some(path) = CONFIG.template_catalog_path.as_deref() {
        let templates = load_catalog_from_path(path);
        if !templates.is_empty() {
            info!(
                "Loaded {} template(s) from {}",
                templates.len(),
                path.display()
            );
            return TemplateCatalog { templates };
        }
        info!(
            "Falling back to the built-in template catalog ({})",
            path.display()
        );
    }
    TemplateCatalog::builtin()
}

static CATALOG: Lazy<TemplateCatalog> = Lazy::new(build_catalog);

pub fn catalog() -> &'static TemplateCatalog {
    &CATALOG
}

fn text_field(
    id: &str,
    label: &str,
    placeholder: &str,
    default_value: Option<&str>,
) -> FieldSpec {
    FieldSpec {
        id: id.to_string(),
        label: label.to_string(),
        field_type: FieldType::Text,
        placeholder: Some(placeholder.to_string()),
        default_value: default_value.map(str::to_string),
        options: Vec::new(),
        help_text: None,
    }
}

fn select_field(id: &str, label: &str, options: &[&str], default_value: &str) -> FieldSpec {
    FieldSpec {
        id: id.to_string(),
        label: label.to_string(),
        field_type: FieldType::Select,
        placeholder: None,
        default_value: Some(default_value.to_string()),
        options: options.iter().map(|option| option.to_string()).collect(),
        help_text: None,
    }
}

fn color_field(id: &str, label: &str, default_value: &str) -> FieldSpec {
    FieldSpec {
        id: id.to_string(),
        label: label.to_string(),
        field_type: FieldType::Color,
        placeholder: None,
        default_value: Some(default_value.to_string()),
        options: Vec::new(),
        help_text: None,
    }
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "vogue".to_string(),
            category: TemplateCategory::Magazine,
            name: "Vogue".to_string(),
            description: "High fashion editorial style".to_string(),
            preview_image: Some("https://picsum.photos/seed/vogue/400/500".to_string()),
            aspect_ratio: "3/4".to_string(),
            inputs: vec![
                text_field("masthead", "Masthead", "VOGUE", Some("VOGUE")),
                text_field("headline", "Headline", "The Future of Fashion", None),
                text_field("tagline", "Tagline", "A New Era of Style", None),
            ],
        },
        Template {
            id: "forbes".to_string(),
            category: TemplateCategory::Magazine,
            name: "Forbes".to_string(),
            description: "Business & Success".to_string(),
            preview_image: Some("https://picsum.photos/seed/forbes/400/500".to_string()),
            aspect_ratio: "3/4".to_string(),
            inputs: vec![
                text_field("masthead", "Masthead", "Forbes", Some("Forbes")),
                text_field("headline", "Headline", "The Billionaire Mindset", None),
                text_field("tagline", "Tagline", "Secrets to Success", None),
            ],
        },
        Template {
            id: "billboard".to_string(),
            category: TemplateCategory::Magazine,
            name: "Billboard".to_string(),
            description: "Music Industry & Charts".to_string(),
            preview_image: Some("https://picsum.photos/seed/billboard/400/500".to_string()),
            aspect_ratio: "3/4".to_string(),
            inputs: vec![
                text_field("masthead", "Masthead", "Billboard", Some("Billboard")),
                text_field("headline", "Headline", "Top 100", None),
                text_field("author", "Artist Name", "Artist Name", None),
            ],
        },
        Template {
            id: "natgeo".to_string(),
            category: TemplateCategory::Magazine,
            name: "National Geographic".to_string(),
            description: "Nature & Science".to_string(),
            preview_image: Some("https://picsum.photos/seed/natgeo/400/500".to_string()),
            aspect_ratio: "3/4".to_string(),
            inputs: vec![
                text_field(
                    "masthead",
                    "Masthead",
                    "NATIONAL GEOGRAPHIC",
                    Some("NATIONAL GEOGRAPHIC"),
                ),
                text_field("headline", "Headline", "The Unseen World", None),
                text_field("tagline", "Tagline", "Into the Wild", None),
            ],
        },
        Template {
            id: "linkedin-milestone".to_string(),
            category: TemplateCategory::Social,
            name: "LinkedIn Milestone".to_string(),
            description: "Professional achievement post".to_string(),
            preview_image: Some("https://picsum.photos/seed/linkedin/400/500".to_string()),
            aspect_ratio: "4/5".to_string(),
            inputs: vec![
                text_field(
                    "milestone_metric",
                    "Metric (e.g. Followers)",
                    "Followers",
                    None,
                ),
                text_field(
                    "milestone_number",
                    "Number (e.g. 10,000)",
                    "10,000",
                    None,
                ),
                color_field("highlight_color", "Brand Color", "#0077B5"),
                select_field(
                    "mood",
                    "Vibe",
                    &["Professional", "Excited", "Minimalist", "Bold"],
                    "Professional",
                ),
            ],
        },
        Template {
            id: "youtube-thumbnail".to_string(),
            category: TemplateCategory::Social,
            name: "YouTube Thumbnail".to_string(),
            description: "High CTR video cover".to_string(),
            preview_image: Some("https://picsum.photos/seed/yt/640/360".to_string()),
            aspect_ratio: "16/9".to_string(),
            inputs: vec![
                text_field("main_text", "Main Hook", "I BUILT AN AI APP", None),
                text_field("sub_text", "Subtext", "(It actually works)", None),
                select_field(
                    "expression",
                    "Facial Expression",
                    &["Shocked", "Happy", "Serious", "Focused"],
                    "Shocked",
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_serves_the_six_templates() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.list().len(), 6);
        assert_eq!(catalog.default_template().id, "vogue");
        assert_eq!(
            catalog.get("youtube-thumbnail").map(|t| t.category),
            Some(TemplateCategory::Social)
        );
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn select_fields_always_carry_options() {
        for template in TemplateCatalog::builtin().list() {
            for field in &template.inputs {
                if field.field_type == FieldType::Select {
                    assert!(!field.options.is_empty(), "{}.{}", template.id, field.id);
                }
            }
        }
    }

    #[test]
    fn parses_a_valid_catalog_file() {
        let raw = r#"
templates:
  - id: zine
    category: print
    name: Zine
    description: Punk photocopy zine
    aspect_ratio: 3/4
    inputs:
      - id: masthead
        label: Masthead
        type: text
        default_value: ZINE
      - id: mood
        label: Mood
        type: select
        options: [Loud, Quiet]
"#;
        let templates = parse_catalog(raw, "test");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].category, TemplateCategory::Print);
        assert_eq!(templates[0].inputs.len(), 2);
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let raw = r#"
templates:
  - id: ok
    category: magazine
    name: Ok
    description: fine
    aspect_ratio: 3/4
    inputs: []
  - id: bad-ratio
    category: magazine
    name: Bad
    description: broken
    aspect_ratio: portrait
    inputs: []
  - id: ok
    category: magazine
    name: Duplicate
    description: same id again
    aspect_ratio: 3/4
    inputs: []
  - id: bad-select
    category: social
    name: BadSelect
    description: select without options
    aspect_ratio: 1/1
    inputs:
      - id: mood
        label: Mood
        type: select
"#;
        let templates = parse_catalog(raw, "test");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "ok");
    }

    #[test]
    fn unknown_category_is_kept_but_tagged() {
        let raw = r#"
templates:
  - id: odd
    category: billboard-truck
    name: Odd
    description: not a known family
    aspect_ratio: 1/1
    inputs: []
"#;
        let templates = parse_catalog(raw, "test");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].category, TemplateCategory::Unknown);
    }

    #[test]
    fn garbage_input_yields_no_templates() {
        assert!(parse_catalog("not: [valid", "test").is_empty());
    }
}
