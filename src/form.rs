use std::collections::HashMap;

use thiserror::Error;

use crate::media::EncodedImage;
use crate::templates::{FieldSpec, FieldType, Template};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please upload a photo before generating.")]
    MissingImage,
    #[error("Field '{0}' does not exist on the active template")]
    UnknownField(String),
}

/// Field values keyed by field id. A present key means the field was
/// initialized or set (possibly to an empty string); an absent key means
/// unset. Iteration for brief output always follows the template's field
/// order, never map order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    values: HashMap<String, String>,
}

impl FormSnapshot {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    pub fn is_blank(&self, id: &str) -> bool {
        self.get(id).map_or(true, |value| value.trim().is_empty())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn set(&mut self, id: &str, value: String) {
        self.values.insert(id.to_string(), value);
    }
}

fn initial_value(field: &FieldSpec) -> String {
    if let Some(default) = field.default_value.as_deref() {
        return default.to_string();
    }
    if field.field_type == FieldType::Select {
        if let Some(first) = field.options.first() {
            return first.clone();
        }
    }
    String::new()
}

/// Holds the current field values, staged upload and stylize toggle for the
/// active template, independent of any submission.
#[derive(Debug, Clone)]
pub struct FormState {
    template: Template,
    snapshot: FormSnapshot,
    image: Option<EncodedImage>,
    stylize: bool,
    validation_error: Option<String>,
}

impl FormState {
    pub fn for_template(template: &Template) -> Self {
        let mut snapshot = FormSnapshot::default();
        for field in &template.inputs {
            snapshot.set(&field.id, initial_value(field));
        }
        Self {
            template: template.clone(),
            snapshot,
            image: None,
            stylize: true,
            validation_error: None,
        }
    }

    /// Resume with a prior snapshot verbatim (the edit-details flow).
    pub fn resume(
        template: &Template,
        snapshot: FormSnapshot,
        image: EncodedImage,
        stylize: bool,
    ) -> Self {
        Self {
            template: template.clone(),
            snapshot,
            image: Some(image),
            stylize,
            validation_error: None,
        }
    }

    /// Swap the active template. Field ids from the old template are dropped
    /// (they may not exist in the new schema); the staged image and stylize
    /// flag survive the switch.
    pub fn switch_template(&mut self, template: &Template) {
        let image = self.image.take();
        let stylize = self.stylize;
        *self = Self::for_template(template);
        self.image = image;
        self.stylize = stylize;
    }

    pub fn set_field(&mut self, id: &str, value: String) -> Result<(), FormError> {
        if self.template.field(id).is_none() {
            return Err(FormError::UnknownField(id.to_string()));
        }
        self.snapshot.set(id, value);
        Ok(())
    }

    pub fn set_image(&mut self, image: Option<EncodedImage>) {
        self.image = image;
        self.validation_error = None;
    }

    pub fn set_stylize(&mut self, stylize: bool) {
        self.stylize = stylize;
    }

    /// The only structural validation: a staged image must exist. Text fields
    /// are never required here.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.image.is_none() {
            return Err(FormError::MissingImage);
        }
        Ok(())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn stylize(&self) -> bool {
        self.stylize
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub(crate) fn note_validation_error(&mut self, message: String) {
        self.validation_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateCatalog;

    fn image() -> EncodedImage {
        EncodedImage::new("image/png", vec![1, 2, 3])
    }

    #[test]
    fn initializes_one_entry_per_field_with_declared_defaults() {
        let catalog = TemplateCatalog::builtin();
        let vogue = catalog.get("vogue").unwrap();
        let form = FormState::for_template(vogue);

        assert_eq!(form.snapshot().len(), vogue.inputs.len());
        assert_eq!(form.snapshot().get("masthead"), Some("VOGUE"));
        assert_eq!(form.snapshot().get("headline"), Some(""));
        assert!(form.stylize());
    }

    #[test]
    fn select_fields_default_to_their_declared_default() {
        let catalog = TemplateCatalog::builtin();
        let linkedin = catalog.get("linkedin-milestone").unwrap();
        let form = FormState::for_template(linkedin);
        assert_eq!(form.snapshot().get("mood"), Some("Professional"));
    }

    #[test]
    fn switching_templates_resets_to_the_new_schema() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        form.set_field("headline", "Hello".to_string()).unwrap();
        form.set_image(Some(image()));

        form.switch_template(catalog.get("youtube-thumbnail").unwrap());

        let expected: Vec<&str> = catalog
            .get("youtube-thumbnail")
            .unwrap()
            .inputs
            .iter()
            .map(|field| field.id.as_str())
            .collect();
        let mut actual: Vec<&str> = form.snapshot().ids().collect();
        actual.sort_unstable();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort_unstable();
        assert_eq!(actual, expected_sorted);
        assert_eq!(form.snapshot().get("headline"), None);
        assert!(form.image().is_some(), "staged image survives the switch");
    }

    #[test]
    fn set_field_rejects_foreign_ids() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        let before = form.snapshot().clone();

        let err = form.set_field("milestone_metric", "10k".to_string());
        assert_eq!(
            err,
            Err(FormError::UnknownField("milestone_metric".to_string()))
        );
        assert_eq!(form.snapshot(), &before);
    }

    #[test]
    fn validate_requires_a_staged_image() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        assert_eq!(form.validate(), Err(FormError::MissingImage));

        form.set_image(Some(image()));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn restaging_an_image_clears_a_stale_validation_error() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        form.note_validation_error(FormError::MissingImage.to_string());
        assert!(form.validation_error().is_some());

        form.set_image(Some(image()));
        assert!(form.validation_error().is_none());

        // Clearing for re-upload is permitted and also resets the error.
        form.note_validation_error("stale".to_string());
        form.set_image(None);
        assert!(form.validation_error().is_none());
    }

    #[test]
    fn blank_and_unset_are_distinguishable() {
        let catalog = TemplateCatalog::builtin();
        let mut form = FormState::for_template(catalog.get("vogue").unwrap());
        form.set_field("headline", String::new()).unwrap();

        assert_eq!(form.snapshot().get("headline"), Some(""));
        assert_eq!(form.snapshot().get("not_a_field"), None);
        assert!(form.snapshot().is_blank("headline"));
        assert!(form.snapshot().is_blank("not_a_field"));
    }
}
