//! Template-driven cover studio core: compiles a declarative template plus
//! user-supplied fields into a creative brief for an external image model,
//! and drives the generate/edit/retry lifecycle as a state machine.
//!
//! The rendering layer is a collaborator, not a resident: it reads
//! [`session::SessionState`] through the controller and calls the
//! controller's transition entry points. Nothing here persists beyond the
//! session.

pub mod config;
pub mod form;
pub mod llm;
pub mod media;
pub mod prompt;
pub mod session;
pub mod templates;
pub mod utils;

pub use form::{FormError, FormSnapshot, FormState};
pub use llm::{EditFailed, GeminiImageClient, GenerationFailed, ImageModel};
pub use media::{EncodedImage, UploadError};
pub use prompt::{compile_brief, CompileError, IssueStamp};
pub use session::{
    GenerationRequest, PendingEdit, PendingGeneration, SessionController, SessionState, Step,
};
pub use templates::{
    catalog, FieldSpec, FieldType, Template, TemplateCatalog, TemplateCategory, TemplateNotFound,
};
