use tracing::{debug, warn};

use crate::form::{FormError, FormSnapshot, FormState};
use crate::llm::{EditFailed, GenerationFailed, ImageModel};
use crate::media::EncodedImage;
use crate::prompt::{compile_brief, IssueStamp};
use crate::templates::{Template, TemplateCatalog, TemplateNotFound};
use crate::utils::timing::RequestTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Hero,
    FillForm,
    Generating,
    ShowResult,
    Error,
}

/// Everything one generation attempt was made from, retained verbatim so the
/// exact request can be retried or resumed for editing.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: Template,
    pub snapshot: FormSnapshot,
    pub source_image: EncodedImage,
    pub stylize: bool,
}

/// Local state of the iterative-edit sub-flow inside `ShowResult`. Independent
/// of the top-level machine: an edit failure never leaves the result screen.
#[derive(Debug, Clone, Default)]
pub struct EditFlow {
    pub pending: bool,
    pub error: Option<String>,
    pub instruction: String,
}

/// The single mutable aggregate of the session. Owned exclusively by the
/// controller; everything else reads it through `SessionController::state`.
#[derive(Debug)]
pub struct SessionState {
    pub step: Step,
    pub selected_template: Template,
    pub form: FormState,
    pub last_request: Option<GenerationRequest>,
    pub current_image: Option<EncodedImage>,
    pub error_message: String,
    pub edit: EditFlow,
}

/// A launched generation attempt: the compiled brief plus the sequence id the
/// resolution must present to be applied.
#[derive(Debug)]
pub struct PendingGeneration {
    pub seq: u64,
    pub brief: String,
    pub source_image: EncodedImage,
}

#[derive(Debug)]
pub struct PendingEdit {
    pub seq: u64,
    pub image: EncodedImage,
    pub instruction: String,
}

const MISCONFIGURED_TEMPLATE_MESSAGE: &str =
    "Failed to generate the design. The selected template is misconfigured.";

/// Drives the end-to-end flow as a state machine. All user-triggered
/// transitions are synchronous; async resolutions are applied only when their
/// sequence id is still the latest one issued, so a slow superseded request
/// can never overwrite state established by a newer one.
pub struct SessionController {
    catalog: TemplateCatalog,
    state: SessionState,
    latest_seq: u64,
    timer: Option<RequestTimer>,
}

impl SessionController {
    pub fn new(catalog: TemplateCatalog) -> Self {
        let selected_template = catalog.default_template().clone();
        let form = FormState::for_template(&selected_template);
        Self {
            catalog,
            state: SessionState {
                step: Step::Hero,
                selected_template,
                form,
                last_request: None,
                current_image: None,
                error_message: String::new(),
                edit: EditFlow::default(),
            },
            latest_seq: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn start(&mut self) {
        if self.state.step == Step::Hero {
            self.state.step = Step::FillForm;
        }
    }

    /// Back out of the form without discarding anything staged.
    pub fn cancel(&mut self) {
        if self.state.step == Step::FillForm {
            self.state.step = Step::Hero;
        }
    }

    pub fn select_template(&mut self, id: &str) -> Result<(), TemplateNotFound> {
        let template = self
            .catalog
            .get(id)
            .ok_or_else(|| TemplateNotFound(id.to_string()))?
            .clone();
        if template.id == self.state.selected_template.id {
            return Ok(());
        }
        self.state.form.switch_template(&template);
        self.state.selected_template = template;
        Ok(())
    }

    pub fn set_field(&mut self, id: &str, value: String) -> Result<(), FormError> {
        self.state.form.set_field(id, value)
    }

    pub fn set_image(&mut self, image: Option<EncodedImage>) {
        self.state.form.set_image(image);
    }

    pub fn set_stylize(&mut self, stylize: bool) {
        self.state.form.set_stylize(stylize);
    }

    fn next_seq(&mut self) -> u64 {
        self.latest_seq += 1;
        self.latest_seq
    }

    fn supersede_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.settle("superseded", None);
        }
    }

    /// Validate, snapshot and launch a generation. On a missing image the
    /// error is surfaced inline and no transition happens; the adapter is
    /// never invoked. A new submission supersedes any in-flight one.
    pub fn begin_submit(&mut self) -> Option<PendingGeneration> {
        if !matches!(self.state.step, Step::FillForm | Step::Generating) {
            warn!("Ignoring submit from step {:?}", self.state.step);
            return None;
        }

        let source_image = match self.state.form.image() {
            Some(image) => image.clone(),
            None => {
                self.state
                    .form
                    .note_validation_error(FormError::MissingImage.to_string());
                return None;
            }
        };

        let request = GenerationRequest {
            template: self.state.selected_template.clone(),
            snapshot: self.state.form.snapshot().clone(),
            source_image,
            stylize: self.state.form.stylize(),
        };
        self.launch(request)
    }

    fn launch(&mut self, request: GenerationRequest) -> Option<PendingGeneration> {
        let issue = IssueStamp::sample();
        let brief = match compile_brief(&request.template, &request.snapshot, request.stylize, &issue)
        {
            Ok(brief) => brief,
            Err(err) => {
                warn!(
                    "Brief compilation failed for template '{}': {err}",
                    request.template.id
                );
                self.supersede_timer();
                self.state.last_request = Some(request);
                self.state.error_message = MISCONFIGURED_TEMPLATE_MESSAGE.to_string();
                self.state.step = Step::Error;
                return None;
            }
        };

        let seq = self.next_seq();
        self.supersede_timer();
        self.timer = Some(RequestTimer::start("generate", seq, &request.template.id));

        let source_image = request.source_image.clone();
        self.state.error_message.clear();
        self.state.last_request = Some(request);
        self.state.step = Step::Generating;
        Some(PendingGeneration {
            seq,
            brief,
            source_image,
        })
    }

    /// Apply a generation outcome, unless a newer request has been issued in
    /// the meantime ("latest request wins").
    pub fn resolve_generation(
        &mut self,
        seq: u64,
        result: Result<EncodedImage, GenerationFailed>,
    ) {
        if seq != self.latest_seq || self.state.step != Step::Generating {
            debug!(
                "Dropping stale generation resolution (seq={seq}, latest={}, step={:?})",
                self.latest_seq, self.state.step
            );
            return;
        }

        let timer = self.timer.take();
        match result {
            Ok(image) => {
                self.state.current_image = Some(image);
                self.state.error_message.clear();
                self.state.edit = EditFlow::default();
                self.state.step = Step::ShowResult;
                if let Some(timer) = timer {
                    timer.settle("success", None);
                }
            }
            Err(err) => {
                if let Some(timer) = timer {
                    timer.settle("error", Some(&err.to_string()));
                }
                self.state.error_message = format!("{err}. Please try again.");
                self.state.step = Step::Error;
            }
        }
    }

    pub async fn submit(&mut self, model: &impl ImageModel) {
        let Some(pending) = self.begin_submit() else {
            return;
        };
        let result = model.generate(&pending.brief, &pending.source_image).await;
        self.resolve_generation(pending.seq, result);
    }

    /// Relaunch the exact retained request, unchanged. Only the brief's issue
    /// stamp is re-sampled; fields, image and stylize flag are verbatim.
    pub fn begin_retry(&mut self) -> Option<PendingGeneration> {
        if self.state.step != Step::Error {
            return None;
        }
        match self.state.last_request.clone() {
            Some(request) => self.launch(request),
            None => {
                // Nothing retained to retry; fall back to the editor.
                self.state.error_message.clear();
                self.state.step = Step::FillForm;
                None
            }
        }
    }

    pub async fn retry(&mut self, model: &impl ImageModel) {
        let Some(pending) = self.begin_retry() else {
            return;
        };
        let result = model.generate(&pending.brief, &pending.source_image).await;
        self.resolve_generation(pending.seq, result);
    }

    fn resume_form(&mut self) {
        if let Some(request) = &self.state.last_request {
            self.state.selected_template = request.template.clone();
            self.state.form = FormState::resume(
                &request.template,
                request.snapshot.clone(),
                request.source_image.clone(),
                request.stylize,
            );
        } else {
            self.state.form = FormState::for_template(&self.state.selected_template);
        }
    }

    /// ShowResult -> FillForm, resuming fields, image and stylize flag from
    /// the retained request.
    pub fn edit_details(&mut self) {
        if self.state.step != Step::ShowResult {
            return;
        }
        self.state.edit = EditFlow::default();
        self.resume_form();
        self.state.step = Step::FillForm;
    }

    /// ShowResult -> FillForm from scratch: request and result are discarded.
    pub fn start_over(&mut self) {
        if self.state.step != Step::ShowResult {
            return;
        }
        self.state.current_image = None;
        self.state.error_message.clear();
        self.state.last_request = None;
        self.state.edit = EditFlow::default();
        self.state.form = FormState::for_template(&self.state.selected_template);
        self.state.step = Step::FillForm;
    }

    /// Error -> FillForm, resuming from the retained request.
    pub fn back_to_editor(&mut self) {
        if self.state.step != Step::Error {
            return;
        }
        self.state.error_message.clear();
        self.resume_form();
        self.state.step = Step::FillForm;
    }

    /// Launch an edit of the currently displayed image. Edits chain: the
    /// input is whatever is on screen, which may itself be an edit product.
    pub fn begin_edit(&mut self, instruction: &str) -> Option<PendingEdit> {
        if self.state.step != Step::ShowResult || self.state.edit.pending {
            return None;
        }
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return None;
        }
        let Some(image) = self.state.current_image.clone() else {
            return None;
        };

        let seq = self.next_seq();
        self.state.edit.pending = true;
        self.state.edit.error = None;
        self.state.edit.instruction = instruction.to_string();
        self.supersede_timer();
        self.timer = Some(RequestTimer::start(
            "edit",
            seq,
            &self.state.selected_template.id,
        ));
        Some(PendingEdit {
            seq,
            image,
            instruction: instruction.to_string(),
        })
    }

    /// Apply an edit outcome. A failing edit keeps the pre-edit image on
    /// screen; a stale resolution (superseded, or the user already left the
    /// result screen) is dropped.
    pub fn resolve_edit(&mut self, seq: u64, result: Result<EncodedImage, EditFailed>) {
        if seq != self.latest_seq
            || self.state.step != Step::ShowResult
            || !self.state.edit.pending
        {
            debug!(
                "Dropping stale edit resolution (seq={seq}, latest={}, step={:?})",
                self.latest_seq, self.state.step
            );
            return;
        }

        let timer = self.timer.take();
        self.state.edit.pending = false;
        match result {
            Ok(image) => {
                self.state.current_image = Some(image);
                self.state.edit.instruction.clear();
                self.state.edit.error = None;
                if let Some(timer) = timer {
                    timer.settle("success", None);
                }
            }
            Err(err) => {
                if let Some(timer) = timer {
                    timer.settle("error", Some(&err.to_string()));
                }
                self.state.edit.error = Some(err.to_string());
            }
        }
    }

    pub async fn apply_edit(&mut self, model: &impl ImageModel, instruction: &str) {
        let Some(pending) = self.begin_edit(instruction) else {
            return;
        };
        let result = model.edit(&pending.image, &pending.instruction).await;
        self.resolve_edit(pending.seq, result);
    }
}
