//! Card-maker wizard.
//!
//! A strictly linear state machine:
//! `Questions → Name → Photo → Gradient → Preview`.
//!
//! Forward moves are guarded by the current step; backward moves never are.
//! Leaving `Gradient` calls the tagline service and only advances when the
//! call succeeds. One `Wizard` is owned by exactly one session.

pub mod gradients;
pub mod handlers;
pub mod photo;
pub mod session;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tagline::questions::{AnswerSet, QuestionId};
use crate::tagline::service::{TaglineError, TaglineService};
use crate::tagline::validation::TaglineRequest;
use crate::wizard::gradients::{find_gradient, DEFAULT_GRADIENT_ID};
use crate::wizard::photo::PhotoPreview;

pub const DEFAULT_IMAGE_POSITION: u8 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Steps
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Questions,
    Name,
    Photo,
    Gradient,
    Preview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Questions,
        WizardStep::Name,
        WizardStep::Photo,
        WizardStep::Gradient,
        WizardStep::Preview,
    ];

    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<WizardStep> {
        WizardStep::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn previous(&self) -> Option<WizardStep> {
        self.ordinal()
            .checked_sub(1)
            .and_then(|i| WizardStep::ALL.get(i).copied())
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Please answer all questions")]
    QuestionsIncomplete,

    #[error("Please enter your name")]
    NameMissing,

    #[error("Please upload a photo")]
    PhotoMissing,

    #[error("Please answer this question first")]
    QuestionUnanswered,

    #[error("'{answer}' is not an option for {question}")]
    InvalidOption { question: &'static str, answer: String },

    #[error("Unknown gradient '{0}'")]
    UnknownGradient(String),

    #[error("Image position must be between 0 and 100")]
    InvalidPosition,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Already at the last step")]
    AtLastStep,

    #[error("A tagline can only be regenerated from the preview")]
    NotInPreview,

    #[error(transparent)]
    Tagline(#[from] TaglineError),
}

// ────────────────────────────────────────────────────────────────────────────
// Form state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FormState {
    pub name: String,
    pub answers: AnswerSet,
    pub photo: Option<PhotoPreview>,
    /// Vertical placement of the photo in its frame, `0..=100`.
    pub image_position: u8,
    pub gradient_id: &'static str,
    pub step: WizardStep,
}

impl Default for FormState {
    fn default() -> Self {
        FormState {
            name: String::new(),
            answers: AnswerSet::default(),
            photo: None,
            image_position: DEFAULT_IMAGE_POSITION,
            gradient_id: DEFAULT_GRADIENT_ID,
            step: WizardStep::Questions,
        }
    }
}

/// Cursor over the five questions inside the `Questions` step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionCursor {
    index: usize,
}

impl QuestionCursor {
    pub fn current(&self) -> QuestionId {
        QuestionId::ALL[self.index]
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index == QuestionId::ALL.len() - 1
    }

    /// Moves to the next question. Disabled until the current one is answered;
    /// a no-op on the last question.
    pub fn next(&mut self, answers: &AnswerSet) -> Result<QuestionId, WizardError> {
        if !answers.is_answered(self.current()) {
            return Err(WizardError::QuestionUnanswered);
        }
        if !self.is_last() {
            self.index += 1;
        }
        Ok(self.current())
    }

    pub fn previous(&mut self) -> QuestionId {
        self.index = self.index.saturating_sub(1);
        self.current()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wizard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Wizard {
    form: FormState,
    cursor: QuestionCursor,
    tagline: Option<String>,
    error: Option<String>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn step(&self) -> WizardStep {
        self.form.step
    }

    pub fn tagline(&self) -> Option<&str> {
        self.tagline.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cursor(&self) -> QuestionCursor {
        self.cursor
    }

    /// Records an answer. Only the question's listed options are accepted.
    pub fn set_answer(&mut self, question: QuestionId, answer: &str) -> Result<(), WizardError> {
        if !question.question().accepts(answer) {
            return Err(WizardError::InvalidOption {
                question: question.as_str(),
                answer: answer.to_string(),
            });
        }
        self.form.answers.set(question, answer);
        Ok(())
    }

    pub fn next_question(&mut self) -> Result<QuestionId, WizardError> {
        self.cursor.next(&self.form.answers)
    }

    pub fn previous_question(&mut self) -> QuestionId {
        self.cursor.previous()
    }

    pub fn set_name(&mut self, name: &str) {
        self.form.name = name.to_string();
    }

    /// Replaces the photo. The previous bitmap is dropped here, and the crop
    /// offset goes back to the centre.
    pub fn set_photo(&mut self, photo: PhotoPreview) {
        if let Some(old) = self.form.photo.replace(photo) {
            debug!(bytes = old.size_bytes, "released previous photo");
        }
        self.form.image_position = DEFAULT_IMAGE_POSITION;
    }

    pub fn set_image_position(&mut self, position: u8) -> Result<(), WizardError> {
        if position > 100 {
            return Err(WizardError::InvalidPosition);
        }
        self.form.image_position = position;
        Ok(())
    }

    pub fn select_gradient(&mut self, id: &str) -> Result<(), WizardError> {
        let theme = find_gradient(id).ok_or_else(|| WizardError::UnknownGradient(id.to_string()))?;
        self.form.gradient_id = theme.id;
        Ok(())
    }

    /// Forward guard for the current step. `Gradient` is structurally
    /// unguarded; its move depends on the tagline call.
    pub fn check_forward(&self) -> Result<(), WizardError> {
        match self.form.step {
            WizardStep::Questions if !self.form.answers.is_complete() => {
                Err(WizardError::QuestionsIncomplete)
            }
            WizardStep::Name if self.form.name.trim().is_empty() => Err(WizardError::NameMissing),
            WizardStep::Photo if self.form.photo.is_none() => Err(WizardError::PhotoMissing),
            WizardStep::Preview => Err(WizardError::AtLastStep),
            _ => Ok(()),
        }
    }

    pub fn can_advance(&self) -> bool {
        self.check_forward().is_ok()
    }

    /// Moves one step forward. On failure the step is unchanged and the
    /// error message is kept as the banner.
    pub async fn advance(
        &mut self,
        service: &dyn TaglineService,
        timeout: Duration,
    ) -> Result<WizardStep, WizardError> {
        if let Err(e) = self.check_forward() {
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.error = None;

        if self.form.step == WizardStep::Gradient {
            let tagline = self.request_tagline(service, timeout).await?;
            self.tagline = Some(tagline);
        }

        if let Some(next) = self.form.step.next() {
            self.form.step = next;
        }
        info!(step = ?self.form.step, "wizard advanced");
        Ok(self.form.step)
    }

    /// Draws a new tagline for the same answers while on the preview.
    pub async fn regenerate(
        &mut self,
        service: &dyn TaglineService,
        timeout: Duration,
    ) -> Result<String, WizardError> {
        if self.form.step != WizardStep::Preview {
            return Err(WizardError::NotInPreview);
        }
        self.error = None;
        let tagline = self.request_tagline(service, timeout).await?;
        self.tagline = Some(tagline.clone());
        Ok(tagline)
    }

    /// Moves one step back without validating and clears the banner.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let previous = self.form.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.error = None;
        self.form.step = previous;
        Ok(previous)
    }

    /// Start over: every field back to its default. Drops the tagline and
    /// the photo bitmap.
    pub fn reset(&mut self) {
        *self = Wizard::default();
    }

    async fn request_tagline(
        &mut self,
        service: &dyn TaglineService,
        timeout: Duration,
    ) -> Result<String, WizardError> {
        let request = TaglineRequest {
            name: self.form.name.trim().to_string(),
            answers: self.form.answers.clone(),
        };

        let result = match tokio::time::timeout(timeout, service.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(TaglineError::Timeout),
        };

        result.map_err(|e| {
            warn!("tagline generation failed: {e}");
            self.error = Some(banner_for(&e));
            WizardError::Tagline(e)
        })
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let progress = (self.form.step != WizardStep::Preview).then(|| {
            let current = self.form.step.ordinal() + 1;
            Progress {
                current,
                total: 4,
                percent: (current * 100 / 4) as u8,
            }
        });

        WizardSnapshot {
            step: self.form.step,
            step_index: self.form.step.ordinal(),
            progress,
            current_question: self.cursor.current(),
            name: self.form.name.clone(),
            answers: self.form.answers.clone(),
            photo: self.form.photo.as_ref().map(|p| {
                let (width, height) = p.dimensions();
                PhotoSummary {
                    file_name: p.file_name.clone(),
                    mime: p.mime.clone(),
                    size_bytes: p.size_bytes,
                    width,
                    height,
                }
            }),
            image_position: self.form.image_position,
            gradient_id: self.form.gradient_id,
            tagline: self.tagline.clone(),
            error: self.error.clone(),
            can_advance: self.can_advance(),
        }
    }
}

/// Message shown to the user for a failed tagline call. Validation messages
/// pass through; transport failures get a generic retry prompt.
fn banner_for(err: &TaglineError) -> String {
    match err {
        TaglineError::Invalid(e) => e.to_string(),
        TaglineError::Rejected { message, .. } => message.clone(),
        _ => "Failed to generate tagline. Please try again.".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Snapshot (API view)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoSummary {
    pub file_name: Option<String>,
    pub mime: String,
    pub size_bytes: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub step_index: usize,
    pub progress: Option<Progress>,
    pub current_question: QuestionId,
    pub name: String,
    pub answers: AnswerSet,
    pub photo: Option<PhotoSummary>,
    pub image_position: u8,
    pub gradient_id: &'static str,
    pub tagline: Option<String>,
    pub error: Option<String>,
    pub can_advance: bool,
}
