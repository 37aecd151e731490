//! Tagline service seam.
//!
//! The wizard only talks to `dyn TaglineService`. `TaglineGenerator` runs the
//! classifier in-process; `crate::client::HttpTaglineClient` forwards to a
//! remote instance of this API.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::tagline::catalog::pick_tagline;
use crate::tagline::classifier::{classify, Category};
use crate::tagline::questions::AnswerSet;
use crate::tagline::validation::{RequestError, TaglineRequest};

#[derive(Debug, Error)]
pub enum TaglineError {
    #[error(transparent)]
    Invalid(#[from] RequestError),

    /// The remote service answered 400 with its own message.
    #[error("{message}")]
    Rejected { message: String, missing: Vec<String> },

    #[error("tagline request timed out")]
    Timeout,

    #[error("tagline service unavailable: {0}")]
    Transport(String),

    #[error("tagline generator unavailable: {0}")]
    Internal(String),
}

#[async_trait]
pub trait TaglineService: Send + Sync {
    async fn generate(&self, request: &TaglineRequest) -> Result<String, TaglineError>;
}

/// In-process generator: classify, then draw from the category's list.
///
/// The random source is injectable so tests can pin the draw.
pub struct TaglineGenerator {
    rng: Mutex<StdRng>,
}

impl TaglineGenerator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Classifies already-validated answers and draws a tagline.
    pub fn generate_for(&self, answers: &AnswerSet) -> Result<(Category, &'static str), TaglineError> {
        let category = classify(answers);
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| TaglineError::Internal(e.to_string()))?;
        let tagline = pick_tagline(category, &mut *rng);
        debug!(category = category.as_str(), "tagline drawn");
        Ok((category, tagline))
    }
}

impl Default for TaglineGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaglineService for TaglineGenerator {
    async fn generate(&self, request: &TaglineRequest) -> Result<String, TaglineError> {
        request.validate()?;
        let (_, tagline) = self.generate_for(&request.answers)?;
        Ok(tagline.to_string())
    }
}
