//! Input validation for tagline generation.
//!
//! Checks run in a fixed order: name, then the answers object, then each of
//! the five answers. The first failing check is the one reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tagline::questions::{AnswerSet, QuestionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Name is required")]
    NameRequired,

    #[error("Answers are required")]
    AnswersRequired,

    #[error("All questions must be answered")]
    Incomplete { missing: Vec<QuestionId> },
}

/// Raw request body. Fields stay untyped so that wrong JSON types are
/// reported through `RequestError` instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateTaglinePayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub answers: Option<Value>,
}

/// A validated request: trimmed name plus a complete answer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaglineRequest {
    pub name: String,
    pub answers: AnswerSet,
}

impl TaglineRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.trim().is_empty() {
            return Err(RequestError::NameRequired);
        }
        let missing = self.answers.missing();
        if !missing.is_empty() {
            return Err(RequestError::Incomplete { missing });
        }
        Ok(())
    }
}

impl TryFrom<GenerateTaglinePayload> for TaglineRequest {
    type Error = RequestError;

    fn try_from(payload: GenerateTaglinePayload) -> Result<Self, Self::Error> {
        let name = match payload.name {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Err(RequestError::NameRequired),
        };

        let answers = match payload.answers {
            Some(Value::Object(map)) => AnswerSet::from_json_map(&map),
            _ => return Err(RequestError::AnswersRequired),
        };

        let request = TaglineRequest { name, answers };
        request.validate()?;
        Ok(request)
    }
}
