//! The five fixed personality questions and the answer set built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ────────────────────────────────────────────────────────────────────────────
// Option strings (referenced by the classifier rules)
// ────────────────────────────────────────────────────────────────────────────

pub const Q1_CALM: &str = "Calm and steady";
pub const Q1_DRIVEN: &str = "Driven and focused";
pub const Q1_THOUGHTFUL: &str = "Thoughtful and introspective";
pub const Q1_STRESSED: &str = "Stressed but managing";

pub const Q2_CREATE: &str = "Create, write, design or build something";
pub const Q2_PLAN: &str = "Plan, organize or work toward a goal";
pub const Q2_READ: &str = "Read, reflect or journal";
pub const Q2_REST: &str = "Rest and recharge quietly";

pub const Q3_SIMPLE: &str = "Simple and uncluttered";
pub const Q3_STRUCTURED: &str = "Structured and efficient";
pub const Q3_EXPRESSIVE: &str = "Expressive and full of ideas";
pub const Q3_QUIET: &str = "Quiet and spacious for thinking";

pub const Q4_ROUTINE: &str = "You follow a clear routine";
pub const Q4_ALONE: &str = "You have time alone to think";
pub const Q4_MEANINGFUL: &str = "You are working on something meaningful";
pub const Q4_PROCESSING: &str = "You are processing your thoughts deeply";

pub const Q5_HOPEFUL: &str = "Hopeful and future-focused";
pub const Q5_GRATEFUL: &str = "Grateful and present";
pub const Q5_TIRED: &str = "Tired but still committed";
pub const Q5_QUESTIONING: &str = "Questioning and trying to understand yourself better";

// ────────────────────────────────────────────────────────────────────────────
// Question identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionId {
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
}

impl QuestionId {
    pub const ALL: [QuestionId; 5] = [
        QuestionId::Q1,
        QuestionId::Q2,
        QuestionId::Q3,
        QuestionId::Q4,
        QuestionId::Q5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionId::Q1 => "q1",
            QuestionId::Q2 => "q2",
            QuestionId::Q3 => "q3",
            QuestionId::Q4 => "q4",
            QuestionId::Q5 => "q5",
        }
    }

    pub fn parse(key: &str) -> Option<QuestionId> {
        QuestionId::ALL.into_iter().find(|q| q.as_str() == key)
    }

    /// Zero-based position in the questionnaire.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn question(&self) -> &'static Question {
        &QUESTIONS[self.index()]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Question catalog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
}

impl Question {
    pub fn accepts(&self, option: &str) -> bool {
        self.options.contains(&option)
    }
}

pub static QUESTIONS: [Question; 5] = [
    Question {
        id: QuestionId::Q1,
        prompt: "On most days, you would describe your overall state as:",
        options: [Q1_CALM, Q1_DRIVEN, Q1_THOUGHTFUL, Q1_STRESSED],
    },
    Question {
        id: QuestionId::Q2,
        prompt: "When you have free time, you are more likely to:",
        options: [Q2_CREATE, Q2_PLAN, Q2_READ, Q2_REST],
    },
    Question {
        id: QuestionId::Q3,
        prompt: "Your ideal environment feels:",
        options: [Q3_SIMPLE, Q3_STRUCTURED, Q3_EXPRESSIVE, Q3_QUIET],
    },
    Question {
        id: QuestionId::Q4,
        prompt: "You feel most grounded when:",
        options: [Q4_ROUTINE, Q4_ALONE, Q4_MEANINGFUL, Q4_PROCESSING],
    },
    Question {
        id: QuestionId::Q5,
        prompt: "Right now, your mindset is closest to:",
        options: [Q5_HOPEFUL, Q5_GRATEFUL, Q5_TIRED, Q5_QUESTIONING],
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Answer set
// ────────────────────────────────────────────────────────────────────────────

/// The user's five answers. An empty string means "not answered yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    #[serde(default)]
    pub q1: String,
    #[serde(default)]
    pub q2: String,
    #[serde(default)]
    pub q3: String,
    #[serde(default)]
    pub q4: String,
    #[serde(default)]
    pub q5: String,
}

impl AnswerSet {
    pub fn get(&self, id: QuestionId) -> &str {
        match id {
            QuestionId::Q1 => &self.q1,
            QuestionId::Q2 => &self.q2,
            QuestionId::Q3 => &self.q3,
            QuestionId::Q4 => &self.q4,
            QuestionId::Q5 => &self.q5,
        }
    }

    pub fn set(&mut self, id: QuestionId, answer: impl Into<String>) {
        let slot = match id {
            QuestionId::Q1 => &mut self.q1,
            QuestionId::Q2 => &mut self.q2,
            QuestionId::Q3 => &mut self.q3,
            QuestionId::Q4 => &mut self.q4,
            QuestionId::Q5 => &mut self.q5,
        };
        *slot = answer.into();
    }

    /// Whitespace-only answers count as unanswered.
    pub fn is_answered(&self, id: QuestionId) -> bool {
        !self.get(id).trim().is_empty()
    }

    pub fn missing(&self) -> Vec<QuestionId> {
        QuestionId::ALL
            .into_iter()
            .filter(|q| !self.is_answered(*q))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        QuestionId::ALL.iter().all(|q| self.is_answered(*q))
    }

    /// Builds an answer set from an untyped JSON object. Non-string values
    /// are treated as unanswered; unknown keys are ignored.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut answers = AnswerSet::default();
        for id in QuestionId::ALL {
            if let Some(Value::String(answer)) = map.get(id.as_str()) {
                answers.set(id, answer.clone());
            }
        }
        answers
    }
}
