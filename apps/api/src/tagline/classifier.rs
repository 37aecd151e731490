//! Rule-based personality classifier.
//!
//! Rules are evaluated top to bottom and the first match wins. Several rules
//! can hold for the same answers, so the order of `RULES` is part of the
//! behaviour and must not be rearranged.

use serde::{Deserialize, Serialize};

use crate::tagline::questions::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CalmIntrospective,
    CreativeExpressive,
    ProductiveFocused,
    ThoughtfulDeep,
    MinimalClean,
    HopefulOptimistic,
    TiredResilient,
    Universal,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::CalmIntrospective,
        Category::CreativeExpressive,
        Category::ProductiveFocused,
        Category::ThoughtfulDeep,
        Category::MinimalClean,
        Category::HopefulOptimistic,
        Category::TiredResilient,
        Category::Universal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CalmIntrospective => "calm_introspective",
            Category::CreativeExpressive => "creative_expressive",
            Category::ProductiveFocused => "productive_focused",
            Category::ThoughtfulDeep => "thoughtful_deep",
            Category::MinimalClean => "minimal_clean",
            Category::HopefulOptimistic => "hopeful_optimistic",
            Category::TiredResilient => "tired_resilient",
            Category::Universal => "universal",
        }
    }
}

type Predicate = fn(&AnswerSet) -> bool;

/// Priority chain. `Universal` is the fallback and has no rule.
const RULES: &[(Category, Predicate)] = &[
    (Category::CalmIntrospective, calm_introspective),
    (Category::CreativeExpressive, creative_expressive),
    (Category::ProductiveFocused, productive_focused),
    (Category::ThoughtfulDeep, thoughtful_deep),
    (Category::MinimalClean, minimal_clean),
    (Category::HopefulOptimistic, hopeful_optimistic),
    (Category::TiredResilient, tired_resilient),
];

/// Maps a set of answers to its personality category. Never fails: answers
/// that match no rule (including unknown option strings) land in `Universal`.
pub fn classify(answers: &AnswerSet) -> Category {
    RULES
        .iter()
        .find(|(_, matches)| matches(answers))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Universal)
}

fn calm_introspective(a: &AnswerSet) -> bool {
    (a.q1 == Q1_CALM || a.q1 == Q1_THOUGHTFUL) && (a.q4 == Q4_ALONE || a.q4 == Q4_PROCESSING)
}

fn creative_expressive(a: &AnswerSet) -> bool {
    (a.q2 == Q2_CREATE || a.q3 == Q3_EXPRESSIVE) && (a.q3 == Q3_EXPRESSIVE || a.q4 == Q4_MEANINGFUL)
}

fn productive_focused(a: &AnswerSet) -> bool {
    (a.q1 == Q1_DRIVEN || a.q2 == Q2_PLAN) && (a.q3 == Q3_STRUCTURED || a.q4 == Q4_ROUTINE)
}

fn thoughtful_deep(a: &AnswerSet) -> bool {
    (a.q1 == Q1_THOUGHTFUL || a.q4 == Q4_PROCESSING) && (a.q5 == Q5_QUESTIONING || a.q2 == Q2_READ)
}

// The `q3 == Structured` arm can never hold together with `q3 == Simple`;
// it is kept so the rule reads the same as the published rule table.
fn minimal_clean(a: &AnswerSet) -> bool {
    a.q3 == Q3_SIMPLE && (a.q2 == Q2_READ || a.q3 == Q3_STRUCTURED || a.q4 == Q4_ROUTINE)
}

fn hopeful_optimistic(a: &AnswerSet) -> bool {
    a.q5 == Q5_HOPEFUL || a.q5 == Q5_GRATEFUL
}

fn tired_resilient(a: &AnswerSet) -> bool {
    a.q5 == Q5_TIRED || a.q1 == Q1_STRESSED
}
