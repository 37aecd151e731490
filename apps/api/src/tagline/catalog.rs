//! Curated tagline lists, one per personality category.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::tagline::classifier::Category;

const CALM_INTROSPECTIVE: &[&str] = &[
    "I choose calm over chaos",
    "Stillness is my strength",
    "Quiet work, deep progress",
    "Grounded, even when life isn't",
    "I honor my inner pace",
];

const CREATIVE_EXPRESSIVE: &[&str] = &[
    "I turn ideas into action",
    "My life is a work in progress I'm shaping",
    "Expression is how I heal and grow",
    "I create what I wish existed",
    "My ideas deserve to be seen",
];

const PRODUCTIVE_FOCUSED: &[&str] = &[
    "Small disciplined steps, big direction",
    "I show up even when I don't feel like it",
    "Focus today, freedom tomorrow",
    "I am building quietly, consistently",
    "My effort compounds over time",
];

const THOUGHTFUL_DEEP: &[&str] = &[
    "I am learning to understand myself, not just fix myself",
    "My questions matter as much as my answers",
    "I grow by looking beneath the surface",
    "I make space for depth, not just speed",
    "I am willing to sit with my thoughts",
];

const MINIMAL_CLEAN: &[&str] = &[
    "I keep what serves me and release what doesn't",
    "Clarity begins with less noise",
    "Simple choices, intentional life",
    "I protect my energy by simplifying",
    "Space in my surroundings, space in my mind",
];

const HOPEFUL_OPTIMISTIC: &[&str] = &[
    "I trust that better days are ahead",
    "I am allowed to outgrow older versions of myself",
    "Even slow progress is still progress",
    "Hope is a habit I practice daily",
    "I am not behind, I am in process",
];

const TIRED_RESILIENT: &[&str] = &[
    "I can be exhausted and still keep going",
    "Rest is part of my resilience, not a weakness",
    "I have survived every hard day so far",
    "I am tired, but I haven't given up on myself",
    "My persistence is my quiet strength",
];

const UNIVERSAL: &[&str] = &[
    "I am a work in progress, and that's enough",
    "I am learning as I move forward",
    "I don't have it all figured out, and that's okay",
    "I am allowed to start over as many times as I need",
    "I am becoming someone I can trust",
    "I grow a little more every day",
    "I am figuring life out at my own pace",
    "I am allowed to take up space while I learn",
    "I honor the season I am in",
    "I am not perfect, I am evolving",
];

/// Candidate taglines for a category, in catalog order.
pub fn taglines(category: Category) -> &'static [&'static str] {
    match category {
        Category::CalmIntrospective => CALM_INTROSPECTIVE,
        Category::CreativeExpressive => CREATIVE_EXPRESSIVE,
        Category::ProductiveFocused => PRODUCTIVE_FOCUSED,
        Category::ThoughtfulDeep => THOUGHTFUL_DEEP,
        Category::MinimalClean => MINIMAL_CLEAN,
        Category::HopefulOptimistic => HOPEFUL_OPTIMISTIC,
        Category::TiredResilient => TIRED_RESILIENT,
        Category::Universal => UNIVERSAL,
    }
}

/// Uniform draw from the category's list. Repeated calls may return the
/// same tagline.
pub fn pick_tagline<R: Rng + ?Sized>(category: Category, rng: &mut R) -> &'static str {
    let candidates = taglines(category);
    candidates
        .choose(rng)
        .copied()
        .unwrap_or(UNIVERSAL[0])
}
