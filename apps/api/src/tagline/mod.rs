// Personality classification and tagline generation.
// The HTTP boundary lives in handlers; everything else is pure and synchronous
// apart from the TaglineService seam used by the wizard.

pub mod catalog;
pub mod classifier;
pub mod handlers;
pub mod questions;
pub mod service;
pub mod validation;
