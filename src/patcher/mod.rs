pub mod document;
pub mod engine;

pub use document::Document;
pub use engine::{apply, apply_in_place};
