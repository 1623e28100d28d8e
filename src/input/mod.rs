// src/input/mod.rs
//! Capturing exactly one piece of content from the user: a local video, a
//! YouTube link or free text. Shape checks only; nothing here talks to the
//! network.
pub mod preview;
pub mod progress;
pub mod selection;
pub mod validation;

pub use preview::{ObjectUrl, PreviewRegistry};
pub use progress::UploadProgress;
pub use selection::{SelectedFile, UploadSelection};
pub use validation::Submission;
