//! Reusable UI components

mod error_popup;
mod file_prompt;
mod help_overlay;
mod status_bar;

pub use error_popup::ErrorPopup;
pub use file_prompt::FilePrompt;
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, viewer_hints};
