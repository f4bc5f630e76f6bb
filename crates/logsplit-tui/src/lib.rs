//! TUI components for logsplit
//!
//! This crate provides the interactive channel viewer: one tab per filter
//! channel plus the unfiltered `original` tab, with state management,
//! keybindings, event handling and rendering.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, ChannelView, LoadedFile, Retention, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{ErrorPopup, FilePrompt, HelpOverlay, StatusBar, viewer_hints};
pub use ui::screens::ChannelViewerScreen;
pub use ui::{Layout, Theme};
