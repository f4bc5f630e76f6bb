use std::path::PathBuf;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Quit,
    NextTab,
    PrevTab,
    SelectTab(usize),

    // UI toggles
    ToggleHelp,

    // Channel viewer scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,

    // Open-file prompt
    OpenPrompt,
    PromptInput(char),
    PromptBackspace,
    PromptClear,
    PromptSubmit,
    PromptCancel,

    // Loading
    LoadFile(PathBuf),

    // Error handling
    DismissError,

    // Render request
    Render,
}
