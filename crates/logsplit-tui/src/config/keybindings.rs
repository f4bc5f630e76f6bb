use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    ChannelViewer,
    FilePrompt,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Channel viewer - tabs and less-like scrolling
        let mut viewer = HashMap::new();
        viewer.insert(KeyBinding::new(KeyCode::Tab), Action::NextTab);
        viewer.insert(KeyBinding::new(KeyCode::Right), Action::NextTab);
        viewer.insert(KeyBinding::new(KeyCode::Char('l')), Action::NextTab);
        viewer.insert(KeyBinding::shift(KeyCode::BackTab), Action::PrevTab);
        viewer.insert(KeyBinding::new(KeyCode::BackTab), Action::PrevTab);
        viewer.insert(KeyBinding::new(KeyCode::Left), Action::PrevTab);
        viewer.insert(KeyBinding::new(KeyCode::Char('h')), Action::PrevTab);
        for (n, c) in ('1'..='9').enumerate() {
            viewer.insert(KeyBinding::new(KeyCode::Char(c)), Action::SelectTab(n));
        }
        viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::OpenPrompt);
        bindings.insert(KeyContext::ChannelViewer, viewer);

        // File prompt bindings (when the open-file bar is active)
        let mut prompt = HashMap::new();
        prompt.insert(KeyBinding::new(KeyCode::Enter), Action::PromptSubmit);
        prompt.insert(KeyBinding::new(KeyCode::Esc), Action::PromptCancel);
        prompt.insert(KeyBinding::new(KeyCode::Backspace), Action::PromptBackspace);
        prompt.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PromptClear);
        prompt.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::PromptCancel);
        bindings.insert(KeyContext::FilePrompt, prompt);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while the file prompt is open
    /// Returns Some(Action) for special keys, PromptInput for typed characters
    pub fn get_prompt_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::FilePrompt)
            .and_then(|prompt| prompt.get(&binding))
        {
            return Some(action.clone());
        }

        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                Some(Action::PromptInput(c))
            }
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
