//! Interactive mode: tabbed viewer over the routed channel buffers

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use logsplit_filter::FilterRegistry;
use logsplit_tui::{
    Action, AppState, ChannelViewerScreen, ErrorPopup, Event, EventHandler, HelpOverlay,
    KeyBindings, KeyContext, Retention, Tui,
};

pub async fn run(
    registry: &FilterRegistry,
    retention: Retention,
    initial: Option<&Path>,
) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut state = AppState::new(registry, retention)?;

    // A bad initial path is shown in the viewer rather than aborting
    if let Some(path) = initial {
        load(&mut state, registry, path);
    }

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state, registry)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = key_action(&state, &keybindings, &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {}
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, registry, &action_tx, action);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, registry)?;
    }

    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Map a key press to an action given what is on screen
fn key_action(state: &AppState, keybindings: &KeyBindings, key: &KeyEvent) -> Option<Action> {
    if state.ui_state.error_message.is_some() {
        return Some(Action::DismissError);
    }
    if state.ui_state.help_visible {
        return Some(Action::ToggleHelp);
    }
    if state.ui_state.prompt_active {
        return keybindings.get_prompt_action(key);
    }
    keybindings.get_action(KeyContext::ChannelViewer, key)
}

fn handle_action(
    state: &mut AppState,
    registry: &FilterRegistry,
    action_tx: &mpsc::UnboundedSender<Action>,
    action: Action,
) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::NextTab => state.next_tab(),
        Action::PrevTab => state.prev_tab(),
        Action::SelectTab(idx) => state.select_tab(idx),
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::OpenPrompt => state.open_prompt(),
        Action::PromptInput(c) => {
            state.ui_state.prompt_input.push(c);
        }
        Action::PromptBackspace => {
            state.ui_state.prompt_input.pop();
        }
        Action::PromptClear => {
            state.ui_state.prompt_input.clear();
        }
        Action::PromptSubmit => {
            if let Some(path) = state.take_prompt() {
                let _ = action_tx.send(Action::LoadFile(path));
            }
        }
        Action::PromptCancel => state.close_prompt(),
        Action::LoadFile(path) => load(state, registry, &path),
        Action::DismissError => state.dismiss_error(),
        Action::Render => {}
    }
}

/// Load `path`, turning a failure into the error banner
fn load(state: &mut AppState, registry: &FilterRegistry, path: &Path) {
    if let Err(e) = state.load_file(registry, path) {
        tracing::warn!(path = %path.display(), error = %e, "load failed");
        state.show_error(e.to_string());
    }
}

fn render(tui: &mut Tui, state: &mut AppState, registry: &FilterRegistry) -> Result<()> {
    tui.terminal().draw(|frame| {
        ChannelViewerScreen::render(frame, state, registry);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if let Some(message) = &state.ui_state.error_message {
            ErrorPopup::render(frame, message);
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use logsplit_filter::{Combinator, FilterSetConfig, RetentionPolicy};
    use std::fs;
    use std::path::PathBuf;

    fn registry() -> FilterRegistry {
        FilterRegistry::build([
            FilterSetConfig::new("A", Combinator::Any).rule("alpha", false),
            FilterSetConfig::new("B", Combinator::Any).rule("beta", false),
        ])
        .unwrap()
    }

    fn state(registry: &FilterRegistry) -> AppState {
        AppState::new(registry, Retention::new(10, RetentionPolicy::KeepFirst)).unwrap()
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_key_action_by_mode() {
        let registry = registry();
        let bindings = KeyBindings::new();
        let mut state = state(&registry);

        assert_eq!(key_action(&state, &bindings, &key('q')), Some(Action::Quit));

        state.open_prompt();
        assert_eq!(
            key_action(&state, &bindings, &key('q')),
            Some(Action::PromptInput('q'))
        );

        state.show_error("boom");
        assert_eq!(
            key_action(&state, &bindings, &key('q')),
            Some(Action::DismissError)
        );
    }

    #[test]
    fn test_prompt_submit_queues_load() {
        let registry = registry();
        let mut state = state(&registry);
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &registry, &tx, Action::OpenPrompt);
        for c in "app.log".chars() {
            handle_action(&mut state, &registry, &tx, Action::PromptInput(c));
        }
        handle_action(&mut state, &registry, &tx, Action::PromptBackspace);
        handle_action(&mut state, &registry, &tx, Action::PromptInput('g'));
        handle_action(&mut state, &registry, &tx, Action::PromptSubmit);

        assert!(!state.ui_state.prompt_active);
        assert_eq!(
            rx.try_recv().unwrap(),
            Action::LoadFile(PathBuf::from("app.log"))
        );
    }

    #[test]
    fn test_load_file_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "alpha\nbeta\n").unwrap();

        let registry = registry();
        let mut state = state(&registry);
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &registry, &tx, Action::LoadFile(path));
        assert_eq!(state.channels[1].buffer.snapshot(), vec!["alpha"]);
        assert_eq!(state.channels[2].buffer.snapshot(), vec!["beta"]);
        assert!(state.ui_state.error_message.is_none());
    }

    #[test]
    fn test_failed_load_shows_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let mut state = state(&registry);
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_action(
            &mut state,
            &registry,
            &tx,
            Action::LoadFile(dir.path().join("missing.log")),
        );
        let message = state.ui_state.error_message.clone().unwrap();
        assert!(message.contains("missing.log"));
        assert!(state.loaded.is_none());

        handle_action(&mut state, &registry, &tx, Action::DismissError);
        assert!(state.ui_state.error_message.is_none());
    }

    #[test]
    fn test_quit_and_help() {
        let registry = registry();
        let mut state = state(&registry);
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_action(&mut state, &registry, &tx, Action::ToggleHelp);
        assert!(state.ui_state.help_visible);
        assert_eq!(
            key_action(&state, &KeyBindings::new(), &key('x')),
            Some(Action::ToggleHelp)
        );

        handle_action(&mut state, &registry, &tx, Action::Quit);
        assert!(state.should_quit);
    }
}
