//! Event handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::async_ops::AsyncCommand;
use super::state::{AppState, CancelChoice, Mode};
use crate::error::ComposeError;
use crate::theme::Theme;

/// Handle key events, returning an optional async command
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return None;
    }

    match state.mode {
        Mode::Editing => handle_editing_key(state, key),
        Mode::AttachPath => {
            handle_attach_key(state, key);
            None
        }
        Mode::AltText { index } => {
            handle_alt_key(state, key, index);
            None
        }
        Mode::CancelMenu => {
            handle_cancel_menu_key(state, key);
            None
        }
        Mode::Drafts => {
            handle_drafts_key(state, key);
            None
        }
        Mode::ThemePicker => {
            handle_theme_picker_key(state, key);
            None
        }
        Mode::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter) {
                state.mode = Mode::Editing;
            }
            None
        }
    }
}

fn handle_editing_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    // Nothing but quitting while a post is in flight
    if state.composer.sending {
        return None;
    }

    match key.code {
        KeyCode::Char('s') if ctrl => state.submit_command(),
        KeyCode::Char('o') if ctrl => {
            if state.composer.attachments.is_full() {
                state.set_status(ComposeError::TooManyImages.to_string());
            } else {
                state.input.clear();
                state.mode = Mode::AttachPath;
            }
            None
        }
        KeyCode::Char('l') if ctrl => {
            state.open_alt_editor();
            None
        }
        KeyCode::Char('x') if ctrl => {
            state.remove_selected_image();
            None
        }
        KeyCode::Char('d') if ctrl => {
            match state.refresh_drafts() {
                Ok(()) => state.mode = Mode::Drafts,
                Err(e) => state.set_status(format!("Failed to load drafts: {e}")),
            }
            None
        }
        KeyCode::Char('t') if ctrl => {
            state.theme_picker_index = Theme::all()
                .iter()
                .position(|t| *t == state.theme.inner())
                .unwrap_or(0);
            state.mode = Mode::ThemePicker;
            None
        }
        KeyCode::Left if alt => {
            state.select_prev_image();
            None
        }
        KeyCode::Right if alt => {
            state.select_next_image();
            None
        }
        KeyCode::F(1) => {
            state.mode = Mode::Help;
            None
        }
        KeyCode::Esc => {
            if state.composer.is_empty() {
                state.should_quit = true;
            } else {
                state.cancel_index = 0;
                state.mode = Mode::CancelMenu;
            }
            None
        }
        KeyCode::Enter => {
            state.composer.insert_newline();
            state.text_changed();
            None
        }
        KeyCode::Backspace => {
            state.composer.backspace();
            state.text_changed();
            None
        }
        KeyCode::Char(c) if !ctrl && !alt => {
            state.composer.insert_char(c);
            state.text_changed();
            None
        }
        _ => None,
    }
}

/// Shared line editing for the prompts. Returns false for keys it ignores.
fn edit_input(input: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.push(c);
            true
        }
        KeyCode::Backspace => {
            input.pop();
            true
        }
        _ => false,
    }
}

fn handle_attach_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Editing,
        KeyCode::Enter => {
            let path = std::mem::take(&mut state.input);
            match state.attach_image(&path) {
                Ok(()) => {
                    state.mode = Mode::Editing;
                    state.set_status(state.composer.attachments.label());
                }
                Err(e) => {
                    tracing::warn!("Failed to attach {}: {}", path, e);
                    state.input = path;
                    state.set_status(e.to_string());
                }
            }
        }
        _ => {
            edit_input(&mut state.input, key);
        }
    }
}

fn handle_alt_key(state: &mut AppState, key: KeyEvent, index: usize) {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Editing,
        KeyCode::Enter => {
            let alt = std::mem::take(&mut state.input);
            if let Err(e) = state.composer.attachments.set_alt(index, alt) {
                state.set_status(e.to_string());
            }
            state.mode = Mode::Editing;
        }
        _ => {
            edit_input(&mut state.input, key);
        }
    }
}

fn handle_cancel_menu_key(state: &mut AppState, key: KeyEvent) {
    let len = CancelChoice::ALL.len();

    match key.code {
        KeyCode::Esc => state.mode = Mode::Editing,
        KeyCode::Down | KeyCode::Char('j') => state.cancel_index = (state.cancel_index + 1) % len,
        KeyCode::Up | KeyCode::Char('k') => {
            state.cancel_index = state.cancel_index.checked_sub(1).unwrap_or(len - 1);
        }
        KeyCode::Enter => match CancelChoice::ALL[state.cancel_index] {
            CancelChoice::SaveDraft => {
                if let Err(e) = state.save_draft() {
                    tracing::error!("Failed to save draft: {:?}", e);
                    state.set_status(format!("Failed to save draft: {e}"));
                    state.mode = Mode::Editing;
                }
            }
            CancelChoice::Discard => {
                state.discard();
                state.set_status("Draft discarded");
            }
            CancelChoice::KeepEditing => state.mode = Mode::Editing,
        },
        _ => {}
    }
}

fn handle_drafts_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Editing,
        KeyCode::Down | KeyCode::Char('j') => {
            if !state.drafts.is_empty() {
                state.draft_index = (state.draft_index + 1).min(state.drafts.len() - 1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.draft_index = state.draft_index.saturating_sub(1);
        }
        KeyCode::Enter => state.load_selected_draft(),
        KeyCode::Char('d') => {
            if let Err(e) = state.delete_selected_draft() {
                state.set_status(format!("Failed to delete draft: {e}"));
            }
        }
        _ => {}
    }
}

fn handle_theme_picker_key(state: &mut AppState, key: KeyEvent) {
    let themes = Theme::all();
    let len = themes.len();

    match key.code {
        KeyCode::Esc => {
            // Restore the saved theme
            state.theme = state.config.theme;
            state.mode = Mode::Editing;
        }
        KeyCode::Enter => {
            let selected_theme = Theme::from(themes[state.theme_picker_index]);
            state.theme = selected_theme;
            state.config.theme = selected_theme;
            if let Err(e) = state.config.save() {
                tracing::warn!("Failed to save config: {}", e);
            }

            state.mode = Mode::Editing;
            state.set_status(format!("Theme set to {}", selected_theme.name()));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.theme_picker_index = (state.theme_picker_index + 1) % len;
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.theme_picker_index = state.theme_picker_index.checked_sub(1).unwrap_or(len - 1);
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        _ => {}
    }
}
