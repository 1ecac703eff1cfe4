use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// What `Tab` inserts while editing
const INDENT: &str = "    ";

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            app.input_mode = InputMode::Editing;
            app.insert_str(&text);
        }
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::RelayFinished { ticket, result, report } => {
            app.apply_result(ticket, result, report);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('s') => {
                app.submit();
                return;
            }
            _ => {}
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let plain = key.modifiers == KeyModifiers::NONE;

    match key.code {
        // Quit
        KeyCode::Char('q') if plain => app.should_quit = true,

        // Back to the prompt
        KeyCode::Char('i') | KeyCode::Char('a') if plain => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Tab => app.input_mode = InputMode::Editing,

        KeyCode::Enter => {
            app.submit();
        }

        KeyCode::Char('m') if plain => app.toggle_mode(),
        KeyCode::Char('x') if plain => app.clear_prompt(),

        // Result scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('j') if plain => app.scroll_down(),
        KeyCode::Char('k') if plain => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') if plain => app.scroll_top(),
        // Arrives with or without SHIFT depending on the terminal
        KeyCode::Char('G') if !key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Tab => app.insert_str(INDENT),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => {}
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        _ => {}
    }
}
