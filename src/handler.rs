use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::ChatSettled { pending, result } => app.settle(pending, result),
        AppEvent::Uploaded(result) => app.finish_upload(result),
        AppEvent::Transcribed(result) => app.finish_transcription(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit();
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => app.start_editing(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down((app.page_size() / 2).max(1));
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up((app.page_size() / 2).max(1));
        }

        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let composer_newline = key
        .modifiers
        .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => app.stop_editing(),
        KeyCode::Enter => {
            if app.controller.enter_submits(composer_newline) {
                app.submit();
            } else {
                app.controller.composer_mut().insert_newline();
            }
        }
        KeyCode::Backspace => app.controller.composer_mut().backspace(),
        KeyCode::Delete => app.controller.composer_mut().delete(),
        KeyCode::Left => app.controller.composer_mut().move_left(),
        KeyCode::Right => app.controller.composer_mut().move_right(),
        KeyCode::Home => app.controller.composer_mut().move_home(),
        KeyCode::End => app.controller.composer_mut().move_end(),
        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::Char(c) => app.controller.composer_mut().insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspire_core::{ChatReply, ChatRole, Config, ConversationId, Entry, Submission};
    use crate::app::StatusKind;
    use tokio::sync::mpsc;

    fn app_with(config: Config) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(&config, true, None, tx).unwrap()
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_opens_editing_when_auto_focus_is_on() {
        let app = app_with(Config::new());
        assert_eq!(app.input_mode, InputMode::Editing);

        let mut config = Config::new();
        config.settings.enable_auto_focus = false;
        let app = app_with(config);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.controller.composer().is_focused());
    }

    #[test]
    fn test_typing_and_escape() {
        let mut app = app_with(Config::new());
        type_text(&mut app, "héllo");
        handle_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.controller.composer().text(), "héll");

        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        // 'q' quits in normal mode instead of typing
        handle_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
        assert_eq!(app.controller.composer().text(), "héll");
    }

    #[test]
    fn test_modified_enter_inserts_newline() {
        let mut app = app_with(Config::new());
        type_text(&mut app, "line one");
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)),
        );
        type_text(&mut app, "two");
        assert_eq!(app.controller.composer().text(), "line one\ntwo");
        assert_eq!(app.controller.composer().rows(), 2);
        assert!(app.controller.transcript().is_empty());
    }

    #[test]
    fn test_enter_without_shortcuts_inserts_newline() {
        let mut config = Config::new();
        config.settings.enable_keyboard_shortcuts = false;
        let mut app = app_with(config);
        type_text(&mut app, "hi");
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.controller.composer().text(), "hi\n");
        assert!(app.controller.transcript().is_empty());
    }

    #[test]
    fn test_enter_on_blank_composer_does_nothing() {
        let mut app = app_with(Config::new());
        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.controller.transcript().is_empty());
        assert!(!app.controller.is_busy());
    }

    #[test]
    fn test_image_command_runs_locally() {
        let mut app = app_with(Config::new());
        type_text(&mut app, "/image https://example.com/cat.png");
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.controller.image_preview(), Some("https://example.com/cat.png"));
        assert_eq!(app.controller.composer().text(), "");
        assert!(app.controller.transcript().is_empty());
    }

    #[test]
    fn test_settled_event_replaces_placeholder() {
        let mut app = app_with(Config::new());
        app.controller.composer_mut().set_text("hello");
        let Submission::Started(started) = app.controller.begin_submit() else {
            panic!("expected a started submission");
        };

        handle_event(
            &mut app,
            AppEvent::ChatSettled {
                pending: started.pending,
                result: Ok(ChatReply::Error("quota exceeded".into())),
            },
        );

        let transcript = app.controller.transcript();
        assert_eq!(transcript.pending_count(), 0);
        assert!(matches!(
            transcript.entries().last(),
            Some(Entry::Message(m)) if m.role == ChatRole::SystemError && m.content == "quota exceeded"
        ));
        assert!(!app.controller.is_busy());
    }

    fn settle_with_conversation(app: &mut App, id: &str) {
        app.controller.composer_mut().set_text("hello");
        let Submission::Started(started) = app.controller.begin_submit() else {
            panic!("expected a started submission");
        };
        handle_event(
            app,
            AppEvent::ChatSettled {
                pending: started.pending,
                result: Ok(ChatReply::Message {
                    text: "hi there".into(),
                    conversation_id: ConversationId::new(id),
                }),
            },
        );
    }

    #[test]
    fn test_adopted_conversation_is_saved_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut stored = Config::new();
        stored.csrf_token = Some("tok".into());
        stored.save_to(&path).unwrap();

        let mut app = app_with(Config::new());
        app.location_store = Some(path.clone());
        settle_with_conversation(&mut app, "abc123");

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.page_url(), "http://localhost:8000/chat/?conversation_id=abc123");
        assert_eq!(saved.csrf_token.as_deref(), Some("tok"));
        assert!(app.status.is_none());
    }

    #[test]
    fn test_damaged_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut app = app_with(Config::new());
        app.location_store = Some(path.clone());
        settle_with_conversation(&mut app, "abc123");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
        // The conversation is still adopted for this run
        assert_eq!(app.controller.conversation().map(|c| c.as_str()), Some("abc123"));
    }

    #[test]
    fn test_conversation_kept_in_memory_without_store() {
        let mut app = app_with(Config::new());
        assert!(app.location_store.is_none());
        settle_with_conversation(&mut app, "abc123");

        assert!(app.status.is_none());
        assert_eq!(
            app.controller.location().as_str(),
            "http://localhost:8000/chat/?conversation_id=abc123"
        );
        assert_eq!(app.controller.conversation().map(|c| c.as_str()), Some("abc123"));
    }

    #[test]
    fn test_manual_scroll_unpins_until_bottom() {
        let mut app = app_with(Config::new());
        app.sync_scroll(40, 10);
        assert_eq!(app.chat_scroll, 30);

        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Char('k')));
        assert!(!app.controller.is_pinned_to_bottom());
        app.sync_scroll(45, 10);
        assert_eq!(app.chat_scroll, 29);

        handle_event(&mut app, key(KeyCode::Char('G')));
        assert!(app.controller.is_pinned_to_bottom());
        app.sync_scroll(50, 10);
        assert_eq!(app.chat_scroll, 40);
    }
}
