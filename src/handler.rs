use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            if app.input_mode == InputMode::Editing && !app.inspector_open() {
                app.insert_str(&text);
            }
        }
        AppEvent::Resize => app.follow_tail = true,
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Any key dismisses a notice such as "Copied JSON"
    app.notice = None;

    if app.inspector_open() {
        handle_inspector(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_inspector(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => app.close_inspector(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.inspector_scroll = app.inspector_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.inspector_scroll = app.inspector_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => app.inspector_scroll = 0,
        KeyCode::Char('c') => {
            if let Some(json) = app.selected_json() {
                app.notice = Some(if copy_to_clipboard(&json) {
                    "Copied JSON".to_string()
                } else {
                    "No clipboard tool found".to_string()
                });
            }
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.highlighted = None;
        }

        // Walk over replies that carry a full response
        KeyCode::Char('j') | KeyCode::Down => app.highlight_next(),
        KeyCode::Char('k') | KeyCode::Up => app.highlight_prev(),
        KeyCode::Enter | KeyCode::Char('o') => {
            if !app.open_inspector() {
                app.notice = Some("No full response to show yet".to_string());
            }
        }

        // Chat scrolling
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Re-check the backend
        KeyCode::Char('r') => app.check_health(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // Shift+Enter only arrives on terminals with keyboard enhancement, so
        // Alt+Enter does the same.
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.inspector_open() {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                app.inspector_scroll = app.inspector_scroll.saturating_add(3);
            }
            MouseEventKind::ScrollUp => {
                app.inspector_scroll = app.inspector_scroll.saturating_sub(3);
            }
            _ => {}
        }
        return;
    }

    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

/// Hand the text to the first clipboard tool that is installed.
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    const TOOLS: [(&str, &[&str]); 4] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("clip.exe", &[]),
    ];

    for (program, args) in TOOLS {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };
        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(text.as_bytes()).is_err() {
                continue;
            }
        }
        return child.wait().map(|status| status.success()).unwrap_or(false);
    }
    tracing::warn!("no clipboard tool available");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::offline_app;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn test_enter_submits_and_alt_enter_adds_newline() {
        let mut app = offline_app();
        type_text(&mut app, "line one");
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::ALT));
        type_text(&mut app, "two");
        assert_eq!(app.input, "line one\ntwo");

        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.input.is_empty());
        let messages = app.chat.session().messages();
        assert_eq!(messages.last().unwrap().content, "line one\ntwo");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_editing() {
        let mut app = offline_app();
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_q_types_while_editing_and_quits_in_normal_mode() {
        let mut app = offline_app();
        handle_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.input, "q");

        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_enter_without_payload_shows_notice() {
        let mut app = offline_app();
        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(!app.inspector_open());
        assert!(app.notice.is_some());
    }

    #[tokio::test]
    async fn test_inspector_opens_on_reply_with_payload() {
        use rapidscale_chat::{AskClient, Chat, ChatOptions};
        use serde_json::json;
        use std::time::Duration;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"summary": "Short", "details": {"score": 3}})),
            )
            .mount(&server)
            .await;
        let client =
            AskClient::new(&format!("{}/ask", server.uri()), Duration::from_secs(5)).unwrap();
        let options = ChatOptions {
            welcome_message: "Welcome".to_string(),
            typing_delay: Duration::from_millis(1),
        };
        let mut app = App::new(Chat::new(client, options));

        type_text(&mut app, "score?");
        handle_event(&mut app, key(KeyCode::Enter));
        app.chat.run_until_idle().await;
        let count = app.chat.session().messages().len();

        handle_event(&mut app, key(KeyCode::Esc));
        handle_event(&mut app, key(KeyCode::Char('j')));
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.inspector_open());
        let json = app.selected_json().unwrap();
        assert!(json.contains("\"score\": 3"));

        handle_event(&mut app, key(KeyCode::Esc));
        assert!(!app.inspector_open());
        assert_eq!(app.chat.session().messages().len(), count);
        assert_eq!(app.chat.session().messages()[count - 1].content, "Short");
    }

    #[tokio::test]
    async fn test_paste_goes_to_input() {
        let mut app = offline_app();
        handle_event(&mut app, AppEvent::Paste("pasted text".to_string()));
        assert_eq!(app.input, "pasted text");
        assert_eq!(app.cursor, 11);
    }
}
