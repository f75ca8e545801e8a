use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use rapidscale_chat::{ChatMessage, ChatRole};
use crate::app::{App, BackendStatus, InputMode};

const MAX_INPUT_LINES: usize = 5;
const TYPING_CURSOR: &str = "▌";

/// Parse a line of text and convert **bold** markdown and list markers to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    // "- item" / "* item" become bullets
    let trimmed = text.trim_start();
    let indent = text.len() - trimmed.len();
    let body = match trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
        Some(rest) => {
            spans.push(Span::raw(format!("{}• ", &text[..indent])));
            rest
        }
        None => text,
    };

    let mut chars = body.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    bold_text,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_lines = app.input.split('\n').count().clamp(1, MAX_INPUT_LINES) as u16;

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.inspector_open() {
        render_inspector(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status_text, status_color) = match app.backend_status {
        BackendStatus::Checking => ("○ checking", Color::Gray),
        BackendStatus::Online => ("● online", Color::Green),
        BackendStatus::Offline => ("● offline", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" RapidScale AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::styled(
            format!("  {}", app.chat.client().endpoint()),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn message_lines(app: &App, msg: &ChatMessage, lines: &mut Vec<Line<'static>>) {
    let session = app.chat.session();

    match msg.role() {
        ChatRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.split('\n') {
                lines.push(Line::from(line.to_string()));
            }
        }
        ChatRole::Assistant => {
            let highlighted = app.highlighted == Some(msg.id());
            let mut label_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
            if highlighted {
                label_style = label_style.add_modifier(Modifier::REVERSED);
            }

            let mut label = vec![Span::styled(
                if highlighted { "▶ AI:" } else { "AI:" },
                label_style,
            )];
            if msg.is_inspectable() {
                label.push(Span::styled(
                    " {…}",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(label));

            for line in msg.content.split('\n') {
                lines.push(parse_markdown_line(line));
            }

            if session.animating() == Some(msg.id()) {
                if let Some(last) = lines.last_mut() {
                    last.spans.push(Span::styled(
                        TYPING_CURSOR,
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::SLOW_BLINK),
                    ));
                }
            }
        }
    }
    lines.push(Line::default());
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.sync_scroll();

    let focused = app.input_mode == InputMode::Normal;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Ask anything. Get instant, intelligent responses. ");

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.chat.session().messages() {
        message_lines(app, msg, &mut lines);
    }

    if app.chat.session().is_pending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep indentation: JSON fallbacks rely on it.
    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Row and column (in chars) of the cursor inside a multi-line input.
fn cursor_row_col(input: &str, cursor: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in input.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let pending = app.chat.session().is_pending();

    let border_color = match (editing, pending) {
        (true, false) => Color::Yellow,
        (true, true) => Color::Gray,
        (false, _) => Color::DarkGray,
    };
    let title = if pending {
        " Waiting for the assistant... "
    } else {
        " Message (Enter to send, Alt+Enter for new line) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let (row, col) = cursor_row_col(&app.input, app.cursor);

    // Scroll offsets that keep the cursor visible
    let row_offset = (row + 1).saturating_sub(inner_height);
    let col_offset = if inner_width == 0 {
        0
    } else {
        (col + 1).saturating_sub(inner_width)
    };

    let text = if app.input.is_empty() {
        Text::from(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible: Vec<Line> = app
            .input
            .split('\n')
            .skip(row_offset)
            .take(inner_height)
            .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
            .collect();
        Text::from(visible)
    };

    // Use cyan text to match the "You:" style
    let input = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if editing && !app.inspector_open() {
        frame.set_cursor_position((
            area.x + 1 + col.saturating_sub(col_offset) as u16,
            area.y + 1 + row.saturating_sub(row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = if app.inspector_open() {
        " INSPECT "
    } else {
        match app.input_mode {
            InputMode::Normal => " CHAT ",
            InputMode::Editing => " TYPE ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let hints: Vec<Span> = if app.inspector_open() {
        [hint("j/k", "scroll"), hint("c", "copy JSON"), hint("Esc", "close")].concat()
    } else {
        match app.input_mode {
            InputMode::Editing => [
                hint("Enter", "send"),
                hint("Alt+Enter", "new line"),
                hint("Esc", "browse replies"),
            ]
            .concat(),
            InputMode::Normal => [
                hint("j/k", "select reply"),
                hint("Enter", "full response"),
                hint("PgUp/PgDn", "scroll"),
                hint("r", "recheck backend"),
                hint("i", "type"),
                hint("q", "quit"),
            ]
            .concat(),
        }
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    spans.extend(hints);
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!("  {}", notice),
            Style::default().bg(Color::Black).fg(Color::Green),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_inspector(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(json) = app.selected_json() else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = (area.width * 4 / 5).max(20).min(area.width);
    let popup_height = (area.height * 4 / 5).max(6).min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Full Response Data ")
        .title_bottom(Line::from(" JSON formatted response ").right_aligned());

    let inner_height = popup_area.height.saturating_sub(2);
    let max_scroll = (json.lines().count() as u16).saturating_sub(inner_height);
    app.inspector_scroll = app.inspector_scroll.min(max_scroll);

    let body = Paragraph::new(json)
        .style(Style::default().fg(Color::Gray))
        .block(block)
        .scroll((app.inspector_scroll, 0));

    frame.render_widget(body, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::offline_app;
    use ratatui::{backend::TestBackend, Terminal};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_markdown() {
        let line = parse_markdown_line("a **bold** move");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        assert_eq!(line_text(&parse_markdown_line("a **b")), "a **b");
    }

    #[test]
    fn test_list_items_become_bullets() {
        assert_eq!(line_text(&parse_markdown_line("  - item")), "  • item");
        assert_eq!(line_text(&parse_markdown_line("-not a list")), "-not a list");
    }

    #[test]
    fn test_cursor_row_col() {
        assert_eq!(cursor_row_col("", 0), (0, 0));
        assert_eq!(cursor_row_col("ab\ncd", 4), (1, 1));
        assert_eq!(cursor_row_col("ab\n", 3), (1, 0));
    }

    #[tokio::test]
    async fn test_render_shows_welcome_and_placeholder() {
        let mut app = offline_app();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Welcome"));
        assert!(screen.contains("Type your message..."));
        assert!(screen.contains("RapidScale AI"));
        assert_eq!(app.chat_height, 20 - 1 - 3 - 1 - 2);
    }

    #[tokio::test]
    async fn test_render_shows_thinking_while_pending() {
        let mut app = offline_app();
        app.insert_str("hello");
        app.submit_input();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Waiting for the assistant"));
    }
}
