use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use inspire_core::{
    Annotation, AnnotationKind, ChatMessage, ChatRole, Entry, RichText, Segment,
};

use crate::app::{App, InputMode, StatusKind};

const EMPTY_STATE: &str = "No messages yet. Type below to start the conversation.";

/// Map one inline segment to a styled span.
fn segment_span(segment: &Segment) -> Span<'static> {
    match segment {
        Segment::Text(text) => Span::raw(text.clone()),
        Segment::Bold(text) => Span::styled(text.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Segment::Italic(text) => {
            Span::styled(text.clone(), Style::default().add_modifier(Modifier::ITALIC))
        }
        Segment::Code(text) => Span::styled(
            text.clone(),
            Style::default().fg(Color::LightGreen).bg(Color::Black),
        ),
        Segment::LineBreak => Span::raw(""),
    }
}

/// Lay a message body out one terminal line per source line.
fn rich_lines(rich: &RichText, base: Style) -> Vec<Line<'static>> {
    rich.lines()
        .into_iter()
        .map(|segments| {
            let spans: Vec<Span<'static>> = segments
                .into_iter()
                .map(|s| {
                    let span = segment_span(s);
                    Span::styled(span.content, base.patch(span.style))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ChatRole::SystemError => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn annotation_lines(annotation: &Annotation) -> Vec<Line<'static>> {
    let kind = match annotation.kind {
        AnnotationKind::BoundingBoxes => "boxes",
        AnnotationKind::Segmentation => "segmentation",
    };
    let mut lines = vec![Line::from(Span::styled(
        format!("  [{} on {}]", kind, annotation.image),
        Style::default().fg(Color::DarkGray),
    ))];

    for overlay in &annotation.overlays {
        let (r, g, b) = overlay.rgb();
        let mut spans = vec![
            Span::styled("  ■ ", Style::default().fg(Color::Rgb(r, g, b))),
            Span::styled(overlay.label.clone(), Style::default().fg(Color::Rgb(r, g, b)).bold()),
            Span::styled(
                format!(
                    "  top {:.1}% left {:.1}%  {:.1}% x {:.1}%",
                    overlay.top, overlay.left, overlay.width, overlay.height
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if overlay.mask.is_some() {
            spans.push(Span::styled(" +mask", Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn message_lines(message: &ChatMessage, lines: &mut Vec<Line<'static>>) {
    let byline_style = role_style(message.role);
    let mut byline = Vec::new();
    if message.role == ChatRole::SystemError {
        byline.push(Span::styled("! ", byline_style));
    }
    byline.push(Span::styled(message.role.label(), byline_style));
    byline.push(Span::styled(
        format!(" • {}", message.display_time()),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::from(byline));

    let body_style = match message.role {
        ChatRole::SystemError => Style::default().fg(Color::Red),
        ChatRole::User | ChatRole::Assistant => Style::default(),
    };
    lines.extend(rich_lines(&message.rich, body_style));

    if let Some(annotation) = &message.annotation {
        lines.extend(annotation_lines(annotation));
    }
    lines.push(Line::default());
}

fn typing_lines(frame: u8, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(Span::styled(
        ChatRole::Assistant.label(),
        role_style(ChatRole::Assistant),
    )));
    // Animated dots: cycles through "●○○", "●●○", "●●●"
    let filled = (frame as usize % 3) + 1;
    let dots = format!("{}{}", "●".repeat(filled), "○".repeat(3 - filled));
    lines.push(Line::from(Span::styled(
        dots,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));
    lines.push(Line::default());
}

pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in app.controller.transcript().entries() {
        match entry {
            Entry::Message(message) => message_lines(message, &mut lines),
            Entry::Pending(_) => typing_lines(app.animation_frame, &mut lines),
        }
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w = line.width();
            if w == 0 { 1 } else { w.div_ceil(width) }
        })
        .sum();
    rows.min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let composer_height = app.controller.composer().rows() + 2;

    // Main layout: header, transcript, composer, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(composer_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_composer(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let conversation = match app.controller.conversation() {
        Some(id) => format!(" conversation {}", id),
        None => " new conversation".to_string(),
    };
    let uploads = app.controller.uploads().len();
    let uploads = if uploads > 0 {
        format!(" [{} file{}]", uploads, if uploads == 1 { "" } else { "s" })
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" Inspire Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(conversation, Style::default().fg(Color::White)),
        Span::styled(uploads, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let title = match app.controller.image_preview() {
        Some(image) => format!(" {} | image: {} ", app.controller.location(), image),
        None => format!(" {} ", app.controller.location()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let lines = transcript_lines(app);
    let text = if lines.is_empty() && app.controller.transcript().shows_empty_state() {
        app.sync_scroll(0, inner_height);
        Text::from(Span::styled(EMPTY_STATE, Style::default().fg(Color::DarkGray)))
    } else {
        app.sync_scroll(wrapped_height(&lines, inner_width), inner_height);
        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_composer(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.controller.is_busy() {
        " Message (waiting for reply) "
    } else if app.controller.settings().enable_keyboard_shortcuts {
        " Message (Enter send, Alt+Enter newline) "
    } else {
        " Message (Ctrl+S send, Enter newline) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let composer = app.controller.composer();
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let (row, col) = composer.cursor_position();

    // Keep the cursor visible in both directions
    let row_offset = (row + 1).saturating_sub(inner_height.max(1));
    let col_offset = if inner_width == 0 || col < inner_width {
        0
    } else {
        col - inner_width + 1
    };

    let visible: Vec<Line> = composer
        .text()
        .split('\n')
        .skip(row_offset)
        .take(inner_height)
        .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
        .collect();

    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((
            area.x + 1 + (col - col_offset) as u16,
            area.y + 1 + (row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" TYPING ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];

    match &app.status {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => Style::default().bg(Color::Black).fg(Color::Green),
                StatusKind::Error => Style::default().bg(Color::Black).fg(Color::Red),
            };
            spans.push(Span::styled(status.text.clone(), style));
        }
        None => {
            let hints: &[(&str, &str)] = match app.input_mode {
                InputMode::Normal => &[
                    ("i", "type"),
                    ("j/k", "scroll"),
                    ("G", "latest"),
                    ("q", "quit"),
                ],
                InputMode::Editing => &[
                    ("Esc", "stop typing"),
                    ("PgUp/PgDn", "scroll"),
                    ("/upload /transcribe /image", "commands"),
                ],
            };
            for (key, label) in hints {
                spans.push(Span::styled(format!(" {} ", key), key_style));
                spans.push(Span::styled(format!(" {} ", label), label_style));
            }
        }
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_map_to_styles() {
        let rich = RichText::parse("a **b** *c* `d`");
        let lines = rich_lines(&rich, Style::default());
        assert_eq!(lines.len(), 1);

        let spans = &lines[0].spans;
        let bold = spans.iter().find(|s| s.content == "b").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let italic = spans.iter().find(|s| s.content == "c").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
        let code = spans.iter().find(|s| s.content == "d").unwrap();
        assert_eq!(code.style.fg, Some(Color::LightGreen));
    }

    #[test]
    fn test_line_breaks_become_lines() {
        let rich = RichText::parse("one\ntwo\n\nfour");
        let lines = rich_lines(&rich, Style::default());
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("x".repeat(25)), Line::default(), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 10), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 25 + 1 + 3);
    }
}
