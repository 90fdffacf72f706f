//! Frame layout: a double-bordered root titled with the session, the command
//! input and buttons on the left, the result log on the right.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, ButtonAreas, Focus};

pub const INPUT_LABEL: &str = "Command: ";
pub const INPUT_PLACEHOLDER: &str = "Enter command";
/// Widest the input box grows, in cells.
pub const INPUT_MAX_WIDTH: u16 = 100;

const LABEL_COLOR: Color = Color::Indexed(33);
const EXECUTE_COLOR: Color = Color::Indexed(120);
const QUIT_COLOR: Color = Color::Indexed(212);

const EXECUTE_LABEL: &str = "Execute";
const QUIT_LABEL: &str = "Quit";
const HELP_TEXT: &str = "Enter run | Tab focus | PgUp/PgDn scroll | Esc quit";

pub fn render(frame: &mut Frame<'_>, app: &mut App, in_flight: usize) {
    let root = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .title(format!(" {} ", app.title()));
    let inner = root.inner(frame.area());
    frame.render_widget(root, frame.area());

    let [controls, results] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(inner);
    let [input_area, button_row, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(controls);

    render_input(frame, app, input_area);
    render_buttons(frame, app, button_row);
    render_status(frame, app, status_area, in_flight);
    render_results(frame, app, results);
}

fn render_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let area = Rect {
        width: area.width.min(INPUT_MAX_WIDTH + 2),
        ..area
    };
    let focused = app.focus() == Focus::Input;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label_width = INPUT_LABEL.width() as u16;
    let field_width = usize::from(inner.width.saturating_sub(label_width + 1));
    let (text, cursor) = app.input().snapshot();

    let mut spans = vec![Span::styled(INPUT_LABEL, Style::default().fg(LABEL_COLOR))];
    let cursor_column = if text.is_empty() {
        spans.push(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ));
        0
    } else {
        let (visible, column) = input_window(&text, cursor, field_width);
        spans.push(Span::raw(visible));
        column
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);

    if focused && inner.width > label_width {
        let column = (label_width as usize + cursor_column).min(usize::from(inner.width) - 1);
        frame.set_cursor_position((inner.x + column as u16, inner.y));
    }
}

/// Slice of `text` that fits `width` cells with the cursor kept in view,
/// plus the cursor's cell offset inside that slice.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());

    let mut start = 0;
    let mut before: usize = chars[..cursor].iter().map(|ch| ch.width().unwrap_or(0)).sum();
    while before > width && start < cursor {
        before -= chars[start].width().unwrap_or(0);
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for ch in &chars[start..] {
        let cell = ch.width().unwrap_or(0);
        if used + cell > width {
            break;
        }
        visible.push(*ch);
        used += cell;
    }
    (visible, before)
}

fn render_buttons(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let [execute, _, quit, _] = Layout::horizontal([
        Constraint::Length(EXECUTE_LABEL.len() as u16 + 4),
        Constraint::Length(2),
        Constraint::Length(QUIT_LABEL.len() as u16 + 4),
        Constraint::Min(0),
    ])
    .areas(area);

    frame.render_widget(
        button(EXECUTE_LABEL, EXECUTE_COLOR, app.focus() == Focus::Execute),
        execute,
    );
    frame.render_widget(
        button(QUIT_LABEL, QUIT_COLOR, app.focus() == Focus::Quit),
        quit,
    );
    app.set_buttons(ButtonAreas { execute, quit });
}

fn button(label: &str, fill: Color, focused: bool) -> Paragraph<'_> {
    let mut style = Style::default().bg(fill).fg(Color::Black);
    if focused {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    Paragraph::new(label)
        .centered()
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style))
}

fn render_status(frame: &mut Frame<'_>, app: &App, area: Rect, in_flight: usize) {
    let mut lines = vec![Line::from(format!("running: {in_flight}"))];
    if !app.scrollback().is_following() {
        lines.push(Line::from(format!(
            "scrolled back {} lines",
            app.scrollback().offset()
        )));
    }
    lines.push(Line::styled(HELP_TEXT, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_results(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Results ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = usize::from(inner.height);
    app.set_page_rows(rows);
    let lines: Vec<Line<'_>> = app
        .scrollback()
        .visible(rows)
        .into_iter()
        .map(|line| Line::from(display_line(&line)))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

// Control characters would move the real terminal cursor; tabs get spaces.
fn display_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\t' => out.push_str("    "),
            ch if ch.is_control() => {}
            ch => out.push(ch),
        }
    }
    out
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(LABEL_COLOR)
    } else {
        Style::default()
    }
}
