//! UI rendering for TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::App;
use super::events::InputMode;

/// Main draw function
pub fn draw(f: &mut Frame, app: &mut App) {
    let prompt_height = match app.input_mode {
        InputMode::Normal => 0,
        InputMode::Command => 3,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Title bar
            Constraint::Length(prompt_height), // Prompt
            Constraint::Min(5),                // Active view
            Constraint::Length(1),             // Status bar
        ])
        .split(f.area());

    draw_title_bar(f, app, chunks[0]);
    if app.input_mode == InputMode::Command {
        draw_prompt(f, app, chunks[1]);
    }
    app.router().stack().with_top(|component| component.draw(f, chunks[2]));
    draw_status_bar(f, app, chunks[3]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let mode = match app.input_mode {
        InputMode::Normal => Span::styled(" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Command => Span::styled(" COMMAND ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    let crumbs = app.router().stack().breadcrumbs().join(" › ");
    let title = Line::from(vec![
        mode,
        Span::raw(" "),
        Span::styled("cloudlens", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(app.router().session().label(), Style::default().fg(Color::Magenta)),
        Span::raw(" | "),
        Span::styled(crumbs, Style::default().fg(Color::Yellow)),
    ]);

    let title_bar = Paragraph::new(title).style(Style::default().bg(Color::Rgb(30, 30, 30)));
    f.render_widget(title_bar, area);
}

fn draw_prompt(f: &mut Frame, app: &App, area: Rect) {
    let prompt = ":";
    let prompt_widget = Paragraph::new(format!("{}{}", prompt, app.input))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green))
                .title(" Command "),
        );
    f.render_widget(prompt_widget, area);

    f.set_cursor_position((
        area.x + 1 + prompt.len() as u16 + app.cursor_position as u16,
        area.y + 1,
    ));
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (status_str, status_style) = match &app.status_message {
        Some((msg, _)) => (format!(" {} ", msg), Style::default().fg(Color::Yellow)),
        None => {
            let hints = app
                .router()
                .stack()
                .top_hints()
                .iter()
                .map(|hint| format!("<{}> {}", hint.mnemonic, hint.description))
                .collect::<Vec<_>>()
                .join("  ");
            (format!(" {}  <:> command ", hints), Style::default().fg(Color::DarkGray))
        }
    };

    let history_info = if app.history.is_empty() {
        String::new()
    } else {
        format!(" History: {} ", app.history.len())
    };

    let status_len = status_str.chars().count();
    let right_len = history_info.chars().count();
    let padding_len = (area.width as usize).saturating_sub(status_len + right_len);

    let status_bar = Paragraph::new(Line::from(vec![
        Span::styled(status_str, status_style),
        Span::styled(" ".repeat(padding_len), Style::default()),
        Span::styled(history_info, Style::default().fg(Color::Cyan)),
    ]))
    .style(Style::default().bg(Color::Rgb(30, 30, 30)));

    f.render_widget(status_bar, area);
}
