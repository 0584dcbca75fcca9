//! Ratings panel rendering
//!
//! Renders a centered panel with the load status, both ratings, the last
//! diagnostic error and when the ratings were last updated.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::Provider;

/// Renders the ratings panel for the current app state
pub fn render(frame: &mut Frame, app: &App) {
    let area = centered_rect(56, 13, frame.area());
    let state = &app.state;

    let (status_text, status_color) = if state.loading {
        ("Loading...", Color::Yellow)
    } else {
        ("Loaded", Color::Green)
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("  {:<26}", "Status:"), Style::default().fg(Color::Gray)),
            Span::styled(status_text, Style::default().fg(status_color)),
        ]),
        Line::from(""),
    ];

    for provider in Provider::ALL {
        let value = if state.loading {
            "...".to_string()
        } else {
            state.ratings.get(provider).to_string()
        };
        let label = format!("{} ({})", provider, app.config.handle(provider));
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<26}", label)),
            Span::styled(
                value,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    lines.push(Line::from(""));

    if let Some(error) = &state.error {
        lines.push(Line::from(Span::styled(
            format!("  Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    if let Some(updated) = state.last_updated {
        lines.push(Line::from(Span::styled(
            format!("  Last updated: {}", updated.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(key_hints(state.loading));

    let block = Block::default()
        .title(" Ratings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn key_hints(loading: bool) -> Line<'static> {
    if loading {
        return Line::from(Span::styled(
            "  Refreshing...",
            Style::default().fg(Color::Yellow),
        ));
    }

    Line::from(vec![
        Span::styled("  r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh   "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ])
}

/// Helper function to create a centered rect
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
