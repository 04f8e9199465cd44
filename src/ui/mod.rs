pub mod colors;
pub mod live;
pub mod utils;
pub mod vod;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{ActiveScreen, App};
use crate::gate::{AccessGate, PIN_LENGTH};
use crate::ui::colors::{BRIGHT_GREEN, DARK_GREEN, MATRIX_GREEN};
use crate::ui::utils::centered_rect;

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_footer(f, app, chunks[2]);

    let is_live = matches!(app.screen, ActiveScreen::Live(_));
    if is_live {
        live::render_live(f, app, chunks[1]);
    } else {
        vod::render_vod(f, app, chunks[1]);
    }

    let gate_open = open_gate(app).map(|g| {
        (
            g.pending_category().map(|c| c.category_name.clone()),
            g.entered_len(),
        )
    });

    if let Some((category, entered)) = gate_open {
        render_pin_popup(f, area, category.as_deref().unwrap_or(""), entered);
    }

    if let Some(notification) = &app.notification {
        render_toast(f, area, &notification.message);
    }
}

fn open_gate(app: &App) -> Option<&AccessGate> {
    let gate = match &app.screen {
        ActiveScreen::Live(screen) => screen.gate(),
        ActiveScreen::Vod(screen) => screen.gate(),
    };
    gate.is_open().then_some(gate)
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match &app.screen {
        ActiveScreen::Live(_) => " LIVE TV ",
        ActiveScreen::Vod(_) => " MOVIES ",
    };
    let clock = chrono::Local::now().format("%H:%M").to_string();
    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default().fg(MATRIX_GREEN).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", clock), Style::default().fg(DARK_GREEN)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default()
        .fg(ratatui::style::Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(ratatui::style::Color::White);

    let mut spans = vec![
        Span::styled(" \u{2190}\u{2191}\u{2192}\u{2193} ", key_style),
        Span::styled("Move  ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled("Select  ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled("Back  ", label_style),
    ];
    match &app.screen {
        ActiveScreen::Live(_) => {
            spans.push(Span::styled(" 0/F2 ", key_style));
            spans.push(Span::styled("Favorite", label_style));
        }
        ActiveScreen::Vod(screen) if screen.is_typing() => {
            spans.push(Span::styled(" Enter/Esc ", key_style));
            spans.push(Span::styled("Stop Typing", label_style));
        }
        ActiveScreen::Vod(_) => {
            spans.push(Span::styled(" F2 ", key_style));
            spans.push(Span::styled("Favorite  ", label_style));
            spans.push(Span::styled(" hold ", key_style));
            spans.push(Span::styled("Favorite", label_style));
        }
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

fn render_pin_popup(f: &mut Frame, area: Rect, category: &str, entered: usize) {
    let area = centered_rect(40, 30, area);
    f.render_widget(Clear, area);

    let masked: String = (0..PIN_LENGTH)
        .map(|i| if i < entered { "* " } else { "_ " })
        .collect();
    let lines = vec![
        Line::from(Span::styled(
            format!("'{}' is restricted", category),
            Style::default().fg(BRIGHT_GREEN),
        )),
        Line::from(""),
        Line::from(Span::styled(
            masked.trim_end().to_string(),
            Style::default().fg(MATRIX_GREEN).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Enter PIN  \u{2022}  Esc to cancel"),
    ];
    let block = Block::default()
        .title(" // PIN ")
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(DARK_GREEN));
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

fn render_toast(f: &mut Frame, area: Rect, message: &str) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    if area.height < 4 || width == 0 {
        return;
    }
    let toast = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(4),
        width,
        3,
    );
    f.render_widget(Clear, toast);
    f.render_widget(
        Paragraph::new(message.to_string())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MATRIX_GREEN)),
            ),
        toast,
    );
}
