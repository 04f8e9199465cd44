use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{ActiveScreen, App};
use crate::epg::EpgSchedule;
use crate::focus::Panel;
use crate::screens::LiveScreen;
use crate::ui::colors::{BRIGHT_GRAY, BRIGHT_GREEN, DARK_GREEN, FAVORITE_YELLOW, MATRIX_GREEN};
use crate::ui::utils::{category_column_width, truncate};

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused { MATRIX_GREEN } else { DARK_GREEN };
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Thick } else { BorderType::Plain })
        .border_style(Style::default().fg(border))
}

fn highlight() -> Style {
    Style::default()
        .fg(ratatui::style::Color::Black)
        .bg(MATRIX_GREEN)
        .add_modifier(Modifier::BOLD)
}

pub fn render_live(f: &mut Frame, app: &mut App, area: Rect) {
    let ActiveScreen::Live(screen) = &app.screen else {
        return;
    };

    if !screen.is_menu_visible() {
        render_fullscreen_hint(f, screen, area);
        app.area_categories = Rect::default();
        app.area_channels = Rect::default();
        return;
    }

    let cat_width = category_column_width(screen.categories(), area.width);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(cat_width),
            Constraint::Percentage(40),
            Constraint::Min(20),
        ])
        .split(area);

    render_categories(f, screen, chunks[0]);
    let channel_offset = render_channels(f, screen, chunks[1]);
    render_epg(f, screen, chunks[2]);

    app.area_categories = chunks[0];
    app.area_channels = chunks[1];
    app.channel_offset = channel_offset;
}

fn render_fullscreen_hint(f: &mut Frame, screen: &LiveScreen, area: Rect) {
    let name = screen.playing().map(|c| c.name.as_str()).unwrap_or("");
    let now = screen.schedule(Utc::now());
    let mut lines = vec![Line::from(Span::styled(
        format!("\u{25B6} {}", name),
        Style::default().fg(MATRIX_GREEN).add_modifier(Modifier::BOLD),
    ))];
    if let Some(program) = now.current() {
        lines.push(Line::from(program.title.clone()));
    }
    lines.push(Line::from(Span::styled(
        "Enter / Esc shows the menu",
        Style::default().fg(DARK_GREEN),
    )));
    f.render_widget(Paragraph::new(lines), area);
}

fn render_categories(f: &mut Frame, screen: &LiveScreen, area: Rect) {
    let focus = screen.focus();
    let items: Vec<ListItem> = screen
        .categories()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let style = if i == screen.current_category() {
                Style::default().fg(BRIGHT_GREEN).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(BRIGHT_GRAY)
            };
            ListItem::new(Line::from(Span::styled(c.category_name.clone(), style)))
        })
        .collect();

    let focused = focus.panel() == Panel::Categories;
    let mut state = ListState::default();
    state.select(Some(if focused {
        focus.index()
    } else {
        screen.current_category()
    }));
    let list = List::new(items)
        .block(panel_block("CATEGORIES", focused))
        .highlight_style(if focused { highlight() } else { Style::default() });
    f.render_stateful_widget(list, area, &mut state);
}

/// Returns the scroll offset so pointer hits can be mapped back to rows
fn render_channels(f: &mut Frame, screen: &LiveScreen, area: Rect) -> usize {
    let focus = screen.focus();
    let playing = screen.playing().map(|c| c.stream_id.clone());
    let favorites = screen.favorite_ids();
    let max_name = area.width.saturating_sub(8) as usize;
    let items: Vec<ListItem> = screen
        .channels()
        .iter()
        .map(|c| {
            let mut spans = Vec::new();
            if playing.as_ref() == Some(&c.stream_id) {
                spans.push(Span::styled("\u{25B6} ", Style::default().fg(MATRIX_GREEN)));
            }
            spans.push(Span::raw(truncate(&c.name, max_name)));
            if favorites.contains(&c.stream_id) {
                spans.push(Span::styled(" \u{2605}", Style::default().fg(FAVORITE_YELLOW)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let focused = focus.panel() == Panel::Channels;
    let title = format!("CHANNELS ({})", screen.channels().len());
    if items.is_empty() {
        f.render_widget(
            Paragraph::new("No channels").block(panel_block(&title, focused)),
            area,
        );
        return 0;
    }

    let mut state = ListState::default();
    if focused {
        state.select(Some(focus.index()));
    }
    let list = List::new(items)
        .block(panel_block(&title, focused))
        .highlight_style(highlight());
    f.render_stateful_widget(list, area, &mut state);
    state.offset()
}

fn render_epg(f: &mut Frame, screen: &LiveScreen, area: Rect) {
    let focused = screen.focus().panel() == Panel::Epg;
    let block = panel_block("GUIDE", focused);

    if screen.playing().is_none() {
        f.render_widget(Paragraph::new("Select a channel").block(block), area);
        return;
    }
    if screen.epg_loading() {
        f.render_widget(Paragraph::new("Loading guide...").block(block), area);
        return;
    }

    let schedule = screen.schedule(Utc::now());
    let EpgSchedule::Listing { current, items } = &schedule else {
        f.render_widget(Paragraph::new("No programming").block(block), area);
        return;
    };

    let inner = block.inner(area);
    f.render_widget(block, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(inner);

    if let Some(program) = current {
        let percent = items
            .iter()
            .find(|e| e.is_current)
            .map(|e| e.progress_percent)
            .unwrap_or(0.0);
        let top = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
            .split(chunks[0]);
        f.render_widget(
            Paragraph::new(Span::styled(
                program.title.clone(),
                Style::default().fg(BRIGHT_GREEN).add_modifier(Modifier::BOLD),
            )),
            top[0],
        );
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(MATRIX_GREEN).bg(DARK_GREEN))
                .ratio((percent / 100.0).clamp(0.0, 1.0))
                .label(format!("{:.0}%", percent)),
            top[1],
        );
        f.render_widget(
            Paragraph::new(program.description.clone())
                .style(Style::default().fg(BRIGHT_GRAY))
                .wrap(Wrap { trim: true }),
            top[2],
        );
    }

    let rows: Vec<ListItem> = items
        .iter()
        .map(|entry| {
            let start = entry.program.start.with_timezone(&Local).format("%H:%M");
            let end = entry.program.end.with_timezone(&Local).format("%H:%M");
            let style = if entry.is_current {
                Style::default().fg(MATRIX_GREEN)
            } else {
                Style::default().fg(BRIGHT_GRAY)
            };
            ListItem::new(Line::from(Span::styled(
                format!("{}-{}  {}", start, end, entry.program.title),
                style,
            )))
        })
        .collect();
    let mut state = ListState::default();
    if focused {
        state.select(Some(screen.focus().index()));
    }
    f.render_stateful_widget(List::new(rows).highlight_style(highlight()), chunks[1], &mut state);
}
