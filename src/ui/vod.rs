use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{ActiveScreen, App, GRID_CELL_HEIGHT};
use crate::focus::Panel;
use crate::overlay::{InfoFocus, OverlayController, OverlayState, PauseFocus};
use crate::screens::VodScreen;
use crate::ui::colors::{BRIGHT_GRAY, BRIGHT_GREEN, DARK_GREEN, FAVORITE_YELLOW, MATRIX_GREEN};
use crate::ui::utils::{category_column_width, centered_rect, rating_color, truncate};

fn panel_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Thick } else { BorderType::Plain })
        .border_style(Style::default().fg(if focused { MATRIX_GREEN } else { DARK_GREEN }))
}

pub fn render_vod(f: &mut Frame, app: &mut App, area: Rect) {
    let ActiveScreen::Vod(screen) = &app.screen else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let cat_width = category_column_width(screen.categories(), area.width);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(cat_width), Constraint::Min(10)])
        .split(rows[1]);

    render_search(f, screen, rows[0]);
    render_categories(f, screen, columns[0]);
    let grid_inner = panel_block(String::new(), false).inner(columns[1]);
    let row_offset = render_grid(f, screen, columns[1]);

    if screen.overlay().is_open() {
        render_overlay(f, screen.overlay(), screen, area);
    }

    app.area_categories = columns[0];
    app.area_grid = grid_inner;
    app.grid_row_offset = row_offset;
}

fn render_search(f: &mut Frame, screen: &VodScreen, area: Rect) {
    let focused = screen.focus().panel() == Panel::Search;
    let title = if screen.is_typing() {
        " SEARCH (typing) "
    } else {
        " SEARCH "
    };
    let text = if screen.search_term().is_empty() && !screen.is_typing() {
        Span::styled("Press Enter to search titles", Style::default().fg(DARK_GREEN))
    } else {
        Span::styled(screen.search_term().to_string(), Style::default().fg(BRIGHT_GREEN))
    };
    let block = panel_block(title.to_string(), focused);
    let inner = block.inner(area);
    f.render_widget(Paragraph::new(text).block(block), area);

    if screen.is_typing() {
        let x = inner.x + (screen.search_cursor() as u16).min(inner.width.saturating_sub(1));
        f.set_cursor_position((x, inner.y));
    }
}

fn render_categories(f: &mut Frame, screen: &VodScreen, area: Rect) {
    let focus = screen.focus();
    let focused = focus.panel() == Panel::Categories;
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
    let mut state = ListState::default();
    state.select(Some(if focused {
        focus.index()
    } else {
        screen.current_category()
    }));
    let highlight = if focused {
        Style::default()
            .fg(ratatui::style::Color::Black)
            .bg(MATRIX_GREEN)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    f.render_stateful_widget(
        List::new(items)
            .block(panel_block(" CATEGORIES ".to_string(), focused))
            .highlight_style(highlight),
        area,
        &mut state,
    );
}

/// Poster cards in `columns` per row; scrolls so the focused row stays visible.
/// Returns the first visible row.
fn render_grid(f: &mut Frame, screen: &VodScreen, area: Rect) -> usize {
    let focus = screen.focus();
    let focused = focus.panel() == Panel::Grid;
    let movies = screen.movies();
    let block = panel_block(format!(" MOVIES ({}) ", movies.len()), focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if movies.is_empty() {
        f.render_widget(Paragraph::new("Nothing here"), inner);
        return 0;
    }

    let columns = screen.columns().max(1);
    let visible_rows = (inner.height / GRID_CELL_HEIGHT).max(1) as usize;
    let focused_row = if focused { focus.index() / columns } else { 0 };
    let first_row = focused_row.saturating_sub(visible_rows - 1);
    let cell_width = (inner.width / columns as u16).max(1);
    let favorites = screen.favorite_ids();

    for (i, movie) in movies
        .iter()
        .enumerate()
        .skip(first_row * columns)
        .take(visible_rows * columns)
    {
        let row = (i / columns - first_row) as u16;
        let col = (i % columns) as u16;
        let cell = Rect::new(
            inner.x + col * cell_width,
            inner.y + row * GRID_CELL_HEIGHT,
            cell_width,
            GRID_CELL_HEIGHT,
        )
        .intersection(inner);

        let selected = focused && focus.index() == i;
        let border = if selected { MATRIX_GREEN } else { DARK_GREEN };
        let mut title = vec![Span::raw(truncate(
            &movie.name,
            cell_width.saturating_sub(4) as usize,
        ))];
        if favorites.contains(&movie.stream_id) {
            title.push(Span::styled("\u{2605}", Style::default().fg(FAVORITE_YELLOW)));
        }
        let rating = movie
            .rating
            .map(|r| format!("\u{2606} {:.1}", r))
            .unwrap_or_default();
        let card = Paragraph::new(vec![
            Line::from(title),
            Line::from(Span::styled(rating, Style::default().fg(rating_color(movie.rating)))),
        ])
        .block(
            Block::default()
                .borders(Borders::LEFT)
                .border_type(if selected { BorderType::Thick } else { BorderType::Plain })
                .border_style(Style::default().fg(border)),
        )
        .style(if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        });
        f.render_widget(card, cell);
    }
    first_row
}

fn render_overlay(f: &mut Frame, overlay: &OverlayController, screen: &VodScreen, area: Rect) {
    let popup = centered_rect(70, 70, area);
    f.render_widget(Clear, popup);

    let Some(movie) = overlay.movie() else {
        return;
    };
    let info = overlay.info();
    let details = info.and_then(|i| i.info.as_ref());

    let mut lines = vec![Line::from(Span::styled(
        details
            .and_then(|d| d.name.clone())
            .unwrap_or_else(|| movie.name.clone()),
        Style::default().fg(BRIGHT_GREEN).add_modifier(Modifier::BOLD),
    ))];

    let mut meta = Vec::new();
    if let Some(year) = info.and_then(|i| i.year()) {
        meta.push(year.to_string());
    }
    if let Some(genre) = details.and_then(|d| d.genre.clone()) {
        meta.push(genre);
    }
    if let Some(duration) = details.and_then(|d| d.duration.clone()) {
        meta.push(duration);
    }
    let rating = details.and_then(|d| d.rating).or(movie.rating);
    if let Some(r) = rating {
        meta.push(format!("\u{2606} {:.1}", r));
    }
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            meta.join("  \u{2022}  "),
            Style::default().fg(rating_color(rating)),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        info.and_then(|i| i.synopsis())
            .unwrap_or("No description available")
            .to_string(),
    ));

    let body_style = Style::default().fg(BRIGHT_GRAY);
    let block = Block::default()
        .title(" // MOVIE ")
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(MATRIX_GREEN));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    f.render_widget(
        Paragraph::new(lines).style(body_style).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let button = |label: String, active: bool| {
        if active {
            Span::styled(
                format!("[ {} ]", label),
                Style::default()
                    .fg(ratatui::style::Color::Black)
                    .bg(MATRIX_GREEN)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!("  {}  ", label), Style::default().fg(BRIGHT_GREEN))
        }
    };

    let buttons = match overlay.state() {
        OverlayState::Info { focus, .. } => {
            let fav_label = if screen.is_favorite(&movie.stream_id) {
                "\u{2605} Unfavorite"
            } else {
                "\u{2606} Favorite"
            };
            vec![
                button("Back".to_string(), *focus == InfoFocus::Back),
                button("\u{25B6} Watch".to_string(), *focus == InfoFocus::Watch),
                button(fav_label.to_string(), *focus == InfoFocus::Fav),
            ]
        }
        OverlayState::Playing {
            pause_menu: Some(pause),
            ..
        } => vec![
            Span::styled("Paused  ", Style::default().fg(FAVORITE_YELLOW)),
            button("Continue".to_string(), *pause == PauseFocus::Continue),
            button("Close".to_string(), *pause == PauseFocus::Close),
        ],
        OverlayState::Playing { .. } => vec![Span::styled(
            "\u{25B6} Playing  \u{2022}  Enter pauses  \u{2022}  Esc stops",
            Style::default().fg(MATRIX_GREEN),
        )],
        OverlayState::Closed => Vec::new(),
    };
    f.render_widget(Paragraph::new(Line::from(buttons)), chunks[1]);
}
