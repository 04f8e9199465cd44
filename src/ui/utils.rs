use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color;

use crate::api::Category;

/// Category column width: longest name plus padding, capped at 35% of the screen
pub fn category_column_width(categories: &[Category], total_width: u16) -> u16 {
    let max_content = categories
        .iter()
        .map(|c| u32::try_from(c.category_name.chars().count()).unwrap_or(u32::MAX).saturating_add(5))
        .max()
        .unwrap_or(25);
    let dynamic_max = (u32::from(total_width) * 35 / 100).max(20);
    let width = max_content.max(20).min(dynamic_max);
    u16::try_from(width).unwrap_or(u16::MAX)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn rating_color(rating: Option<f32>) -> Color {
    match rating {
        Some(r) if r >= 8.0 => Color::Green,
        Some(r) if r >= 6.0 => Color::White,
        Some(r) if r >= 4.0 => Color::LightYellow,
        Some(_) => Color::Red,
        None => Color::Gray,
    }
}

/// Cut to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
