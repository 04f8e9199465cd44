use ratatui::style::Color;

pub const MATRIX_GREEN: Color = Color::Rgb(0, 255, 65);
pub const DARK_GREEN: Color = Color::Rgb(0, 100, 0);
pub const BRIGHT_GREEN: Color = Color::Rgb(150, 255, 150);
pub const FAVORITE_YELLOW: Color = Color::Rgb(255, 255, 0);
pub const BRIGHT_GRAY: Color = Color::Rgb(220, 220, 220);
