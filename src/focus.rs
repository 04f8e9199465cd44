//! Focus navigation across the panels of a screen.
//!
//! The model owns only `{panel, index}` and the screen's fixed panel order.
//! Lists stay with the screen, which passes their length in, so every move is
//! a pure function of the current state and the list shape.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Search,
    Categories,
    Channels,
    Grid,
    Epg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusState {
    pub panel: Panel,
    pub index: usize,
}

/// Result of a grid move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMove {
    Moved,
    /// The move leaves the grid; the caller should cross panels instead
    Boundary(Direction),
}

#[derive(Debug, Clone)]
pub struct FocusModel {
    panels: Vec<Panel>,
    state: FocusState,
}

impl FocusModel {
    /// `initial` must be one of `panels`; otherwise the first panel is used
    pub fn new(panels: Vec<Panel>, initial: Panel) -> Self {
        let panel = if panels.contains(&initial) {
            initial
        } else {
            panels.first().copied().unwrap_or(initial)
        };
        Self {
            panels,
            state: FocusState { panel, index: 0 },
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn panel(&self) -> Panel {
        self.state.panel
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn is_focused(&self, panel: Panel, index: usize) -> bool {
        self.state.panel == panel && self.state.index == index
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// `index = clamp(index + delta, 0, len - 1)`
    pub fn move_linear(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.state.index = 0;
            return;
        }
        let max = (len - 1) as isize;
        let next = (self.state.index as isize).saturating_add(delta).clamp(0, max);
        self.state.index = next as usize;
    }

    pub fn move_grid(&mut self, direction: Direction, columns: usize, len: usize) -> GridMove {
        let columns = columns.max(1);
        if len == 0 {
            self.state.index = 0;
            return match direction {
                Direction::Left | Direction::Up => GridMove::Boundary(direction),
                _ => GridMove::Moved,
            };
        }
        let last = len - 1;
        let i = self.state.index.min(last);
        match direction {
            Direction::Right => {
                self.state.index = (i + 1).min(last);
                GridMove::Moved
            }
            Direction::Left => {
                if i % columns == 0 {
                    return GridMove::Boundary(Direction::Left);
                }
                self.state.index = i - 1;
                GridMove::Moved
            }
            Direction::Down => {
                self.state.index = (i + columns).min(last);
                GridMove::Moved
            }
            Direction::Up => {
                if i < columns {
                    return GridMove::Boundary(Direction::Up);
                }
                self.state.index = i - columns;
                GridMove::Moved
            }
        }
    }

    /// Step through the panel order; Right/Down advance, Left/Up retreat,
    /// clamped at either end. `mirror` returns the position of a selection the
    /// entered panel already reflects (e.g. the active category); focus snaps
    /// there, otherwise to 0. Returns whether the panel changed.
    pub fn cross_panel<F>(&mut self, direction: Direction, mirror: F) -> bool
    where
        F: Fn(Panel) -> Option<usize>,
    {
        let Some(pos) = self.panels.iter().position(|p| *p == self.state.panel) else {
            return false;
        };
        let target = match direction {
            Direction::Right | Direction::Down => (pos + 1).min(self.panels.len() - 1),
            Direction::Left | Direction::Up => pos.saturating_sub(1),
        };
        if target == pos {
            return false;
        }
        let panel = self.panels[target];
        self.state = FocusState {
            panel,
            index: mirror(panel).unwrap_or(0),
        };
        tracing::debug!(?panel, index = self.state.index, "focus crossed panel");
        true
    }

    /// Jump straight to a panel, e.g. search box to results
    pub fn focus(&mut self, panel: Panel, index: usize) {
        if self.panels.contains(&panel) {
            self.state = FocusState { panel, index };
        }
    }

    /// Restore the index invariant after the focused list changed length
    pub fn clamp_to(&mut self, len: usize) {
        if len == 0 {
            self.state.index = 0;
        } else if self.state.index >= len {
            self.state.index = len - 1;
        }
    }

    /// The focused item, if the list has one there. No side effects.
    pub fn activate<'a, T>(&self, list: &'a [T]) -> Option<&'a T> {
        list.get(self.state.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_at(index: usize) -> FocusModel {
        let mut m = FocusModel::new(vec![Panel::Categories, Panel::Grid], Panel::Grid);
        m.focus(Panel::Grid, index);
        m
    }

    #[test]
    fn linear_clamps_without_wrap() {
        let mut m = FocusModel::new(vec![Panel::Categories], Panel::Categories);
        m.move_linear(-1, 3);
        assert_eq!(m.index(), 0);
        m.move_linear(5, 3);
        assert_eq!(m.index(), 2);
        m.move_linear(1, 3);
        assert_eq!(m.index(), 2);
        m.move_linear(1, 0);
        assert_eq!(m.index(), 0);
    }

    #[test]
    fn grid_down_clamps_to_last() {
        // 10 items, 4 columns, from index 3
        let mut m = grid_at(3);
        assert_eq!(m.move_grid(Direction::Down, 4, 10), GridMove::Moved);
        assert_eq!(m.index(), 7);
        assert_eq!(m.move_grid(Direction::Down, 4, 10), GridMove::Moved);
        assert_eq!(m.index(), 9);
    }

    #[test]
    fn grid_right_converges_to_last() {
        let mut m = grid_at(0);
        for _ in 0..20 {
            m.move_grid(Direction::Right, 4, 10);
        }
        assert_eq!(m.index(), 9);
    }

    #[test]
    fn grid_left_converges_to_row_start_then_signals() {
        let mut m = grid_at(6);
        assert_eq!(m.move_grid(Direction::Left, 4, 10), GridMove::Moved);
        assert_eq!(m.move_grid(Direction::Left, 4, 10), GridMove::Moved);
        assert_eq!(m.index(), 4);
        assert_eq!(
            m.move_grid(Direction::Left, 4, 10),
            GridMove::Boundary(Direction::Left)
        );
        assert_eq!(m.index(), 4);
    }

    #[test]
    fn grid_up_from_first_row_signals_boundary() {
        let mut m = grid_at(2);
        assert_eq!(
            m.move_grid(Direction::Up, 4, 10),
            GridMove::Boundary(Direction::Up)
        );
        assert_eq!(m.index(), 2);
        let mut m = grid_at(9);
        assert_eq!(m.move_grid(Direction::Up, 4, 10), GridMove::Moved);
        assert_eq!(m.index(), 5);
    }

    #[test]
    fn grid_index_never_exceeds_bounds() {
        for len in 1..=13 {
            for cols in 1..=5 {
                for start in 0..len {
                    for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
                        let mut m = grid_at(start);
                        m.move_grid(dir, cols, len);
                        assert!(m.index() < len);
                    }
                }
            }
        }
    }

    #[test]
    fn cross_panel_snaps_to_mirrored_selection() {
        let mut m = FocusModel::new(
            vec![Panel::Search, Panel::Categories, Panel::Grid],
            Panel::Grid,
        );
        m.focus(Panel::Grid, 5);
        assert!(m.cross_panel(Direction::Left, |p| (p == Panel::Categories).then_some(3)));
        assert_eq!(m.state(), FocusState { panel: Panel::Categories, index: 3 });

        assert!(m.cross_panel(Direction::Up, |_| None));
        assert_eq!(m.state(), FocusState { panel: Panel::Search, index: 0 });

        // Clamped at the first panel
        assert!(!m.cross_panel(Direction::Left, |_| None));
        assert_eq!(m.panel(), Panel::Search);
    }

    #[test]
    fn cross_panel_clamps_at_last_panel() {
        let mut m = FocusModel::new(vec![Panel::Categories, Panel::Channels], Panel::Channels);
        assert!(!m.cross_panel(Direction::Right, |_| None));
        assert_eq!(m.panel(), Panel::Channels);
    }

    #[test]
    fn activate_on_empty_list_is_none() {
        let m = FocusModel::new(vec![Panel::Channels], Panel::Channels);
        let empty: Vec<u32> = Vec::new();
        assert_eq!(m.activate(&empty), None);
        assert_eq!(m.index(), 0);
        assert_eq!(m.activate(&[4, 5]), Some(&4));
    }

    #[test]
    fn clamp_to_restores_invariant() {
        let mut m = grid_at(8);
        m.clamp_to(3);
        assert_eq!(m.index(), 2);
        m.clamp_to(0);
        assert_eq!(m.index(), 0);
    }

    #[test]
    fn unknown_initial_panel_falls_back_to_first() {
        let m = FocusModel::new(vec![Panel::Categories, Panel::Channels], Panel::Grid);
        assert_eq!(m.panel(), Panel::Categories);
    }
}
