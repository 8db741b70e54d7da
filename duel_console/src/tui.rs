// Improvement potential. Use `crossterm` instead (fix: for some reason rendering
//   square background was more buggy with it).

use console::Style;
use duel_chess::coord::{Col, Coord, Row};
use duel_chess::fen::fen_to_board;
use duel_chess::force::Force;
use duel_chess::grid::Grid;
use duel_chess::piece::piece_to_pictogram;
use duel_chess::presentation::{BoardWidget, ClockView, Controls, SessionView};
use duel_chess::LowTimeLevel;
use itertools::Itertools;


const BOARD_WIDTH: usize = (8 + 2) * 3;


// Terminal stand-in for the board widget. Keeps the position to draw; the actual drawing
// happens in the main loop.
#[derive(Default)]
pub struct TerminalBoard {
    orientation: Option<Force>,
    grid: Option<Grid>,
    highlighted: Vec<Coord>,
    needs_clear: bool,
}

impl TerminalBoard {
    pub fn new() -> Self { Self::default() }

    pub fn set_highlighted(&mut self, squares: Vec<Coord>) { self.highlighted = squares; }

    // Whether the screen must be cleared before the next frame (e.g. the layout changed).
    pub fn take_needs_clear(&mut self) -> bool { std::mem::take(&mut self.needs_clear) }

    pub fn render(&self) -> String {
        match (&self.grid, self.orientation) {
            (Some(grid), Some(orientation)) => render_grid(grid, orientation, &self.highlighted),
            _ => String::new(),
        }
    }

    fn set_position(&mut self, encoding: &str) {
        match fen_to_board(encoding) {
            Ok(board) => self.grid = Some(board.grid().clone()),
            Err(err) => log::error!("Cannot display position {encoding:?}: {err}"),
        }
    }
}

impl BoardWidget for TerminalBoard {
    fn orientation(&self) -> Option<Force> { self.orientation }

    fn construct(&mut self, orientation: Force, encoding: &str) {
        self.orientation = Some(orientation);
        self.highlighted.clear();
        self.needs_clear = true;
        self.set_position(encoding);
    }

    fn redraw(&mut self, encoding: &str) { self.set_position(encoding); }

    fn clear(&mut self) {
        self.orientation = None;
        self.grid = None;
        self.highlighted.clear();
        self.needs_clear = true;
    }

    // There is no dragging in the terminal: just drop the move hint.
    fn snapback(&mut self) { self.highlighted.clear(); }

    fn resize(&mut self) { self.needs_clear = true; }
}


// Everything around the board: names, clocks, the action hint and the notice.
#[derive(Default)]
pub struct TerminalControls {
    top: String,
    bottom: String,
    footer: Vec<String>,
}

impl TerminalControls {
    pub fn new() -> Self { Self::default() }
    pub fn top(&self) -> &str { &self.top }
    pub fn bottom(&self) -> &str { &self.bottom }
    pub fn footer(&self) -> &[String] { &self.footer }
}

impl Controls for TerminalControls {
    fn render(&mut self, view: &SessionView) {
        self.top = render_header(view.opponent_label.as_deref(), view.opponent_clock.as_ref());
        self.bottom = render_header(view.my_label.as_deref(), view.my_clock.as_ref());
        self.footer.clear();
        if let Some(notice) = &view.notice {
            self.footer.push(Style::new().magenta().apply_to(notice).to_string());
            self.footer.push("Type /dismiss to hide the message.".to_owned());
        }
        if let Some((from, to)) = view.promotion_prompt {
            self.footer.push(format!(
                "Promotion {}-{}: choose q, r, b or n (Enter for queen, Esc to cancel)",
                from.to_algebraic(),
                to.to_algebraic()
            ));
        }
        if view.action.visible {
            let hint = if view.action.enabled {
                format!("{}: type /play", view.action.label)
            } else {
                view.action.label.to_owned()
            };
            self.footer.push(Style::new().dim().apply_to(hint).to_string());
        }
    }
}


fn render_clock(clock: &ClockView) -> (String, usize) {
    let text_len = clock.text.chars().count();
    let mut style = Style::new();
    style = match clock.low_time_level {
        LowTimeLevel::Normal => style,
        LowTimeLevel::Warning => style.yellow(),
        LowTimeLevel::Critical => style.red(),
    };
    if clock.out_of_time {
        style = Style::new().on_red();
    } else if clock.is_active {
        style = style.reverse();
    }
    (style.apply_to(&clock.text).to_string(), text_len)
}

fn render_header(label: Option<&str>, clock: Option<&ClockView>) -> String {
    let (Some(label), Some(clock)) = (label, clock) else {
        return String::new();
    };
    let (clock_str, clock_str_len) = render_clock(clock);
    let label_len = label.chars().count();
    let space = " ".repeat(BOARD_WIDTH.saturating_sub(clock_str_len + label_len));
    format!("{label}{space}{clock_str}")
}

fn render_grid(grid: &Grid, orientation: Force, highlighted: &[Coord]) -> String {
    let colors = [
        Style::new().color256(233).on_color256(222),
        Style::new().color256(233).on_color256(230),
    ];
    let highlight = Style::new().color256(233).on_color256(150);
    let rows = match orientation {
        Force::White => Row::all().rev().collect_vec(),
        Force::Black => Row::all().collect_vec(),
    };
    let cols = match orientation {
        Force::White => Col::all().collect_vec(),
        Force::Black => Col::all().rev().collect_vec(),
    };
    let col_header = format!(
        "{}{}{}",
        format_square(' '),
        cols.iter().map(|col| format_square(col.to_algebraic())).join(""),
        format_square(' ')
    );
    let mut ret = col_header.clone();
    ret.push('\n');
    for &row in &rows {
        ret.push_str(&format_square(row.to_algebraic()));
        for &col in &cols {
            let coord = Coord::new(row, col);
            let style = if highlighted.contains(&coord) {
                &highlight
            } else {
                &colors[usize::from(coord.is_light())]
            };
            let ch = match grid[coord] {
                Some(piece) => piece_to_pictogram(piece.kind, piece.force),
                None => ' ',
            };
            ret.push_str(&style.apply_to(format_square(ch)).to_string());
        }
        ret.push_str(&format_square(row.to_algebraic()));
        ret.push('\n');
    }
    ret.push_str(&col_header);
    ret
}

fn format_square(ch: char) -> String { format!(" {} ", ch) }
