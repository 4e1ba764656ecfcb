//! Rendering layer: all terminal I/O lives here.
//!
//! `TerminalCanvas` implements the core's `Canvas` by scaling the logical
//! viewport onto the terminal grid. Draw calls land in a cell buffer;
//! `present` writes the buffer out row by row. No game logic is performed
//! here.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    QueueableCommand,
};
use knotz_brigade::entities::{EnemyKind, Rect};
use knotz_brigade::render::{self, Align, Canvas, Composite, SpriteId, TextStyle};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_PLAYER: Color = Color::White;
const C_SHIELD: Color = Color::Cyan;
const C_FIREBALL: Color = Color::Yellow;
const C_GEARS: Color = Color::DarkYellow;
const C_SMOKE: Color = Color::Grey;
const C_FIRE: Color = Color::Red;
const C_FAR: Color = Color::DarkBlue;
const C_NEAR: Color = Color::DarkCyan;
const C_FOREGROUND: Color = Color::DarkGreen;

fn term_color(color: render::Color) -> Color {
    match color {
        render::Color::White => Color::White,
        render::Color::Black => Color::Black,
        render::Color::Red => Color::Red,
        render::Color::Green => Color::Green,
        render::Color::Gray => Color::DarkGrey,
        render::Color::Orange => Color::DarkYellow,
        render::Color::PaleYellow => Color::Yellow,
        render::Color::Gold => Color::Yellow,
        render::Color::Silver => Color::Grey,
    }
}

/// Glyph and colour standing in for a sprite sheet.
fn sprite_glyph(sprite: SpriteId) -> (char, Color) {
    match sprite {
        SpriteId::Player => ('█', C_PLAYER),
        SpriteId::Shield => ('░', C_SHIELD),
        SpriteId::Fireball => ('=', C_FIREBALL),
        SpriteId::Gears => ('*', C_GEARS),
        SpriteId::SmokeExplosion => ('▒', C_SMOKE),
        SpriteId::FireExplosion => ('▒', C_FIRE),
        SpriteId::Enemy(kind) => match kind {
            EnemyKind::Angler1 => ('A', Color::Green),
            EnemyKind::Angler2 => ('a', Color::Green),
            EnemyKind::LuckyFish => ('$', Color::Yellow),
            EnemyKind::HiveWhale => ('H', Color::DarkMagenta),
            EnemyKind::Drone => ('d', Color::Magenta),
            EnemyKind::BulbWhale => ('B', Color::Blue),
            EnemyKind::MoonFish => ('M', Color::Cyan),
            EnemyKind::Stalker => ('S', Color::Red),
            EnemyKind::Razorfin => ('R', Color::DarkRed),
        },
        SpriteId::Layer(0) => ('.', C_FAR),
        SpriteId::Layer(1) => ('·', C_FAR),
        SpriteId::Layer(2) => ('~', C_NEAR),
        SpriteId::Layer(_) => ('≈', C_FOREGROUND),
    }
}

// ── Cell buffer ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Color,
}

const BLANK: Cell = Cell {
    ch: ' ',
    fg: Color::Reset,
};

/// Below this opacity a draw call is skipped entirely.
const FAINT: f32 = 0.35;
/// At or above this opacity a black fill blanks the cell; below it dims.
const OPAQUE: f32 = 0.7;

#[derive(Clone, Copy)]
struct DrawState {
    dx: f32,
    dy: f32,
    alpha: f32,
    composite: Composite,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            alpha: 1.0,
            composite: Composite::Normal,
        }
    }
}

pub struct TerminalCanvas {
    cols: u16,
    rows: u16,
    logical_width: f32,
    logical_height: f32,
    cells: Vec<Cell>,
    current: DrawState,
    stack: Vec<DrawState>,
}

impl TerminalCanvas {
    pub fn new(cols: u16, rows: u16, logical_width: f32, logical_height: f32) -> Self {
        Self {
            cols,
            rows,
            logical_width,
            logical_height,
            cells: vec![BLANK; cols as usize * rows as usize],
            current: DrawState::default(),
            stack: Vec::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![BLANK; cols as usize * rows as usize];
    }

    /// Blank the buffer and drop any transform left over from the last frame.
    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
        self.current = DrawState::default();
        self.stack.clear();
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.cols as f32 / self.logical_width,
            self.rows as f32 / self.logical_height,
        )
    }

    /// Logical point (after translation) → terminal cell.
    fn to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        let (sx, sy) = self.scale();
        (
            ((x + self.current.dx) * sx).floor() as i32,
            ((y + self.current.dy) * sy).floor() as i32,
        )
    }

    /// Cell span covered by a logical rectangle, at least one cell.
    fn span(&self, rect: Rect) -> (i32, i32, i32, i32) {
        let (c0, r0) = self.to_cell(rect.x, rect.y);
        let (c1, r1) = self.to_cell(rect.x + rect.w, rect.y + rect.h);
        (c0, r0, c1.max(c0 + 1), r1.max(r0 + 1))
    }

    fn cell_mut(&mut self, col: i32, row: i32) -> Option<&mut Cell> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        let idx = row as usize * self.cols as usize + col as usize;
        self.cells.get_mut(idx)
    }

    fn put(&mut self, col: i32, row: i32, ch: char, fg: Color) {
        if self.current.alpha < FAINT {
            return;
        }
        let fg = match self.current.composite {
            Composite::Lighter => Color::White,
            Composite::Normal => fg,
        };
        if let Some(cell) = self.cell_mut(col, row) {
            *cell = Cell { ch, fg };
        }
    }

    /// Darken a cell under a translucent black overlay.
    fn shade(&mut self, col: i32, row: i32, alpha: f32) {
        if let Some(cell) = self.cell_mut(col, row) {
            if alpha >= OPAQUE {
                *cell = BLANK;
            } else if alpha >= FAINT {
                cell.fg = Color::DarkGrey;
            }
        }
    }

    fn draw_layer(&mut self, depth: u8, dst: Rect, glyph: (char, Color)) {
        let (c0, _, c1, _) = self.span(dst);
        let rows = self.rows as i32;
        let (first_row, density) = match depth {
            0 => (0, 29),
            1 => (0, 17),
            2 => (rows / 2, 11),
            _ => (rows - 1, 3),
        };
        for col in c0.max(0)..c1.min(self.cols as i32) {
            let local = col - c0;
            for row in first_row.max(0)..rows {
                if (local * 7 + row * 13 + depth as i32 * 5) % density == 0 {
                    self.put(col, row, glyph.0, glyph.1);
                }
            }
        }
    }

    // ── Output ────────────────────────────────────────────────────────────────

    /// Write the whole buffer, batching runs of equal colour.
    pub fn present<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, row))?;
            let start = row as usize * self.cols as usize;
            let line = &self.cells[start..start + self.cols as usize];

            let mut run = String::new();
            let mut run_fg = Color::Reset;
            for cell in line {
                if cell.fg != run_fg && !run.is_empty() {
                    out.queue(style::SetForegroundColor(run_fg))?;
                    out.queue(Print(&run))?;
                    run.clear();
                }
                run_fg = cell.fg;
                run.push(cell.ch);
            }
            if !run.is_empty() {
                out.queue(style::SetForegroundColor(run_fg))?;
                out.queue(Print(&run))?;
            }
        }
        out.queue(style::ResetColor)?;
        out.flush()?;
        Ok(())
    }
}

// ── Canvas ────────────────────────────────────────────────────────────────────

impl Canvas for TerminalCanvas {
    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.current = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.current.dx += dx;
        self.current.dy += dy;
    }

    // Glyphs do not rotate.
    fn rotate(&mut self, _radians: f32) {}

    fn set_alpha(&mut self, alpha: f32) {
        self.current.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_composite(&mut self, mode: Composite) {
        self.current.composite = mode;
    }

    fn draw_sprite(&mut self, sprite: SpriteId, _src: Rect, dst: Rect) {
        let glyph = sprite_glyph(sprite);
        if let SpriteId::Layer(depth) = sprite {
            self.draw_layer(depth, dst, glyph);
            return;
        }
        let (c0, r0, c1, r1) = self.span(dst);
        for row in r0..r1 {
            for col in c0..c1 {
                self.put(col, row, glyph.0, glyph.1);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: render::Color) {
        if rect.w <= 0.0 {
            return;
        }
        let (c0, r0, c1, r1) = self.span(rect);
        let alpha = self.current.alpha;
        for row in r0..r1 {
            for col in c0..c1 {
                if color == render::Color::Black {
                    self.shade(col, row, alpha);
                } else {
                    self.put(col, row, '█', term_color(color));
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: render::Color) {
        let (c0, r0, c1, r1) = self.span(rect);
        let fg = term_color(color);
        let (c1, r1) = (c1 - 1, r1 - 1);
        for col in c0..=c1 {
            self.put(col, r0, '─', fg);
            self.put(col, r1, '─', fg);
        }
        for row in r0..=r1 {
            self.put(c0, row, '│', fg);
            self.put(c1, row, '│', fg);
        }
        self.put(c0, r0, '┌', fg);
        self.put(c1, r0, '┐', fg);
        self.put(c0, r1, '└', fg);
        self.put(c1, r1, '┘', fg);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: render::Color) {
        let bounds = Rect::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        let (c0, r0, c1, r1) = self.span(bounds);
        let (ccx, ccy) = self.to_cell(cx, cy);
        let (sx, sy) = self.scale();
        let (rx, ry) = ((radius * sx).max(1.0), (radius * sy).max(1.0));
        let fg = term_color(color);
        for row in r0..r1 {
            for col in c0..c1 {
                let nx = (col - ccx) as f32 / rx;
                let ny = (row - ccy) as f32 / ry;
                if nx * nx + ny * ny <= 1.0 {
                    self.put(col, row, '░', fg);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        let (mut col, row) = self.to_cell(x, y);
        if style.align == Align::Center {
            col -= text.chars().count() as i32 / 2;
        }
        let fg = term_color(style.color);
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch, fg);
        }
    }
}
