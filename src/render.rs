//! Draw routines.
//!
//! The core never rasterises anything: it describes each frame as calls on a
//! `Canvas`, and the host decides what a sprite or a rectangle looks like.
//! No game logic is performed here.

use crate::entities::{
    Enemy, EnemyKind, Explosion, ExplosionKind, GameSession, Layer, Particle, Projectile, Rect,
    PARTICLE_SPRITE_SIZE,
};
use crate::state::Rank;

// ── Canvas collaborator ──────────────────────────────────────────────────────

/// Sprite sheets the core refers to by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Player,
    Shield,
    Fireball,
    Gears,
    Enemy(EnemyKind),
    SmokeExplosion,
    FireExplosion,
    /// Parallax layer by depth, 0 farthest.
    Layer(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
    Red,
    Green,
    Gray,
    Orange,
    PaleYellow,
    Gold,
    Silver,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Composite {
    #[default]
    Normal,
    /// Additive blend used for the hit flash.
    Lighter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub align: Align,
    pub color: Color,
}

impl TextStyle {
    pub fn new(size: f32, align: Align, color: Color) -> Self {
        Self { size, align, color }
    }
}

/// Immediate-mode 2D surface. `save`/`restore` bracket transform, alpha and
/// composite changes.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn set_composite(&mut self, mode: Composite);
    /// Copy `src` from the sheet into `dst` on screen.
    fn draw_sprite(&mut self, sprite: SpriteId, src: Rect, dst: Rect);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);
}

// ── Screens ──────────────────────────────────────────────────────────────────

pub fn draw_main_menu(canvas: &mut dyn Canvas, s: &GameSession) {
    draw_background(canvas, s);
    draw_layer(canvas, &s.background.foreground, s.height);
    draw_player(canvas, s);

    let cx = s.width * 0.5;
    let cy = s.height * 0.5;
    canvas.draw_text(
        "KnotzBrigade",
        cx,
        cy - 50.0,
        TextStyle::new(70.0, Align::Center, Color::White),
    );
    let hint = TextStyle::new(25.0, Align::Center, Color::White);
    canvas.draw_text("Use Arrow Keys to Move, Spacebar to Shoot", cx, cy, hint);
    canvas.draw_text("Press Enter to start!", cx, cy + 40.0, hint);
}

pub fn draw_playing(canvas: &mut dyn Canvas, s: &GameSession) {
    draw_background(canvas, s);
    draw_player(canvas, s);
    draw_shield(canvas, s);
    for particle in &s.particles {
        draw_particle(canvas, particle);
    }
    for enemy in &s.enemies {
        draw_enemy(canvas, enemy, s.debug);
    }
    for explosion in &s.explosions {
        draw_explosion(canvas, explosion);
    }
    draw_layer(canvas, &s.background.foreground, s.height);
    draw_hud(canvas, s);
}

/// Mission report over the scrolling background.
pub fn draw_game_over(canvas: &mut dyn Canvas, s: &GameSession, rank: Rank) {
    draw_background(canvas, s);
    draw_layer(canvas, &s.background.foreground, s.height);

    let (w, h) = (s.width, s.height);
    let panel = Rect::new(w * 0.1, h * 0.1, w * 0.8, h * 0.8);
    canvas.save();
    canvas.set_alpha(0.7);
    canvas.fill_rect(panel, Color::Black);
    canvas.restore();
    canvas.stroke_rect(panel, Color::White);

    canvas.draw_text(
        "Mission Report",
        w * 0.5,
        h * 0.2,
        TextStyle::new(50.0, Align::Center, Color::White),
    );
    canvas.draw_text(
        &format!("Rank: {}", rank.label()),
        w * 0.5,
        h * 0.3,
        TextStyle::new(30.0, Align::Center, rank.color()),
    );

    let stats = &s.stats;
    let rows = [
        ("Final Score:", s.score.to_string()),
        ("Enemies Defeated:", stats.enemies_defeated.to_string()),
        ("Projectiles Fired:", stats.projectiles_fired.to_string()),
        ("Accuracy:", format!("{:.1}%", stats.accuracy())),
        ("Power-ups Collected:", stats.power_ups_collected.to_string()),
        ("Damage Taken:", stats.damage_taken.to_string()),
    ];
    let body = TextStyle::new(22.0, Align::Left, Color::White);
    let (label_x, value_x, start_y) = (w * 0.3, w * 0.65, h * 0.4);
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = start_y + 30.0 * i as f32;
        canvas.draw_text(label, label_x, y, body);
        canvas.draw_text(value, value_x, y, body);
    }

    canvas.draw_text(
        "Press Enter to return to Main Menu",
        w * 0.5,
        h * 0.9,
        TextStyle::new(25.0, Align::Center, Color::White),
    );
}

/// Black overlay over the whole viewport at the fade's opacity.
pub fn draw_fade(canvas: &mut dyn Canvas, s: &GameSession, alpha: f32) {
    canvas.save();
    canvas.set_alpha(alpha);
    canvas.fill_rect(Rect::new(0.0, 0.0, s.width, s.height), Color::Black);
    canvas.restore();
}

// ── Pieces ───────────────────────────────────────────────────────────────────

fn draw_background(canvas: &mut dyn Canvas, s: &GameSession) {
    for layer in &s.background.layers {
        draw_layer(canvas, layer, s.height);
    }
}

/// Two copies side by side so the seam never shows.
fn draw_layer(canvas: &mut dyn Canvas, layer: &Layer, height: f32) {
    let src = Rect::new(0.0, 0.0, layer.width, height);
    for x in [layer.x, layer.x + layer.width] {
        canvas.draw_sprite(
            SpriteId::Layer(layer.depth),
            src,
            Rect::new(x, 0.0, layer.width, height),
        );
    }
}

fn draw_player(canvas: &mut dyn Canvas, s: &GameSession) {
    let p = &s.player;
    if s.debug {
        canvas.stroke_rect(p.bounds(), Color::White);
    }

    if p.power_up {
        canvas.save();
        canvas.set_alpha(0.5 + (s.game_time * 0.01).sin() * 0.2);
        let (cx, cy) = p.bounds().center();
        canvas.fill_circle(cx, cy, p.width * 0.7, Color::PaleYellow);
        canvas.restore();
    }

    for projectile in &p.projectiles {
        draw_projectile(canvas, projectile);
    }

    let src = Rect::new(
        p.anim.frame as f32 * p.width,
        p.frame_y as f32 * p.height,
        p.width,
        p.height,
    );
    let dst = Rect::new(p.x + p.recoil, p.y, p.width, p.height);
    canvas.draw_sprite(SpriteId::Player, src, dst);
}

fn draw_shield(canvas: &mut dyn Canvas, s: &GameSession) {
    let shield = &s.shield;
    if !shield.visible() {
        return;
    }
    let src = Rect::new(
        shield.anim.frame as f32 * shield.width,
        0.0,
        shield.width,
        shield.height,
    );
    let dst = Rect::new(s.player.x, s.player.y, shield.width, shield.height);
    canvas.draw_sprite(SpriteId::Shield, src, dst);
}

fn draw_projectile(canvas: &mut dyn Canvas, p: &Projectile) {
    let src = Rect::new(p.anim.frame as f32 * p.width, 0.0, p.width, p.height);
    canvas.draw_sprite(SpriteId::Fireball, src, p.bounds());
}

fn draw_particle(canvas: &mut dyn Canvas, p: &Particle) {
    let cell = PARTICLE_SPRITE_SIZE;
    canvas.save();
    canvas.translate(p.x, p.y);
    canvas.rotate(p.angle);
    canvas.draw_sprite(
        SpriteId::Gears,
        Rect::new(p.frame_x as f32 * cell, p.frame_y as f32 * cell, cell, cell),
        Rect::new(p.size * -0.5, p.size * -0.5, p.size, p.size),
    );
    canvas.restore();
}

fn draw_enemy(canvas: &mut dyn Canvas, e: &Enemy, debug: bool) {
    if debug {
        canvas.stroke_rect(e.bounds(), Color::White);
    }

    canvas.save();
    if e.is_flashing {
        canvas.set_composite(Composite::Lighter);
    }
    let src = Rect::new(
        e.anim.frame as f32 * e.width,
        e.frame_y as f32 * e.height,
        e.width,
        e.height,
    );
    canvas.draw_sprite(SpriteId::Enemy(e.kind), src, e.bounds());
    canvas.restore();

    if debug {
        canvas.draw_text(
            &e.lives.to_string(),
            e.x,
            e.y,
            TextStyle::new(20.0, Align::Left, Color::White),
        );
    }
}

fn draw_explosion(canvas: &mut dyn Canvas, e: &Explosion) {
    let sprite = match e.kind {
        ExplosionKind::Smoke => SpriteId::SmokeExplosion,
        ExplosionKind::Fire => SpriteId::FireExplosion,
    };
    let src = Rect::new(e.anim.frame as f32 * e.width, 0.0, e.width, e.height);
    canvas.draw_sprite(sprite, src, Rect::new(e.x, e.y, e.width, e.height));
}

const BAR_WIDTH: f32 = 150.0;
const BAR_HEIGHT: f32 = 15.0;

/// Score, timer, health and ammo bars.
fn draw_hud(canvas: &mut dyn Canvas, s: &GameSession) {
    let text = TextStyle::new(25.0, Align::Left, Color::White);
    canvas.draw_text(&format!("Score: {}", s.score), 20.0, 40.0, text);
    canvas.draw_text(
        &format!("Timer: {:.1}", s.game_time * 0.001),
        s.width * 0.5,
        40.0,
        TextStyle::new(25.0, Align::Center, Color::White),
    );

    canvas.draw_text("Health:", 20.0, 80.0, text);
    let health = if s.player.max_health == 0 {
        0.0
    } else {
        s.player.health as f32 / s.player.max_health as f32
    };
    draw_bar(canvas, 68.0, health, Color::Red, Color::Green);

    let powered = s.player.power_up;
    let ammo_label = if powered {
        TextStyle::new(25.0, Align::Left, Color::PaleYellow)
    } else {
        text
    };
    canvas.draw_text("Ammo:", 20.0, 110.0, ammo_label);
    let fill = if powered { Color::PaleYellow } else { Color::Orange };
    let ammo = if s.max_ammo > 0.0 { s.ammo / s.max_ammo } else { 0.0 };
    draw_bar(canvas, 98.0, ammo, Color::Gray, fill);
}

fn draw_bar(canvas: &mut dyn Canvas, y: f32, fraction: f32, track: Color, fill: Color) {
    canvas.fill_rect(Rect::new(95.0, y, BAR_WIDTH, BAR_HEIGHT), track);
    let width = (fraction * BAR_WIDTH).clamp(0.0, BAR_WIDTH);
    canvas.fill_rect(Rect::new(95.0, y, width, BAR_HEIGHT), fill);
}
