//! All game entity types.
//!
//! Mostly plain data with constructors. Per-frame behaviour lives in
//! `compute`; screen flow lives in `state`. Constructors that need
//! randomness take an injected `Rng` so tests can seed them.

use rand::Rng;

use crate::audio::Sound;
use crate::config::GameConfig;
use crate::input::Movement;

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in logical viewport units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }
}

/// Read-only view of the world handed to every entity update, in place of a
/// back reference to the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Env {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub debug: bool,
}

// ── Sprite animation ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Back to frame 0 after the last frame.
    Wrap,
    /// Step one past the last frame and stop there; the animation is then
    /// finished.
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub frame: u32,
    pub max_frame: u32,
    pub timer: f32,
    /// Milliseconds between frames; zero steps on every update.
    pub interval: f32,
    pub policy: LoopPolicy,
}

impl Animation {
    /// Advances once per update regardless of elapsed time.
    pub fn per_frame(max_frame: u32) -> Self {
        Self {
            frame: 0,
            max_frame,
            timer: 0.0,
            interval: 0.0,
            policy: LoopPolicy::Wrap,
        }
    }

    pub fn timed(max_frame: u32, fps: f32, policy: LoopPolicy) -> Self {
        Self {
            frame: 0,
            max_frame,
            timer: 0.0,
            interval: 1000.0 / fps,
            policy,
        }
    }

    pub fn finished(&self) -> bool {
        self.policy == LoopPolicy::Hold && self.frame > self.max_frame
    }
}

// ── Projectiles & effects ────────────────────────────────────────────────────

pub const PROJECTILE_WIDTH: f32 = 36.25;
pub const PROJECTILE_HEIGHT: f32 = 20.0;

#[derive(Clone, Debug)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub anim: Animation,
    pub marked_for_deletion: bool,
}

impl Projectile {
    pub fn new(x: f32, y: f32, rng: &mut impl Rng) -> Self {
        Self {
            x,
            y,
            width: PROJECTILE_WIDTH,
            height: PROJECTILE_HEIGHT,
            speed: rng.gen::<f32>() * 0.2 + 2.8,
            anim: Animation::timed(3, 20.0, LoopPolicy::Wrap),
            marked_for_deletion: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Gear sheet cell size in pixels.
pub const PARTICLE_SPRITE_SIZE: f32 = 50.0;
pub const PARTICLE_GRAVITY: f32 = 0.5;
pub const PARTICLE_MAX_BOUNCES: u32 = 5;

/// A gear flung out of a hit or destroyed enemy.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub frame_x: u32,
    pub frame_y: u32,
    pub size: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub angle: f32,
    pub va: f32,
    pub bounced: u32,
    /// Distance above the floor below which the particle bounces.
    pub bottom_bounce_boundary: f32,
    pub marked_for_deletion: bool,
}

impl Particle {
    pub fn new(x: f32, y: f32, rng: &mut impl Rng) -> Self {
        // Size modifier is quantised to one decimal, 0.5..=1.0.
        let modifier = ((rng.gen::<f32>() * 0.5 + 0.5) * 10.0).round() / 10.0;
        Self {
            x,
            y,
            frame_x: rng.gen_range(0..3),
            frame_y: rng.gen_range(0..3),
            size: PARTICLE_SPRITE_SIZE * modifier,
            speed_x: rng.gen::<f32>() * 6.0 - 3.0,
            speed_y: rng.gen::<f32>() * -15.0,
            angle: 0.0,
            va: rng.gen::<f32>() * 0.2 - 0.1,
            bounced: 0,
            bottom_bounce_boundary: rng.gen::<f32>() * 80.0 + 60.0,
            marked_for_deletion: false,
        }
    }
}

pub const EXPLOSION_SIZE: f32 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplosionKind {
    Smoke,
    Fire,
}

#[derive(Clone, Debug)]
pub struct Explosion {
    pub kind: ExplosionKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub anim: Animation,
    pub marked_for_deletion: bool,
}

impl Explosion {
    /// Centred on `(cx, cy)`; nine frames at 15 fps.
    pub fn new(kind: ExplosionKind, cx: f32, cy: f32) -> Self {
        Self {
            kind,
            x: cx - EXPLOSION_SIZE * 0.5,
            y: cy - EXPLOSION_SIZE * 0.5,
            width: EXPLOSION_SIZE,
            height: EXPLOSION_SIZE,
            anim: Animation::timed(8, 15.0, LoopPolicy::Hold),
            marked_for_deletion: false,
        }
    }
}

// ── Enemies ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Angler1,
    Angler2,
    LuckyFish,
    HiveWhale,
    Drone,
    BulbWhale,
    MoonFish,
    Stalker,
    Razorfin,
}

/// Special behaviour attached to a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyTag {
    /// No special behaviour.
    Plain,
    /// Grants a power-up on contact instead of dealing damage.
    Lucky,
    /// Splits into drones on death.
    Hive,
    /// Grants a power-up on death.
    Moon,
    Drone,
    Stalker,
    Razorfin,
}

/// Fixed per-kind stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    pub width: f32,
    pub height: f32,
    pub lives: i32,
    pub score: u32,
    /// Rows on the sprite sheet; one is picked at spawn.
    pub sprite_rows: u32,
    /// Horizontal speed is `speed_base - rand * speed_spread`.
    pub speed_base: f32,
    pub speed_spread: f32,
    pub tag: EnemyTag,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 9] = [
        EnemyKind::Angler1,
        EnemyKind::Angler2,
        EnemyKind::LuckyFish,
        EnemyKind::HiveWhale,
        EnemyKind::Drone,
        EnemyKind::BulbWhale,
        EnemyKind::MoonFish,
        EnemyKind::Stalker,
        EnemyKind::Razorfin,
    ];

    pub fn profile(self) -> EnemyProfile {
        use EnemyTag::*;
        let (width, height, lives, score, sprite_rows, speed_base, speed_spread, tag) = match self
        {
            EnemyKind::Angler1 => (228.0, 169.0, 5, 5, 3, -0.5, 1.5, Plain),
            EnemyKind::Angler2 => (213.0, 165.0, 6, 6, 2, -0.5, 1.5, Plain),
            EnemyKind::LuckyFish => (99.0, 95.0, 5, 15, 2, -0.5, 1.5, Lucky),
            EnemyKind::HiveWhale => (400.0, 227.0, 20, 20, 1, -0.2, 1.2, Hive),
            EnemyKind::Drone => (115.0, 95.0, 3, 3, 2, -0.5, 4.2, Drone),
            EnemyKind::BulbWhale => (270.0, 219.0, 20, 20, 2, -0.2, 1.2, Plain),
            EnemyKind::MoonFish => (227.0, 240.0, 8, 8, 1, -2.0, 1.2, Moon),
            EnemyKind::Stalker => (243.0, 123.0, 7, 7, 1, -1.0, 1.0, Stalker),
            EnemyKind::Razorfin => (187.0, 149.0, 5, 5, 1, -1.0, 1.0, Razorfin),
        };
        EnemyProfile {
            width,
            height,
            lives,
            score,
            sprite_rows,
            speed_base,
            speed_spread,
            tag,
        }
    }
}

/// Hit-flash duration in milliseconds.
pub const FLASH_INTERVAL: f32 = 100.0;
/// Last frame index of every enemy swim cycle.
pub const ENEMY_MAX_FRAME: u32 = 37;

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed_x: f32,
    pub lives: i32,
    pub score: u32,
    pub anim: Animation,
    pub frame_y: u32,
    pub is_flashing: bool,
    pub flash_timer: f32,
    pub marked_for_deletion: bool,
}

impl Enemy {
    /// Place an enemy of `kind` with its top-left corner at `(x, y)`.
    pub fn at(kind: EnemyKind, x: f32, y: f32, rng: &mut impl Rng) -> Self {
        let p = kind.profile();
        Self {
            kind,
            x,
            y,
            width: p.width,
            height: p.height,
            speed_x: p.speed_base - rng.gen::<f32>() * p.speed_spread,
            lives: p.lives,
            score: p.score,
            anim: Animation::per_frame(ENEMY_MAX_FRAME),
            frame_y: rng.gen_range(0..p.sprite_rows),
            is_flashing: false,
            flash_timer: 0.0,
            marked_for_deletion: false,
        }
    }

    /// Enter from the right edge at a random height, clear of the bottom 5%.
    pub fn spawn(kind: EnemyKind, env: &Env, rng: &mut impl Rng) -> Self {
        let height = kind.profile().height;
        let y = rng.gen::<f32>() * (env.height * 0.95 - height);
        Self::at(kind, env.width, y, rng)
    }

    pub fn tag(&self) -> EnemyTag {
        self.kind.profile().tag
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Player & overlays ────────────────────────────────────────────────────────

pub const PLAYER_WIDTH: f32 = 120.0;
pub const PLAYER_HEIGHT: f32 = 190.0;
pub const PLAYER_MAX_SPEED: f32 = 3.0;
pub const PLAYER_MAX_FRAME: u32 = 37;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed_y: f32,
    pub anim: Animation,
    /// Sprite row: 1 while powered up, else 0.
    pub frame_y: u32,
    /// In fire order.
    pub projectiles: Vec<Projectile>,
    pub power_up: bool,
    pub power_up_timer: f32,
    pub power_up_limit: f32,
    pub health: u32,
    pub max_health: u32,
    /// Horizontal draw offset after firing; decays every frame.
    pub recoil: f32,
}

impl Player {
    pub fn new(max_health: u32, power_up_limit: f32) -> Self {
        Self {
            x: 20.0,
            y: 100.0,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            speed_y: 0.0,
            anim: Animation::per_frame(PLAYER_MAX_FRAME),
            frame_y: 0,
            projectiles: Vec::new(),
            power_up: false,
            power_up_timer: 0.0,
            power_up_limit,
            health: max_health,
            max_health,
            recoil: 0.0,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Shield flare played over the player whenever something rams it.
#[derive(Clone, Debug)]
pub struct Shield {
    pub width: f32,
    pub height: f32,
    pub anim: Animation,
}

impl Shield {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            anim: Animation::timed(24, 60.0, LoopPolicy::Hold),
        }
    }

    pub fn visible(&self) -> bool {
        !self.anim.finished()
    }
}

/// Screen-shake offset generator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub shake_duration: f32,
    pub shake_magnitude: f32,
}

impl Camera {
    pub fn shake(&mut self, duration: f32, magnitude: f32) {
        self.shake_duration = duration;
        self.shake_magnitude = magnitude;
    }
}

/// Per-playthrough counters shown on the mission report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub projectiles_fired: u32,
    pub projectiles_hit: u32,
    pub enemies_defeated: u32,
    pub damage_taken: u32,
    pub power_ups_collected: u32,
}

impl Stats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Hit percentage; 0 when nothing was fired.
    pub fn accuracy(&self) -> f32 {
        if self.projectiles_fired == 0 {
            0.0
        } else {
            self.projectiles_hit as f32 / self.projectiles_fired as f32 * 100.0
        }
    }
}

// ── Background ───────────────────────────────────────────────────────────────

pub const LAYER_WIDTH: f32 = 1768.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// 0 is the farthest layer, 3 the foreground.
    pub depth: u8,
    pub speed_modifier: f32,
    pub x: f32,
    pub width: f32,
}

impl Layer {
    pub fn new(depth: u8, speed_modifier: f32) -> Self {
        Self {
            depth,
            speed_modifier,
            x: 0.0,
            width: LAYER_WIDTH,
        }
    }
}

/// Three parallax layers behind the action and one in front of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Background {
    pub layers: [Layer; 3],
    pub foreground: Layer,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            layers: [Layer::new(0, 0.5), Layer::new(1, 1.0), Layer::new(2, 2.0)],
            foreground: Layer::new(3, 3.0),
        }
    }
}

// ── Master game state ────────────────────────────────────────────────────────

/// Everything one running game owns. Created once; `state::Game` resets the
/// playthrough parts whenever a new run starts.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub width: f32,
    pub height: f32,
    pub score: u32,
    pub winning_score: u32,
    pub ammo: f32,
    pub starting_ammo: f32,
    pub max_ammo: f32,
    pub ammo_timer: f32,
    pub ammo_interval: f32,
    pub power_up_regen: f32,
    pub enemy_timer: f32,
    pub enemy_interval: f32,
    pub game_time: f32,
    pub time_limit: f32,
    pub speed: f32,
    pub debug: bool,
    /// Direction key currently held.
    pub movement: Movement,
    pub player: Player,
    pub shield: Shield,
    pub camera: Camera,
    pub stats: Stats,
    pub background: Background,
    pub enemies: Vec<Enemy>,
    pub particles: Vec<Particle>,
    pub explosions: Vec<Explosion>,
    /// Cues raised this frame, flushed by `Game::update`.
    pub sounds: Vec<Sound>,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        let player = Player::new(config.player.max_health, config.player.power_up_limit_ms);
        let shield = Shield::new(player.width, player.height);
        Self {
            width: config.width,
            height: config.height,
            score: 0,
            winning_score: config.winning_score,
            ammo: config.ammo.starting,
            starting_ammo: config.ammo.starting,
            max_ammo: config.ammo.max,
            ammo_timer: 0.0,
            ammo_interval: config.ammo.interval_ms,
            power_up_regen: config.ammo.power_up_regen,
            enemy_timer: 0.0,
            enemy_interval: config.spawner.interval_ms,
            game_time: 0.0,
            time_limit: config.time_limit_ms,
            speed: config.speed,
            debug: false,
            movement: Movement::None,
            player,
            shield,
            camera: Camera::default(),
            stats: Stats::default(),
            background: Background::default(),
            enemies: Vec::new(),
            particles: Vec::new(),
            explosions: Vec::new(),
            sounds: Vec::new(),
        }
    }

    pub fn env(&self) -> Env {
        Env {
            width: self.width,
            height: self.height,
            speed: self.speed,
            debug: self.debug,
        }
    }

    pub fn queue_sound(&mut self, sound: Sound) {
        self.sounds.push(sound);
    }
}
