//! Screen state machine and the fade protocol that bridges screens.
//!
//! `Game` owns the session, the RNG and the current `Screen`. Screen changes
//! go through an explicit table (`next_screen`) and are always routed
//! through a fade: the destination's `enter` runs once, at the moment the
//! fade alpha first reaches 1.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::audio::{Audio, Sound};
use crate::compute;
use crate::config::GameConfig;
use crate::entities::GameSession;
use crate::input::{InputEvent, InputSnapshot};
use crate::render::{self, Canvas, Color};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    MainMenu,
    Playing,
    GameOver,
}

/// What can move the game from one screen to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Confirm,
    PlayerDestroyed,
    TimeUp,
}

/// The transition table. `None` means the trigger means nothing on that
/// screen.
pub fn next_screen(screen: Screen, trigger: Trigger) -> Option<Screen> {
    match (screen, trigger) {
        (Screen::MainMenu, Trigger::Confirm) => Some(Screen::Playing),
        (Screen::Playing, Trigger::PlayerDestroyed | Trigger::TimeUp) => Some(Screen::GameOver),
        (Screen::GameOver, Trigger::Confirm) => Some(Screen::MainMenu),
        _ => None,
    }
}

// ── Rank ─────────────────────────────────────────────────────────────────────

/// Cosmetic title on the mission report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rank {
    DeckSwabber,
    BrigadeCaptain,
    KnotzAdmiral,
}

impl Rank {
    pub fn for_score(score: u32, winning_score: u32) -> Self {
        if score >= winning_score {
            Rank::KnotzAdmiral
        } else if score as f32 >= winning_score as f32 * 0.5 {
            Rank::BrigadeCaptain
        } else {
            Rank::DeckSwabber
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::DeckSwabber => "Deck Swabber",
            Rank::BrigadeCaptain => "Brigade Captain",
            Rank::KnotzAdmiral => "Knotz Admiral",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Rank::DeckSwabber => Color::White,
            Rank::BrigadeCaptain => Color::Silver,
            Rank::KnotzAdmiral => Color::Gold,
        }
    }
}

// ── Fade ─────────────────────────────────────────────────────────────────────

/// Black-overlay fade: alpha ramps up, the destination is entered, alpha
/// ramps back down. Steps are per frame, not per millisecond.
#[derive(Clone, Debug, PartialEq)]
pub struct Fade {
    pub active: bool,
    pub alpha: f32,
    /// +1 while darkening, -1 while clearing.
    pub direction: i8,
    pub speed: f32,
    pub next: Option<Screen>,
}

impl Fade {
    pub fn new(speed: f32) -> Self {
        Self {
            active: false,
            alpha: 0.0,
            direction: 1,
            speed,
            next: None,
        }
    }

    /// Arm a fade towards `screen`. Dropped if one is already running.
    pub fn request(&mut self, screen: Screen) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.direction = 1;
        self.next = Some(screen);
        true
    }

    /// One frame of fading. Yields the screen to enter on the frame alpha
    /// reaches 1.
    pub fn step(&mut self) -> Option<Screen> {
        if !self.active {
            return None;
        }
        self.alpha += f32::from(self.direction) * self.speed;
        if self.alpha >= 1.0 {
            self.alpha = 1.0;
            self.direction = -1;
            self.next.take()
        } else {
            if self.alpha <= 0.0 {
                self.alpha = 0.0;
                self.active = false;
            }
            None
        }
    }
}

// ── Game ─────────────────────────────────────────────────────────────────────

pub struct Game {
    pub session: GameSession,
    screen: Screen,
    fade: Fade,
    rank: Rank,
    entries: u64,
    rng: StdRng,
}

impl Game {
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// The main menu is entered straight away, without a fade.
    pub fn with_rng(config: &GameConfig, rng: StdRng) -> Self {
        let mut game = Self {
            session: GameSession::new(config),
            screen: Screen::MainMenu,
            fade: Fade::new(config.fade_speed),
            rank: Rank::DeckSwabber,
            entries: 0,
            rng,
        };
        game.enter(Screen::MainMenu);
        game
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn fade(&self) -> &Fade {
        &self.fade
    }

    /// Rank computed when the game-over screen was last entered.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// How many times any screen's `enter` has run, the initial one included.
    pub fn entry_count(&self) -> u64 {
        self.entries
    }

    /// Ask for a screen change. Goes through a fade; ignored while a fade is
    /// already running, so the first request wins.
    pub fn set_state(&mut self, screen: Screen) {
        if self.fade.request(screen) {
            debug!(from = ?self.screen, to = ?screen, "fade requested");
        }
    }

    fn trigger(&mut self, trigger: Trigger) {
        if let Some(next) = next_screen(self.screen, trigger) {
            self.set_state(next);
        }
    }

    /// The only place per-screen data is reset.
    fn enter(&mut self, screen: Screen) {
        self.screen = screen;
        self.entries += 1;
        let s = &mut self.session;
        match screen {
            Screen::MainMenu => {
                s.player.x = s.width * 0.5 - s.player.width * 0.5;
                s.player.y = s.height * 0.5 - s.player.height * 0.5 + 80.0;
                s.player.projectiles.clear();
            }
            Screen::Playing => {
                s.player.x = 20.0;
                s.player.y = 100.0;
                s.player.health = s.player.max_health;
                s.player.frame_y = 0;
                s.player.power_up = false;
                s.player.power_up_timer = 0.0;
                s.player.recoil = 0.0;
                s.player.projectiles.clear();
                s.enemies.clear();
                s.particles.clear();
                s.explosions.clear();
                s.ammo = s.starting_ammo;
                s.ammo_timer = 0.0;
                s.enemy_timer = 0.0;
                s.score = 0;
                s.game_time = 0.0;
                s.stats.reset();
                s.queue_sound(Sound::Background);
            }
            Screen::GameOver => {
                self.rank = Rank::for_score(s.score, s.winning_score);
                info!(
                    score = s.score,
                    rank = self.rank.label(),
                    kills = s.stats.enemies_defeated,
                    "game over"
                );
            }
        }
        info!(?screen, entry = self.entries, "screen entered");
    }

    /// Route one discrete input. Debug toggling works on every screen; the
    /// rest belongs to the active screen.
    pub fn handle_event(&mut self, event: InputEvent) {
        match (self.screen, event) {
            (_, InputEvent::ToggleDebug) => {
                self.session.debug = !self.session.debug;
                debug!(debug = self.session.debug, "debug overlay toggled");
            }
            (Screen::Playing, InputEvent::Fire) => compute::shoot(&mut self.session, &mut self.rng),
            (_, InputEvent::Confirm) => self.trigger(Trigger::Confirm),
            _ => {}
        }
    }

    /// One frame. While a fade runs only the fade advances; otherwise the
    /// active screen updates. The camera always updates, and queued sounds
    /// are flushed to `audio` at the end.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot, audio: &mut dyn Audio) {
        for event in &input.events {
            self.handle_event(*event);
        }
        self.session.movement = input.movement;

        if self.fade.active {
            if let Some(screen) = self.fade.step() {
                self.enter(screen);
            }
            if !self.fade.active {
                debug!(screen = ?self.screen, "fade finished");
            }
        } else {
            self.update_screen(dt);
        }

        compute::update_camera(&mut self.session.camera, dt, &mut self.rng);

        for sound in self.session.sounds.drain(..) {
            audio.play(sound);
        }
    }

    fn update_screen(&mut self, dt: f32) {
        let env = self.session.env();
        match self.screen {
            Screen::MainMenu => {
                compute::update_background(&mut self.session.background, &env);
                compute::update_player(&mut self.session, dt);
                compute::compact(&mut self.session);
            }
            Screen::Playing => {
                if let Some(trigger) = compute::tick(&mut self.session, dt, &mut self.rng) {
                    self.trigger(trigger);
                }
            }
            Screen::GameOver => {
                compute::update_background(&mut self.session.background, &env);
            }
        }
    }

    /// Draw the active screen shaken by the camera, then the fade overlay.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let s = &self.session;
        canvas.save();
        canvas.translate(s.camera.x, s.camera.y);
        match self.screen {
            Screen::MainMenu => render::draw_main_menu(canvas, s),
            Screen::Playing => render::draw_playing(canvas, s),
            Screen::GameOver => render::draw_game_over(canvas, s, self.rank),
        }
        canvas.restore();

        if self.fade.active {
            render::draw_fade(canvas, s, self.fade.alpha);
        }
    }
}
