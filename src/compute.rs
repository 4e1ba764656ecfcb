//! Per-frame game rules.
//!
//! Every function mutates the session (or a single entity) in place. All
//! randomness comes through an injected `rng`, so callers control
//! determinism (tests use a seeded `StdRng`). Time arguments are frame
//! deltas in milliseconds; movement speeds are pixels per frame.

use rand::Rng;
use tracing::{debug, info};

use crate::audio::Sound;
use crate::entities::{
    Animation, Background, Camera, Enemy, EnemyKind, EnemyTag, Env, Explosion, ExplosionKind,
    GameSession, Layer, LoopPolicy, Particle, Player, Projectile, Rect, Shield, FLASH_INTERVAL,
    PARTICLE_GRAVITY, PARTICLE_MAX_BOUNCES, PLAYER_MAX_SPEED,
};
use crate::input::Movement;
use crate::state::Trigger;

/// Drones released by a destroyed hive whale.
pub const HIVE_DRONES: usize = 5;
pub const SHAKE_DURATION: f32 = 150.0;
pub const SHAKE_MAGNITUDE: f32 = 10.0;

// ── Collision ────────────────────────────────────────────────────────────────

/// Axis-aligned overlap; touching edges do not count.
///
/// Every enemy is tested against the player and every live projectile each
/// frame, O(enemies × projectiles). Populations stay in the tens, so there
/// is no broad phase.
pub fn collides(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

// ── Animation ────────────────────────────────────────────────────────────────

pub fn advance_animation(anim: &mut Animation, dt: f32) {
    if anim.interval <= 0.0 {
        step_frame(anim);
    } else if anim.timer > anim.interval {
        step_frame(anim);
        anim.timer = 0.0;
    } else if !anim.finished() {
        anim.timer += dt;
    }
}

fn step_frame(anim: &mut Animation) {
    match anim.policy {
        LoopPolicy::Wrap => {
            if anim.frame < anim.max_frame {
                anim.frame += 1;
            } else {
                anim.frame = 0;
            }
        }
        LoopPolicy::Hold => {
            if anim.frame <= anim.max_frame {
                anim.frame += 1;
            }
        }
    }
}

// ── Short-lived entities ─────────────────────────────────────────────────────

pub fn update_projectile(p: &mut Projectile, dt: f32, env: &Env) {
    p.x += p.speed;
    advance_animation(&mut p.anim, dt);
    if p.x > env.width * 0.8 {
        p.marked_for_deletion = true;
    }
}

pub fn update_particle(p: &mut Particle, env: &Env) {
    p.angle += p.va;
    p.speed_y += PARTICLE_GRAVITY;
    p.x -= p.speed_x + env.speed;
    p.y += p.speed_y;
    if p.y > env.height + p.size || p.x < -p.size {
        p.marked_for_deletion = true;
    }
    if p.y > env.height - p.bottom_bounce_boundary && p.bounced < PARTICLE_MAX_BOUNCES {
        p.bounced += 1;
        p.speed_y *= -0.7;
    }
}

pub fn update_explosion(e: &mut Explosion, dt: f32, env: &Env) {
    e.x -= env.speed;
    advance_animation(&mut e.anim, dt);
    if e.anim.finished() {
        e.marked_for_deletion = true;
    }
}

pub fn update_enemy(e: &mut Enemy, dt: f32, env: &Env) {
    e.x += e.speed_x - env.speed;
    // Escaped: gone without score or explosion.
    if e.x + e.width < 0.0 {
        e.marked_for_deletion = true;
    }
    advance_animation(&mut e.anim, dt);
    if e.is_flashing {
        e.flash_timer += dt;
        if e.flash_timer > FLASH_INTERVAL {
            e.is_flashing = false;
            e.flash_timer = 0.0;
        }
    }
}

/// Start the hit flash.
pub fn flash_enemy(e: &mut Enemy) {
    e.is_flashing = true;
    e.flash_timer = 0.0;
}

// ── Player ───────────────────────────────────────────────────────────────────

fn steer_player(player: &mut Player, movement: Movement, env: &Env) {
    player.speed_y = match movement {
        Movement::Up => -PLAYER_MAX_SPEED,
        Movement::Down => PLAYER_MAX_SPEED,
        Movement::None => 0.0,
    };
    player.y += player.speed_y;
    player.recoil *= 0.9;

    // Half the sprite may leave the screen at either edge.
    let half = player.height * 0.5;
    if player.y > env.height - half {
        player.y = env.height - half;
    } else if player.y < -half {
        player.y = -half;
    }
}

/// Move the player, advance its projectiles and run the power-up clock.
pub fn update_player(session: &mut GameSession, dt: f32) {
    let env = session.env();
    let movement = session.movement;
    steer_player(&mut session.player, movement, &env);

    for projectile in session.player.projectiles.iter_mut() {
        update_projectile(projectile, dt, &env);
    }

    advance_animation(&mut session.player.anim, dt);

    if session.player.power_up {
        if session.player.power_up_timer > session.player.power_up_limit {
            session.player.power_up_timer = 0.0;
            session.player.power_up = false;
            session.player.frame_y = 0;
            session.queue_sound(Sound::PowerDown);
            info!("power-up expired");
        } else {
            session.player.power_up_timer += dt;
            session.player.frame_y = 1;
            session.ammo = (session.ammo + session.power_up_regen).min(session.max_ammo);
        }
    }
}

/// Fire from the top muzzle, and from the bottom one too while powered up.
///
/// Only the top shot costs ammo and counts as fired; the shot cue plays even
/// when the magazine is empty.
pub fn shoot(session: &mut GameSession, rng: &mut impl Rng) {
    let (x, y) = (session.player.x, session.player.y);
    if session.ammo > 0.0 {
        session.player.projectiles.push(Projectile::new(x + 80.0, y + 30.0, rng));
        session.ammo = (session.ammo - 1.0).max(0.0);
        session.player.recoil = -5.0;
        session.stats.projectiles_fired += 1;
    }
    session.queue_sound(Sound::Shot);
    if session.player.power_up && session.ammo > 0.0 {
        session.player.projectiles.push(Projectile::new(x + 80.0, y + 175.0, rng));
    }
}

pub fn enter_power_up(session: &mut GameSession) {
    session.player.power_up_timer = 0.0;
    session.player.power_up = true;
    if session.ammo < session.max_ammo {
        session.ammo = session.max_ammo;
    }
    session.queue_sound(Sound::PowerUp);
    session.stats.power_ups_collected += 1;
    info!(collected = session.stats.power_ups_collected, "power-up");
}

/// Interval refill, one round at a time, only while not powered up.
pub fn regen_ammo(session: &mut GameSession, dt: f32) {
    if session.player.power_up {
        return;
    }
    if session.ammo_timer > session.ammo_interval {
        if session.ammo < session.max_ammo {
            session.ammo = (session.ammo + 1.0).min(session.max_ammo);
        }
        session.ammo_timer = 0.0;
    } else {
        session.ammo_timer += dt;
    }
}

// ── Shield, camera, background ───────────────────────────────────────────────

pub fn update_shield(shield: &mut Shield, dt: f32) {
    advance_animation(&mut shield.anim, dt);
}

/// Replay the shield flare from its first frame.
pub fn reset_shield(session: &mut GameSession) {
    session.shield.anim.frame = 0;
    session.shield.anim.timer = 0.0;
    session.queue_sound(Sound::Shield);
}

pub fn update_camera(camera: &mut Camera, dt: f32, rng: &mut impl Rng) {
    if camera.shake_duration > 0.0 {
        camera.shake_duration -= dt;
        camera.x = (rng.gen::<f32>() - 0.5) * camera.shake_magnitude;
        camera.y = (rng.gen::<f32>() - 0.5) * camera.shake_magnitude;
    } else {
        camera.x = 0.0;
        camera.y = 0.0;
    }
}

pub fn update_layer(layer: &mut Layer, env: &Env) {
    if layer.x <= -layer.width {
        layer.x = 0.0;
    }
    layer.x -= env.speed * layer.speed_modifier;
}

pub fn update_background(background: &mut Background, env: &Env) {
    for layer in background.layers.iter_mut() {
        update_layer(layer, env);
    }
    update_layer(&mut background.foreground, env);
}

// ── Spawning ─────────────────────────────────────────────────────────────────

/// Map a uniform roll in `[0, 1)` onto the spawn ladder.
pub fn pick_enemy_kind(roll: f32) -> EnemyKind {
    if roll < 0.1 {
        EnemyKind::Angler1
    } else if roll < 0.3 {
        EnemyKind::Stalker
    } else if roll < 0.5 {
        EnemyKind::Razorfin
    } else if roll < 0.6 {
        EnemyKind::Angler2
    } else if roll < 0.7 {
        EnemyKind::HiveWhale
    } else if roll < 0.8 {
        EnemyKind::BulbWhale
    } else if roll < 0.9 {
        EnemyKind::MoonFish
    } else {
        EnemyKind::LuckyFish
    }
}

pub fn add_enemy(session: &mut GameSession, rng: &mut impl Rng) {
    let env = session.env();
    let kind = pick_enemy_kind(rng.gen::<f32>());
    session.enemies.push(Enemy::spawn(kind, &env, rng));
    debug!(?kind, total = session.enemies.len(), "enemy spawned");
}

/// Runs on accumulated delta time, not wall-clock.
pub fn tick_spawner(session: &mut GameSession, dt: f32, rng: &mut impl Rng) {
    if session.enemy_timer > session.enemy_interval {
        add_enemy(session, rng);
        session.enemy_timer = 0.0;
    } else {
        session.enemy_timer += dt;
    }
}

pub fn add_explosion(session: &mut GameSession, at: &Rect, rng: &mut impl Rng) {
    let kind = if rng.gen::<f32>() < 0.5 {
        ExplosionKind::Smoke
    } else {
        ExplosionKind::Fire
    };
    let (cx, cy) = at.center();
    session.explosions.push(Explosion::new(kind, cx, cy));
}

pub fn spawn_particles(session: &mut GameSession, at: &Rect, count: u32, rng: &mut impl Rng) {
    let (cx, cy) = at.center();
    for _ in 0..count {
        session.particles.push(Particle::new(cx, cy, rng));
    }
}

/// Drones scattered over the whale's body, upper half vertically.
pub fn hive_drones(whale: &Rect, rng: &mut impl Rng) -> Vec<Enemy> {
    (0..HIVE_DRONES)
        .map(|_| {
            let x = whale.x + rng.gen::<f32>() * whale.w;
            let y = whale.y + rng.gen::<f32>() * whale.h * 0.5;
            Enemy::at(EnemyKind::Drone, x, y, rng)
        })
        .collect()
}

// ── Collision resolution ─────────────────────────────────────────────────────

fn ram_player(session: &mut GameSession, enemy: &mut Enemy, rng: &mut impl Rng) {
    let body = enemy.bounds();
    enemy.marked_for_deletion = true;
    add_explosion(session, &body, rng);
    session.queue_sound(Sound::Hit);
    reset_shield(session);
    session.camera.shake(SHAKE_DURATION, SHAKE_MAGNITUDE);
    spawn_particles(session, &body, enemy.score, rng);

    if enemy.tag() == EnemyTag::Lucky {
        enter_power_up(session);
    } else {
        session.player.health = session.player.health.saturating_sub(1);
        session.stats.damage_taken += 1;
        debug!(health = session.player.health, kind = ?enemy.kind, "player rammed");
    }
}

/// Returns the drones to add when the kill was a hive whale.
fn destroy_enemy(session: &mut GameSession, enemy: &mut Enemy, rng: &mut impl Rng) -> Vec<Enemy> {
    let body = enemy.bounds();
    spawn_particles(session, &body, enemy.score, rng);
    enemy.marked_for_deletion = true;
    add_explosion(session, &body, rng);
    session.queue_sound(Sound::Explosion);
    session.stats.enemies_defeated += 1;
    session.score += enemy.score;

    match enemy.tag() {
        EnemyTag::Moon => {
            enter_power_up(session);
            Vec::new()
        }
        EnemyTag::Hive => {
            info!(x = body.x, y = body.y, "hive whale split");
            hive_drones(&body, rng)
        }
        _ => Vec::new(),
    }
}

/// Move every enemy present at the start of the call and resolve its
/// contacts with the player and the player's projectiles.
///
/// Drones released this frame are appended after the pass, so they first
/// move and collide on the next frame. Anything already marked for deletion
/// is out of play: a spent projectile cannot hit twice and a dead enemy
/// cannot be killed twice.
pub fn resolve_collisions(session: &mut GameSession, dt: f32, rng: &mut impl Rng) {
    let env = session.env();
    let player_box = session.player.bounds();
    let mut enemies = std::mem::take(&mut session.enemies);
    let mut projectiles = std::mem::take(&mut session.player.projectiles);
    let mut released = Vec::new();

    for enemy in enemies.iter_mut() {
        update_enemy(enemy, dt, &env);
        if !enemy.marked_for_deletion && collides(&player_box, &enemy.bounds()) {
            ram_player(session, enemy, rng);
        }

        for projectile in projectiles.iter_mut() {
            if enemy.marked_for_deletion {
                break;
            }
            if projectile.marked_for_deletion {
                continue;
            }
            if !collides(&projectile.bounds(), &enemy.bounds()) {
                continue;
            }
            enemy.lives -= 1;
            flash_enemy(enemy);
            projectile.marked_for_deletion = true;
            session.stats.projectiles_hit += 1;
            spawn_particles(session, &enemy.bounds(), 1, rng);
            if enemy.lives <= 0 {
                released.extend(destroy_enemy(session, enemy, rng));
            }
        }
    }

    enemies.extend(released);
    session.enemies = enemies;
    session.player.projectiles = projectiles;
}

/// End-of-frame removal of everything marked for deletion.
pub fn compact(session: &mut GameSession) {
    session.player.projectiles.retain(|p| !p.marked_for_deletion);
    session.enemies.retain(|e| !e.marked_for_deletion);
    session.particles.retain(|p| !p.marked_for_deletion);
    session.explosions.retain(|e| !e.marked_for_deletion);
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance a playthrough by one frame.
///
/// Returns the trigger that should end the run, if any: the player was
/// destroyed (checked before the frame and again after collisions) or the
/// clock ran past the time limit.
pub fn tick(session: &mut GameSession, dt: f32, rng: &mut impl Rng) -> Option<Trigger> {
    if session.player.health == 0 {
        return Some(Trigger::PlayerDestroyed);
    }

    let mut trigger = None;
    session.game_time += dt;
    if session.game_time > session.time_limit {
        trigger = Some(Trigger::TimeUp);
    }

    let env = session.env();
    update_background(&mut session.background, &env);
    update_player(session, dt);
    regen_ammo(session, dt);
    update_shield(&mut session.shield, dt);

    for particle in session.particles.iter_mut() {
        update_particle(particle, &env);
    }
    for explosion in session.explosions.iter_mut() {
        update_explosion(explosion, dt, &env);
    }

    resolve_collisions(session, dt, rng);
    compact(session);
    tick_spawner(session, dt, rng);

    if session.player.health == 0 {
        trigger = Some(Trigger::PlayerDestroyed);
    }
    trigger
}
