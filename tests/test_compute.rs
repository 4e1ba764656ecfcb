use knotz_brigade::audio::Sound;
use knotz_brigade::compute::*;
use knotz_brigade::config::GameConfig;
use knotz_brigade::entities::*;
use knotz_brigade::state::Trigger;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_session() -> GameSession {
    GameSession::new(&GameConfig::default())
}

/// An enemy of `kind` overlapping the player's default box at (20, 100).
fn rammer(kind: EnemyKind, rng: &mut StdRng) -> Enemy {
    Enemy::at(kind, 50.0, 150.0, rng)
}

/// An enemy of `kind` well clear of the player, with a single life left.
fn target(kind: EnemyKind, rng: &mut StdRng) -> Enemy {
    let mut e = Enemy::at(kind, 500.0, 0.0, rng);
    e.lives = 1;
    e
}

// ── Collision ─────────────────────────────────────────────────────────────────

#[test]
fn overlap_is_symmetric() {
    let rects = [
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Rect::new(5.0, 5.0, 10.0, 10.0),
        Rect::new(10.0, 0.0, 10.0, 10.0),
        Rect::new(-3.0, 8.0, 4.0, 40.0),
        Rect::new(100.0, 100.0, 1.0, 1.0),
    ];
    for a in &rects {
        for b in &rects {
            assert_eq!(collides(a, b), collides(b, a), "{a:?} {b:?}");
        }
    }
}

#[test]
fn touching_edges_do_not_collide() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!collides(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
    assert!(!collides(&a, &Rect::new(0.0, 10.0, 10.0, 10.0)));
    assert!(!collides(&a, &Rect::new(-10.0, 0.0, 10.0, 10.0)));
    assert!(collides(&a, &Rect::new(9.5, 9.5, 10.0, 10.0)));
}

// ── Spawning ──────────────────────────────────────────────────────────────────

#[test]
fn spawn_ladder_boundaries() {
    let cases = [
        (0.0, EnemyKind::Angler1),
        (0.09, EnemyKind::Angler1),
        (0.1, EnemyKind::Stalker),
        (0.29, EnemyKind::Stalker),
        (0.3, EnemyKind::Razorfin),
        (0.5, EnemyKind::Angler2),
        (0.6, EnemyKind::HiveWhale),
        (0.7, EnemyKind::BulbWhale),
        (0.8, EnemyKind::MoonFish),
        (0.9, EnemyKind::LuckyFish),
        (0.999, EnemyKind::LuckyFish),
    ];
    for (roll, kind) in cases {
        assert_eq!(pick_enemy_kind(roll), kind, "roll {roll}");
    }
}

#[test]
fn drones_never_come_from_the_ladder() {
    let mut roll = 0.0;
    while roll < 1.0 {
        assert_ne!(pick_enemy_kind(roll), EnemyKind::Drone);
        roll += 0.001;
    }
}

#[test]
fn spawner_fires_after_interval() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    tick_spawner(&mut s, 1000.0, &mut rng);
    tick_spawner(&mut s, 1000.0, &mut rng);
    assert!(s.enemies.is_empty());
    tick_spawner(&mut s, 1000.0, &mut rng);
    assert_relative_eq!(s.enemy_timer, 3000.0);
    tick_spawner(&mut s, 16.0, &mut rng);
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.enemy_timer, 0.0);
    assert_eq!(s.enemies[0].x, s.width);
}

#[test]
fn hive_drones_land_on_upper_half_of_whale() {
    let mut rng = seeded_rng();
    let whale = Rect::new(300.0, 40.0, 400.0, 227.0);
    let drones = hive_drones(&whale, &mut rng);
    assert_eq!(drones.len(), HIVE_DRONES);
    for d in &drones {
        assert_eq!(d.kind, EnemyKind::Drone);
        assert!(d.x >= whale.x && d.x <= whale.x + whale.w);
        assert!(d.y >= whale.y && d.y <= whale.y + whale.h * 0.5);
    }
}

// ── Ammo ──────────────────────────────────────────────────────────────────────

#[test]
fn ammo_regenerates_one_per_interval() {
    let mut s = make_session();
    for _ in 0..4 {
        regen_ammo(&mut s, 100.0);
    }
    assert_relative_eq!(s.ammo, 20.0);
    regen_ammo(&mut s, 100.0);
    assert_relative_eq!(s.ammo, 21.0);
    assert_eq!(s.ammo_timer, 0.0);
}

#[test]
fn ammo_regen_is_capped_at_max() {
    let mut s = make_session();
    s.ammo = 49.0;
    for _ in 0..100 {
        regen_ammo(&mut s, 100.0);
    }
    assert_relative_eq!(s.ammo, 50.0);
}

#[test]
fn no_interval_regen_while_powered_up() {
    let mut s = make_session();
    s.player.power_up = true;
    s.ammo_timer = 1000.0;
    regen_ammo(&mut s, 100.0);
    assert_relative_eq!(s.ammo, 20.0);
    assert_relative_eq!(s.ammo_timer, 1000.0);
}

#[test]
fn power_up_trickle_never_exceeds_max() {
    let mut s = make_session();
    s.player.power_up = true;
    s.ammo = 49.95;
    update_player(&mut s, 16.0);
    assert_relative_eq!(s.ammo, 50.0);
    update_player(&mut s, 16.0);
    assert_relative_eq!(s.ammo, 50.0);
    assert_eq!(s.player.frame_y, 1);
}

#[test]
fn power_up_expires_after_limit() {
    let mut s = make_session();
    s.player.power_up = true;
    s.player.power_up_timer = s.player.power_up_limit + 1.0;
    update_player(&mut s, 16.0);
    assert!(!s.player.power_up);
    assert_eq!(s.player.frame_y, 0);
    assert_eq!(s.sounds, vec![Sound::PowerDown]);
}

// ── Player ────────────────────────────────────────────────────────────────────

#[test]
fn player_is_clamped_half_off_screen() {
    let mut s = make_session();
    s.movement = knotz_brigade::input::Movement::Up;
    for _ in 0..500 {
        update_player(&mut s, 16.0);
    }
    assert_relative_eq!(s.player.y, -s.player.height * 0.5);

    s.movement = knotz_brigade::input::Movement::Down;
    for _ in 0..500 {
        update_player(&mut s, 16.0);
    }
    assert_relative_eq!(s.player.y, s.height - s.player.height * 0.5);
}

#[test]
fn shoot_spends_one_round() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    shoot(&mut s, &mut rng);
    assert_relative_eq!(s.ammo, 19.0);
    assert_eq!(s.player.projectiles.len(), 1);
    assert_eq!(s.stats.projectiles_fired, 1);
    assert_relative_eq!(s.player.recoil, -5.0);
    assert_eq!(s.sounds, vec![Sound::Shot]);

    let p = &s.player.projectiles[0];
    assert_relative_eq!(p.x, s.player.x + 80.0);
    assert_relative_eq!(p.y, s.player.y + 30.0);
}

#[test]
fn empty_magazine_still_clicks() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.ammo = 0.0;
    shoot(&mut s, &mut rng);
    assert!(s.player.projectiles.is_empty());
    assert_eq!(s.stats.projectiles_fired, 0);
    assert_eq!(s.ammo, 0.0);
    assert_eq!(s.sounds, vec![Sound::Shot]);
}

#[test]
fn powered_up_fires_both_muzzles_for_one_round() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.player.power_up = true;
    shoot(&mut s, &mut rng);
    assert_eq!(s.player.projectiles.len(), 2);
    assert_relative_eq!(s.ammo, 19.0);
    assert_eq!(s.stats.projectiles_fired, 1);
    assert_relative_eq!(s.player.projectiles[1].y, s.player.y + 175.0);
}

#[test]
fn last_round_skips_bottom_muzzle() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.player.power_up = true;
    s.ammo = 1.0;
    shoot(&mut s, &mut rng);
    assert_eq!(s.player.projectiles.len(), 1);
    assert_eq!(s.ammo, 0.0);
}

// ── Short-lived entities ──────────────────────────────────────────────────────

#[test]
fn projectile_expires_past_eighty_percent() {
    let mut rng = seeded_rng();
    let env = make_session().env();
    let mut near = Projectile::new(700.0, 0.0, &mut rng);
    let mut far = Projectile::new(799.0, 0.0, &mut rng);
    update_projectile(&mut near, 16.0, &env);
    update_projectile(&mut far, 16.0, &env);
    assert!(!near.marked_for_deletion);
    assert!(far.marked_for_deletion);
}

#[test]
fn particle_bounces_at_most_five_times() {
    let mut rng = seeded_rng();
    let env = make_session().env();
    for _ in 0..20 {
        let mut p = Particle::new(500.0, 250.0, &mut rng);
        for _ in 0..1000 {
            update_particle(&mut p, &env);
            assert!(p.bounced <= PARTICLE_MAX_BOUNCES);
        }
        assert_eq!(p.bounced, PARTICLE_MAX_BOUNCES);
        assert!(p.marked_for_deletion);
    }
}

#[test]
fn explosion_deletes_itself_after_last_frame() {
    let env = make_session().env();
    let mut e = Explosion::new(ExplosionKind::Smoke, 400.0, 200.0);
    update_explosion(&mut e, 16.0, &env);
    assert!(!e.marked_for_deletion);
    assert_relative_eq!(e.x, 299.0);

    let mut updates = 1;
    while !e.marked_for_deletion && updates < 500 {
        update_explosion(&mut e, 16.0, &env);
        updates += 1;
    }
    assert!(e.marked_for_deletion);
    assert_eq!(e.anim.frame, e.anim.max_frame + 1);
}

#[test]
fn hit_flash_clears_after_interval() {
    let mut rng = seeded_rng();
    let env = make_session().env();
    let mut e = Enemy::at(EnemyKind::Angler1, 500.0, 0.0, &mut rng);
    flash_enemy(&mut e);
    update_enemy(&mut e, 60.0, &env);
    assert!(e.is_flashing);
    update_enemy(&mut e, 60.0, &env);
    assert!(!e.is_flashing);
}

// ── Collision resolution ──────────────────────────────────────────────────────

#[test]
fn hive_whale_splits_into_drones_next_frame() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(target(EnemyKind::HiveWhale, &mut rng));
    s.player.projectiles.push(Projectile::new(600.0, 50.0, &mut rng));
    s.player.projectiles.push(Projectile::new(600.0, 50.0, &mut rng));

    resolve_collisions(&mut s, 16.0, &mut rng);

    assert!(s.enemies[0].marked_for_deletion);
    assert_eq!(s.enemies.len(), 1 + HIVE_DRONES);
    for drone in &s.enemies[1..] {
        assert_eq!(drone.kind, EnemyKind::Drone);
        assert_eq!(drone.lives, 3);
        assert!(!drone.is_flashing);
    }
    // The second shot overlapped the drones too but they sit out this frame.
    assert!(s.player.projectiles[0].marked_for_deletion);
    assert!(!s.player.projectiles[1].marked_for_deletion);

    assert_eq!(s.score, 20);
    assert_eq!(s.explosions.len(), 1);
    assert_eq!(s.particles.len(), 1 + 20);
    assert_eq!(s.stats.enemies_defeated, 1);
    assert_eq!(s.stats.projectiles_hit, 1);
    assert!(s.sounds.contains(&Sound::Explosion));

    compact(&mut s);
    assert_eq!(s.enemies.len(), HIVE_DRONES);
    assert_eq!(s.player.projectiles.len(), 1);
}

#[test]
fn dead_enemy_is_not_killed_twice() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(target(EnemyKind::Angler1, &mut rng));
    for _ in 0..3 {
        s.player.projectiles.push(Projectile::new(600.0, 50.0, &mut rng));
    }
    resolve_collisions(&mut s, 16.0, &mut rng);
    assert_eq!(s.score, 5);
    assert_eq!(s.stats.enemies_defeated, 1);
    assert_eq!(
        s.player
            .projectiles
            .iter()
            .filter(|p| p.marked_for_deletion)
            .count(),
        1
    );
}

#[test]
fn surviving_enemy_flashes_and_loses_a_life() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(Enemy::at(EnemyKind::Angler2, 500.0, 0.0, &mut rng));
    s.player.projectiles.push(Projectile::new(600.0, 50.0, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);
    assert_eq!(s.enemies[0].lives, 5);
    assert!(s.enemies[0].is_flashing);
    assert!(!s.enemies[0].marked_for_deletion);
    assert_eq!(s.particles.len(), 1);
    assert_eq!(s.score, 0);
}

#[test]
fn moon_fish_kill_grants_power_up() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(target(EnemyKind::MoonFish, &mut rng));
    s.player.projectiles.push(Projectile::new(600.0, 50.0, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);
    assert_eq!(s.score, 8);
    assert!(s.player.power_up);
    assert_relative_eq!(s.ammo, s.max_ammo);
    assert_eq!(s.stats.power_ups_collected, 1);
}

#[test]
fn lucky_fish_contact_is_a_power_up() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(rammer(EnemyKind::LuckyFish, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);

    assert_eq!(s.player.health, 20);
    assert!(s.player.power_up);
    assert_eq!(s.stats.power_ups_collected, 1);
    assert_eq!(s.stats.damage_taken, 0);
    assert_eq!(s.score, 0);
    assert_eq!(s.particles.len(), 15);
    assert!(s.enemies[0].marked_for_deletion);
    assert!(s.sounds.contains(&Sound::PowerUp));
    assert!(s.sounds.contains(&Sound::Hit));
}

#[test]
fn ordinary_contact_costs_health() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.shield.anim.frame = 20;
    s.enemies.push(rammer(EnemyKind::Angler1, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);

    assert_eq!(s.player.health, 19);
    assert_eq!(s.stats.damage_taken, 1);
    assert_eq!(s.score, 0);
    assert_eq!(s.explosions.len(), 1);
    assert_eq!(s.particles.len(), 5);
    assert_eq!(s.shield.anim.frame, 0);
    assert_relative_eq!(s.camera.shake_duration, SHAKE_DURATION);
    assert_relative_eq!(s.camera.shake_magnitude, SHAKE_MAGNITUDE);
    assert_eq!(s.sounds, vec![Sound::Hit, Sound::Shield]);
}

#[test]
fn health_saturates_at_zero() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.player.health = 0;
    s.enemies.push(rammer(EnemyKind::Razorfin, &mut rng));
    s.enemies.push(rammer(EnemyKind::Stalker, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);
    assert_eq!(s.player.health, 0);
    assert_eq!(s.stats.damage_taken, 2);
}

#[test]
fn escaped_enemy_scores_nothing() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.enemies.push(Enemy::at(EnemyKind::Angler1, -228.0, 0.0, &mut rng));
    resolve_collisions(&mut s, 16.0, &mut rng);
    assert!(s.enemies[0].marked_for_deletion);
    assert!(s.explosions.is_empty());
    compact(&mut s);
    assert!(s.enemies.is_empty());
    assert_eq!(s.score, 0);
}

#[test]
fn compact_removes_only_marked() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    for i in 0..4 {
        let mut p = Particle::new(0.0, 0.0, &mut rng);
        p.marked_for_deletion = i % 2 == 0;
        s.particles.push(p);
        let mut e = Explosion::new(ExplosionKind::Fire, 0.0, 0.0);
        e.marked_for_deletion = i == 3;
        s.explosions.push(e);
    }
    compact(&mut s);
    assert_eq!(s.particles.len(), 2);
    assert_eq!(s.explosions.len(), 3);
}

// ── Frame tick ────────────────────────────────────────────────────────────────

#[test]
fn tick_reports_destruction_on_the_fatal_frame() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.player.health = 1;
    s.enemies.push(rammer(EnemyKind::Angler1, &mut rng));
    assert_eq!(tick(&mut s, 16.0, &mut rng), Some(Trigger::PlayerDestroyed));
    assert_eq!(s.player.health, 0);
}

#[test]
fn tick_with_dead_player_does_nothing() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.player.health = 0;
    assert_eq!(tick(&mut s, 16.0, &mut rng), Some(Trigger::PlayerDestroyed));
    assert_eq!(s.game_time, 0.0);
}

#[test]
fn tick_reports_time_up_past_limit() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    s.game_time = s.time_limit - 10.0;
    assert_eq!(tick(&mut s, 5.0, &mut rng), None);
    assert_eq!(tick(&mut s, 16.0, &mut rng), Some(Trigger::TimeUp));
}

#[test]
fn tick_compacts_and_spawns() {
    let mut rng = seeded_rng();
    let mut s = make_session();
    let mut dead = Projectile::new(100.0, 0.0, &mut rng);
    dead.marked_for_deletion = true;
    s.player.projectiles.push(dead);
    s.enemy_timer = s.enemy_interval + 1.0;

    tick(&mut s, 16.0, &mut rng);
    assert!(s.player.projectiles.is_empty());
    assert_eq!(s.enemies.len(), 1);
}

// ── Camera & background ───────────────────────────────────────────────────────

#[test]
fn camera_shake_decays_to_rest() {
    let mut rng = seeded_rng();
    let mut camera = Camera::default();
    camera.shake(SHAKE_DURATION, SHAKE_MAGNITUDE);
    update_camera(&mut camera, 16.0, &mut rng);
    assert!(camera.x.abs() <= SHAKE_MAGNITUDE * 0.5);
    assert!(camera.y.abs() <= SHAKE_MAGNITUDE * 0.5);
    for _ in 0..20 {
        update_camera(&mut camera, 16.0, &mut rng);
    }
    assert_eq!((camera.x, camera.y), (0.0, 0.0));
}

#[test]
fn layer_wraps_after_one_width() {
    let env = make_session().env();
    let mut layer = Layer::new(2, 2.0);
    update_layer(&mut layer, &env);
    assert_relative_eq!(layer.x, -2.0);
    layer.x = -layer.width;
    update_layer(&mut layer, &env);
    assert_relative_eq!(layer.x, -2.0);
}
