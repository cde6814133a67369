//! Player integration: steering, advancement, arena clamping, trail growth

use crate::game::constants::{movement, trail, world};
use crate::game::state::{GameState, ARENA_CENTER};
use crate::util::vec2::Vec2;

/// Normalize an angle to (-pi, pi]
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}

/// Advance every player by one timestep.
///
/// Dead players only accumulate their death timer. The heading chase is a
/// frame-rate-independent lerp along the shortest angular path.
pub fn update(state: &mut GameState, dt: f64) {
    for id in state.player_ids() {
        let Some(player) = state.get_player_mut(&id) else {
            continue;
        };

        if player.is_dead {
            player.death_timer += dt;
            continue;
        }

        player.angle = normalize_angle(player.angle);
        let angle_diff = normalize_angle(player.target_angle - player.angle);
        player.angle += angle_diff * movement::TURN_SPEED * dt;

        player.prev_position = player.position;
        player.position += Vec2::from_angle(player.angle) * (player.speed * dt);

        // Clamp to the arena along the outward direction
        let offset = player.position - ARENA_CENTER;
        let limit = world::ARENA_RADIUS - world::BOUNDARY_MARGIN;
        if offset.length() > limit {
            player.position = ARENA_CENTER + offset.normalize() * limit;
        }

        // Trail points accumulate with minimum spacing; the exit point itself
        // is always the first entry
        if player.is_outside {
            let should_append = player
                .trail
                .last()
                .map(|last| player.position.distance_to(*last) >= trail::POINT_DISTANCE)
                .unwrap_or(true);
            if should_append {
                player.trail.push(player.position);
            }
        }

        if player.invulnerable_timer > 0.0 {
            player.invulnerable_timer = (player.invulnerable_timer - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::sim::DT;
    use std::f64::consts::PI;

    fn state_with_player(id: &str) -> GameState {
        let mut state = GameState::new();
        state.create_player(
            id.to_string(),
            id.to_string(),
            "#FF6B6B".to_string(),
            ARENA_CENTER,
        );
        state
    }

    #[test]
    fn test_normalize_angle_range() {
        for raw in [-10.0, -PI, -1.0, 0.0, 1.0, PI, 10.0, 100.0] {
            let n = normalize_angle(raw);
            assert!(n > -PI - 1e-9 && n <= PI + 1e-9, "angle {} -> {}", raw, n);
        }
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-9);
    }

    #[test]
    fn test_static_without_input() {
        let mut state = state_with_player("p1");
        for _ in 0..30 {
            update(&mut state, DT);
        }
        let p = state.get_player("p1").unwrap();
        assert!(p.position.approx_eq(ARENA_CENTER, 1e-9));
    }

    #[test]
    fn test_moves_after_input() {
        let mut state = state_with_player("p1");
        state.set_input("p1", 0.0);
        update(&mut state, DT);

        let p = state.get_player("p1").unwrap();
        assert!(p.position.x > ARENA_CENTER.x);
        let expected = movement::PLAYER_SPEED * DT;
        assert!((p.position.x - ARENA_CENTER.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_prev_position_tracks_last_tick() {
        let mut state = state_with_player("p1");
        state.set_input("p1", 0.0);
        update(&mut state, DT);
        let after_one = state.get_player("p1").unwrap().position;
        update(&mut state, DT);
        let p = state.get_player("p1").unwrap();
        assert!(p.prev_position.approx_eq(after_one, 1e-12));
    }

    #[test]
    fn test_turns_toward_target() {
        let mut state = state_with_player("p1");
        state.set_input("p1", PI / 2.0);
        update(&mut state, DT);
        let p = state.get_player("p1").unwrap();
        assert!(p.angle > 0.0);
        assert!(p.angle < PI / 2.0);

        for _ in 0..120 {
            update(&mut state, DT);
        }
        let p = state.get_player("p1").unwrap();
        assert!((p.angle - PI / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_turn_takes_shortest_path() {
        let mut state = state_with_player("p1");
        {
            let p = state.get_player_mut("p1").unwrap();
            p.angle = 3.0;
            p.target_angle = -3.0; // shortest path crosses pi, not zero
            p.speed = movement::PLAYER_SPEED;
        }
        update(&mut state, DT);
        let p = state.get_player("p1").unwrap();
        // Heading moved up through pi (wrapping), not down toward zero
        assert!(p.angle > 3.0 || p.angle < -3.0);
    }

    #[test]
    fn test_arena_clamp() {
        let mut state = state_with_player("p1");
        {
            let p = state.get_player_mut("p1").unwrap();
            p.position = ARENA_CENTER + Vec2::new(world::ARENA_RADIUS - 2.0, 0.0);
            p.angle = 0.0;
            p.target_angle = 0.0;
            p.speed = movement::PLAYER_SPEED;
        }
        for _ in 0..10 {
            update(&mut state, DT);
        }
        let p = state.get_player("p1").unwrap();
        let dist = p.position.distance_to(ARENA_CENTER);
        assert!(dist <= world::ARENA_RADIUS - world::BOUNDARY_MARGIN + 1e-6);
    }

    #[test]
    fn test_trail_growth_spacing() {
        let mut state = state_with_player("p1");
        {
            let p = state.get_player_mut("p1").unwrap();
            p.is_outside = true;
            p.exit_point = Some(p.position);
            p.trail = vec![p.position];
            p.target_angle = 0.0;
            p.speed = movement::PLAYER_SPEED;
        }
        // One tick moves ~8.3 units: below spacing, no new point
        update(&mut state, DT);
        assert_eq!(state.get_player("p1").unwrap().trail.len(), 1);

        // A second tick crosses the spacing threshold
        update(&mut state, DT);
        let p = state.get_player("p1").unwrap();
        assert_eq!(p.trail.len(), 2);
        let spacing = p.trail[1].distance_to(p.trail[0]);
        assert!(spacing >= trail::POINT_DISTANCE);
    }

    #[test]
    fn test_no_trail_growth_inside() {
        let mut state = state_with_player("p1");
        state.set_input("p1", 0.0);
        for _ in 0..10 {
            update(&mut state, DT);
        }
        assert!(state.get_player("p1").unwrap().trail.is_empty());
    }

    #[test]
    fn test_dead_player_only_ages() {
        let mut state = state_with_player("p1");
        {
            let p = state.get_player_mut("p1").unwrap();
            p.speed = movement::PLAYER_SPEED;
            p.kill();
        }
        let before = state.get_player("p1").unwrap().position;
        update(&mut state, DT);
        let p = state.get_player("p1").unwrap();
        assert_eq!(p.position, before);
        assert!((p.death_timer - DT).abs() < 1e-12);
    }

    #[test]
    fn test_invulnerability_decays() {
        let mut state = state_with_player("p1");
        state.get_player_mut("p1").unwrap().invulnerable_timer = 0.5;
        for _ in 0..60 {
            update(&mut state, DT);
        }
        assert_eq!(state.get_player("p1").unwrap().invulnerable_timer, 0.0);
    }
}
