//! Authoritative state to network-state projection
//!
//! Converts player records to the flat numeric wire view. Territory arrays
//! are only re-encoded when their flat length changed or the capture engine
//! set the one-shot change hint; trail arrays re-encode whenever their
//! length changed, which is most ticks while a player is outside. The
//! transport diffs these snapshots against its own per-client baselines.

use hashbrown::HashMap;

use crate::game::state::{GameState, PlayerId};
use crate::net::protocol::{GameRoomState, PlayerState};
use crate::util::vec2::Vec2;

#[derive(Debug, Default)]
struct PlayerBaseline {
    territory_flat: Vec<f64>,
    trail_len: usize,
}

/// Per-room projector holding the previously encoded flat arrays
#[derive(Debug, Default)]
pub struct StateProjector {
    baselines: HashMap<PlayerId, PlayerBaseline>,
}

impl StateProjector {
    pub fn new() -> Self {
        Self {
            baselines: HashMap::new(),
        }
    }

    /// Project the current world into an outbound snapshot, clearing each
    /// player's territory-change hint along the way.
    pub fn project(&mut self, state: &mut GameState) -> GameRoomState {
        let order = state.player_ids();
        let mut players = Vec::with_capacity(order.len());

        for id in &order {
            let Some(player) = state.get_player_mut(id) else {
                continue;
            };
            let baseline = self.baselines.entry(id.clone()).or_default();

            let territory_resync = baseline.territory_flat.len() != 2 * player.territory.len()
                || player.territory_changed;
            if territory_resync {
                baseline.territory_flat = flatten(&player.territory);
                player.territory_changed = false;
            }

            let trail_resync = baseline.trail_len != player.trail.len();
            baseline.trail_len = player.trail.len();

            players.push(PlayerState {
                id: player.id.clone(),
                name: player.name.clone(),
                color: player.color.clone(),
                x: player.position.x,
                y: player.position.y,
                angle: player.angle,
                is_dead: player.is_dead,
                has_won: player.has_won,
                score: player.score,
                territory: baseline.territory_flat.clone(),
                trail: flatten(&player.trail),
                territory_resync,
                trail_resync,
            });
        }

        // Drop baselines of players that left the room
        self.baselines.retain(|id, _| order.contains(id));

        GameRoomState {
            tick: state.tick,
            players,
        }
    }
}

/// `[p0, p1, ...]` to `[x0, y0, x1, y1, ...]`
fn flatten(points: &[Vec2]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(points.len() * 2);
    for p in points {
        flat.push(p.x);
        flat.push(p.y);
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::ARENA_CENTER;

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
    fn test_first_projection_resyncs_territory() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();

        let snapshot = projector.project(&mut state);

        assert_eq!(snapshot.players.len(), 1);
        let p = &snapshot.players[0];
        assert!(p.territory_resync);
        assert_eq!(
            p.territory.len(),
            2 * state.get_player("p1").unwrap().territory.len()
        );
        // Hint consumed
        assert!(!state.get_player("p1").unwrap().territory_changed);
    }

    #[test]
    fn test_unchanged_territory_not_resynced() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();

        projector.project(&mut state);
        let snapshot = projector.project(&mut state);

        assert!(!snapshot.players[0].territory_resync);
    }

    #[test]
    fn test_change_hint_forces_resync() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();
        projector.project(&mut state);

        // Same vertex count, but the hint is set
        state.get_player_mut("p1").unwrap().territory_changed = true;
        let snapshot = projector.project(&mut state);

        assert!(snapshot.players[0].territory_resync);
    }

    #[test]
    fn test_length_change_forces_resync() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();
        projector.project(&mut state);

        state
            .get_player_mut("p1")
            .unwrap()
            .territory
            .push(Vec2::new(2600.0, 2500.0));
        let snapshot = projector.project(&mut state);

        assert!(snapshot.players[0].territory_resync);
    }

    #[test]
    fn test_trail_resync_tracks_length() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();
        projector.project(&mut state);

        {
            let p = state.get_player_mut("p1").unwrap();
            p.trail.push(Vec2::new(2600.0, 2500.0));
        }
        let snapshot = projector.project(&mut state);
        assert!(snapshot.players[0].trail_resync);
        assert_eq!(snapshot.players[0].trail, vec![2600.0, 2500.0]);

        let snapshot = projector.project(&mut state);
        assert!(!snapshot.players[0].trail_resync);
    }

    #[test]
    fn test_projection_order_is_insertion_order() {
        let mut state = GameState::new();
        for id in ["z", "a", "m"] {
            state.create_player(id.to_string(), id.to_string(), "#fff".to_string(), ARENA_CENTER);
        }
        let mut projector = StateProjector::new();

        let snapshot = projector.project(&mut state);
        let ids: Vec<_> = snapshot.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_removed_player_baseline_dropped() {
        let mut state = state_with_player("p1");
        let mut projector = StateProjector::new();
        projector.project(&mut state);
        assert_eq!(projector.baselines.len(), 1);

        state.remove_player("p1");
        projector.project(&mut state);
        assert!(projector.baselines.is_empty());
    }

    #[test]
    fn test_dead_player_still_projected() {
        let mut state = state_with_player("p1");
        state.get_player_mut("p1").unwrap().kill();
        let mut projector = StateProjector::new();

        let snapshot = projector.project(&mut state);
        assert!(snapshot.players[0].is_dead);
        assert!(snapshot.players[0].trail.is_empty());
    }
}
