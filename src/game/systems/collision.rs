//! Trail collision detection
//!
//! Rebuilds the segment grid every tick from live trails and territory
//! edges, then tests each live player's movement segment against nearby
//! items. Crossing a foreign trail kills the trail's owner; crossing an old
//! segment of one's own trail kills the crosser. Territories are not solid.

use tracing::debug;

use crate::game::constants::trail;
use crate::game::geometry;
use crate::game::spatial::{SegmentGrid, SegmentItem, SegmentKind};
use crate::game::state::{GameState, PlayerId};

/// Events emitted by the collision phase
#[derive(Debug, Clone)]
pub enum CollisionEvent {
    /// `victim_id` died; `killer_id` is the crossing player (None for
    /// self-inflicted deaths)
    PlayerKilled {
        victim_id: PlayerId,
        killer_id: Option<PlayerId>,
    },
}

/// Run collision detection for every live player
pub fn update(state: &mut GameState, grid: &mut SegmentGrid) -> Vec<CollisionEvent> {
    let order = state.player_ids();
    rebuild_grid(state, grid, &order);

    // Kills are collected first and applied after the scan so every player
    // is judged against the same tick's trails
    let mut kills: Vec<(PlayerId, Option<PlayerId>)> = Vec::new();

    for (slot, id) in order.iter().enumerate() {
        let Some(player) = state.get_player(id) else {
            continue;
        };
        if player.is_dead
            || player.has_won
            || player.just_captured
            || player.invulnerable_timer > 0.0
        {
            continue;
        }

        let move_p1 = player.prev_position;
        let move_p2 = player.position;
        let head_index = player.trail.len().saturating_sub(1);
        let near_own_exit = player
            .exit_point
            .map(|e| player.position.distance_to(e) < trail::EXIT_GRACE_RADIUS)
            .unwrap_or(false);

        for item in grid.query(player.position) {
            if item.kind != SegmentKind::Trail {
                continue;
            }

            if item.owner as usize == slot {
                // Own trail: permit legitimate loop closures near the exit
                // point and ignore the segments attached to the body
                if !player.is_outside || near_own_exit {
                    continue;
                }
                if head_index < trail::SELF_HIT_MIN_AGE
                    || head_index - (item.index as usize) <= trail::SELF_HIT_MIN_AGE
                {
                    continue;
                }
                if geometry::segment_intersection(move_p1, move_p2, item.p1, item.p2).is_some() {
                    debug!(player = %id, "self trail crossing");
                    kills.push((id.clone(), None));
                    break;
                }
            } else if geometry::segment_intersection(move_p1, move_p2, item.p1, item.p2).is_some() {
                // Crossing a foreign trail kills its owner; keep scanning so
                // one movement segment can cut several trails
                let victim = order[item.owner as usize].clone();
                debug!(player = %id, victim = %victim, "foreign trail cut");
                kills.push((victim, Some(id.clone())));
            }
        }
    }

    let mut events = Vec::new();
    for (victim_id, killer_id) in kills {
        if let Some(victim) = state.get_player_mut(&victim_id) {
            if victim.is_dead || victim.has_won {
                continue;
            }
            victim.kill();
            events.push(CollisionEvent::PlayerKilled {
                victim_id,
                killer_id,
            });
        }
    }
    events
}

/// Re-index every live player's trail and territory segments with fresh
/// value records; `owner` is the player's slot in this tick's order.
fn rebuild_grid(state: &GameState, grid: &mut SegmentGrid, order: &[PlayerId]) {
    grid.clear();
    for (slot, id) in order.iter().enumerate() {
        let Some(player) = state.get_player(id) else {
            continue;
        };
        if player.is_dead {
            continue;
        }

        for (i, pair) in player.trail.windows(2).enumerate() {
            grid.insert(SegmentItem {
                owner: slot as u32,
                kind: SegmentKind::Trail,
                p1: pair[0],
                p2: pair[1],
                index: i as u32,
            });
        }

        let n = player.territory.len();
        for i in 0..n {
            grid.insert(SegmentItem {
                owner: slot as u32,
                kind: SegmentKind::Territory,
                p1: player.territory[i],
                p2: player.territory[(i + 1) % n],
                index: 0,
            });
        }
    }
}
