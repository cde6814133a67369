//! Territory capture detection and acceptance
//!
//! Runs once per tick after integration. Detects boundary exits, re-entries
//! and open-space loop closures, builds the capture polygon and applies the
//! acceptance policy. A rejected capture is a transient geometry fault: the
//! prior territory is preserved and the trail is cleared.

use tracing::{debug, warn};

use crate::game::constants::{territory, trail, victory_threshold};
use crate::game::geometry::{self, BoundaryHit};
use crate::game::state::{GameState, Player, PlayerId};
use crate::util::vec2::Vec2;

/// Events emitted by the capture phase
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Player left their territory and started a trail
    PlayerExited { player_id: PlayerId },
    /// Capture committed; `area` is the new absolute territory area
    TerritoryCaptured { player_id: PlayerId, area: f64 },
    /// Capture attempt failed validation; prior territory kept
    CaptureRejected { player_id: PlayerId },
    /// Victory threshold reached (latched)
    PlayerWon { player_id: PlayerId },
}

/// Run capture detection for every live player
pub fn update(state: &mut GameState) -> Vec<CaptureEvent> {
    let mut events = Vec::new();

    for id in state.player_ids() {
        let Some(player) = state.get_player_mut(&id) else {
            continue;
        };
        if player.is_dead {
            continue;
        }
        player.just_captured = false;

        let is_inside = geometry::point_in_polygon(player.position, &player.territory);

        if !player.is_outside && !is_inside && player.invulnerable_timer <= 0.0 {
            handle_exit(player);
            events.push(CaptureEvent::PlayerExited {
                player_id: id.clone(),
            });
        } else if player.is_outside && is_inside {
            if let Some(event) = handle_entry(player) {
                events.push(event);
            }
        } else if player.is_outside && !is_inside {
            if let Some(event) = handle_loop_closure(player) {
                events.push(event);
            }
        }

        // Victory latch: the winner stays inside and becomes untouchable
        if player.score as f64 >= victory_threshold() {
            if !player.has_won {
                events.push(CaptureEvent::PlayerWon {
                    player_id: id.clone(),
                });
            }
            player.has_won = true;
            player.clear_trail_state();
        }
    }

    events
}

/// Boundary exit: open a trail at the crossing point
fn handle_exit(player: &mut Player) {
    let hit =
        geometry::find_boundary_intersection(player.prev_position, player.position, &player.territory)
            .unwrap_or_else(|| {
                // Numerical jump past the boundary without a detectable
                // crossing; force-exit at the previous position
                debug!(player = %player.id, "exit without boundary crossing, forcing at prev");
                BoundaryHit {
                    point: player.prev_position,
                    edge_index: 0,
                }
            });

    player.is_outside = true;
    player.exit_point = Some(hit.point);
    player.exit_edge_index = hit.edge_index;
    player.trail.clear();
    player.trail.push(hit.point);
}

/// Boundary re-entry: close the trail into a capture
fn handle_entry(player: &mut Player) -> Option<CaptureEvent> {
    let hit =
        geometry::find_boundary_intersection(player.prev_position, player.position, &player.territory)
            .unwrap_or_else(|| {
                // Tunneled through the boundary in one step; synthesize the
                // hit at the current position on the nearest-vertex edge
                BoundaryHit {
                    point: player.position,
                    edge_index: geometry::nearest_vertex_index(player.position, &player.territory),
                }
            });

    // Debounce: a trail of one or two points is boundary jitter, not a loop
    let event = if player.trail.len() > trail::MIN_CAPTURE_POINTS {
        Some(attempt_capture(player, hit.point, hit.edge_index, false))
    } else {
        None
    };

    player.clear_trail_state();
    event
}

/// Loop closure in open space: the head returned near the exit point
fn handle_loop_closure(player: &mut Player) -> Option<CaptureEvent> {
    let exit_point = player.exit_point?;
    if player.trail.len() <= trail::MIN_LOOP_POINTS
        || player.position.distance_to(exit_point) >= trail::LOOP_CLOSE_DISTANCE
    {
        return None;
    }

    // Treated as an entry at the exit edge; the capture must strictly grow
    let event = attempt_capture(player, exit_point, player.exit_edge_index, true);
    player.clear_trail_state();
    Some(event)
}

/// Build and validate the capture polygon; commit on success.
///
/// `require_growth` demands strict area growth (open-space loop closures);
/// entry-based captures only require validity.
fn attempt_capture(
    player: &mut Player,
    entry_point: Vec2,
    entry_edge: usize,
    require_growth: bool,
) -> CaptureEvent {
    let Some(exit_point) = player.exit_point else {
        warn!(player = %player.id, "capture attempted without exit point");
        return CaptureEvent::CaptureRejected {
            player_id: player.id.clone(),
        };
    };

    let capture = geometry::compute_capture(
        &player.territory,
        &player.trail,
        exit_point,
        player.exit_edge_index,
        entry_point,
        entry_edge,
    );

    let mut new_territory = geometry::simplify_polygon(&capture, territory::SIMPLIFY_TOLERANCE);
    if new_territory.len() > territory::MAX_VERTICES {
        // Adaptive bound on geometry cost for the following ticks
        new_territory = geometry::simplify_polygon(&capture, territory::SIMPLIFY_TOLERANCE_COARSE);
    }
    let new_territory = geometry::ensure_clockwise(new_territory);

    let old_area = geometry::polygon_area(&player.territory);
    let area = geometry::polygon_area(&new_territory);
    let valid = geometry::polygon_is_finite(&new_territory)
        && new_territory.len() >= 4
        && area.is_finite()
        && area > territory::MIN_AREA
        && (!require_growth || area > old_area);

    if valid {
        player.territory = new_territory;
        player.score = area.floor() as u64;
        player.territory_changed = true;
        player.invulnerable_timer = territory::CAPTURE_GRACE;
        player.just_captured = true;
        CaptureEvent::TerritoryCaptured {
            player_id: player.id.clone(),
            area,
        }
    } else {
        warn!(
            player = %player.id,
            vertices = new_territory.len(),
            area,
            "capture rejected, keeping prior territory"
        );
        CaptureEvent::CaptureRejected {
            player_id: player.id.clone(),
        }
    }
}
