//! Game state definitions and structures
//!
//! Contains the player records and the per-room world that owns them.
//! Player iteration always follows insertion order so collision arbitration
//! and state projection stay reproducible.

use hashbrown::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::game::constants::{movement, spawn, territory, world};
use crate::game::geometry;
use crate::util::vec2::Vec2;

/// Opaque stable player identifier; bot ids carry the `BOT_` prefix
pub type PlayerId = String;

/// Center of the circular arena
pub const ARENA_CENTER: Vec2 = Vec2 {
    x: world::ARENA_CENTER_X,
    y: world::ARENA_CENTER_Y,
};

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique player identifier
    pub id: PlayerId,
    /// Display name (not interpreted by the core)
    pub name: String,
    /// Display color token (not interpreted by the core)
    pub color: String,

    /// Position in world coordinates
    pub position: Vec2,
    /// Position at the end of the previous tick
    pub prev_position: Vec2,
    /// Current heading in radians, normalized to (-pi, pi]
    pub angle: f64,
    /// Desired heading set by input
    pub target_angle: f64,
    /// Scalar velocity; zero until the first input arrives
    pub speed: f64,

    /// Owned closed polygon, clockwise winding, at least 3 vertices
    pub territory: Vec<Vec2>,
    /// Points left behind while outside the territory
    pub trail: Vec<Vec2>,
    /// True while the player is drawing a trail
    pub is_outside: bool,
    /// Where the current trail began on the territory boundary
    pub exit_point: Option<Vec2>,
    /// Boundary edge index of the exit crossing
    pub exit_edge_index: usize,

    /// Terminal within a life; stops all updates except the death timer
    pub is_dead: bool,
    /// Seconds since death
    pub death_timer: f64,
    /// Grace seconds left after a successful capture
    pub invulnerable_timer: f64,
    /// Latched once the territory covers the victory share of the arena
    pub has_won: bool,
    /// Integer absolute area of the current territory
    pub score: u64,
    /// One-shot hint for the projection layer
    pub territory_changed: bool,
    /// Set for the tick a capture committed; collision checks are skipped
    #[serde(skip)]
    pub just_captured: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, color: String, position: Vec2) -> Self {
        let seed = seed_territory(position);
        let score = geometry::polygon_area(&seed).floor() as u64;
        Self {
            id,
            name,
            color,
            position,
            prev_position: position,
            angle: 0.0,
            target_angle: 0.0,
            speed: 0.0,
            territory: seed,
            trail: Vec::new(),
            is_outside: false,
            exit_point: None,
            exit_edge_index: 0,
            is_dead: false,
            death_timer: 0.0,
            invulnerable_timer: 0.0,
            has_won: false,
            score,
            territory_changed: true,
            just_captured: false,
        }
    }

    #[inline]
    pub fn is_bot(&self) -> bool {
        self.id.starts_with(crate::game::constants::bot::ID_PREFIX)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Reset all trail bookkeeping; the player is back inside
    pub fn clear_trail_state(&mut self) {
        self.trail.clear();
        self.is_outside = false;
        self.exit_point = None;
        self.exit_edge_index = 0;
    }

    /// Mark the player dead
    pub fn kill(&mut self) {
        self.is_dead = true;
        self.death_timer = 0.0;
        self.clear_trail_state();
    }
}

/// Regular polygon seeded around a spawn point, clockwise winding
pub fn seed_territory(center: Vec2) -> Vec<Vec2> {
    let n = territory::SEED_VERTICES;
    (0..n)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / n as f64;
            center + Vec2::from_angle(angle) * territory::SEED_RADIUS
        })
        .collect()
}

/// Per-room world owning all players
pub struct GameState {
    players: HashMap<PlayerId, Player>,
    /// Insertion order of player ids; drives every iteration
    order: Vec<PlayerId>,
    /// Tick counter
    pub tick: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            order: Vec::new(),
            tick: 0,
        }
    }

    /// Create a player with a seed territory at the given spawn point
    pub fn create_player(
        &mut self,
        id: PlayerId,
        name: String,
        color: String,
        position: Vec2,
    ) -> &Player {
        if !self.players.contains_key(&id) {
            self.order.push(id.clone());
        }
        let player = Player::new(id.clone(), name, color, position);
        self.players.insert(id.clone(), player);
        &self.players[&id]
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            self.order.retain(|o| o != id);
        }
        removed
    }

    /// Set a player's desired heading. Unknown and dead players are ignored;
    /// the first input starts the player moving.
    pub fn set_input(&mut self, id: &str, target_angle: f64) {
        if !target_angle.is_finite() {
            return;
        }
        if let Some(player) = self.players.get_mut(id) {
            if player.is_dead {
                return;
            }
            player.target_angle = target_angle;
            if player.speed == 0.0 {
                player.speed = movement::PLAYER_SPEED;
            }
        }
    }

    pub fn get_player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Player ids in insertion order
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.order.clone()
    }

    /// Players in insertion order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn human_count(&self) -> usize {
        self.players().filter(|p| !p.is_bot()).count()
    }

    pub fn bot_count(&self) -> usize {
        self.players().filter(|p| p.is_bot()).count()
    }

    pub fn alive_count(&self) -> usize {
        self.players().filter(|p| p.is_alive()).count()
    }

    /// Pick a spawn point uniformly inside the arena, keeping clear of live
    /// territories. Falls back to relaxed placement, then the arena center.
    pub fn find_spawn_position(&self) -> Vec2 {
        let mut rng = rand::thread_rng();
        let clearance = territory::SEED_RADIUS + spawn::TERRITORY_CLEARANCE;

        for _ in 0..spawn::MAX_ATTEMPTS {
            let candidate = random_arena_point(&mut rng);
            if self.spawn_is_clear(candidate, clearance) {
                return candidate;
            }
        }

        // Relaxed pass: accept anything not inside a live territory
        for _ in 0..spawn::MAX_ATTEMPTS {
            let candidate = random_arena_point(&mut rng);
            if !self.inside_any_live_territory(candidate) {
                return candidate;
            }
        }

        warn!("no clear spawn position found, using arena center");
        ARENA_CENTER
    }

    fn spawn_is_clear(&self, candidate: Vec2, clearance: f64) -> bool {
        let clearance_sq = clearance * clearance;
        let min_player_dist_sq = spawn::MIN_DISTANCE * spawn::MIN_DISTANCE;
        for player in self.players().filter(|p| p.is_alive()) {
            if player.position.distance_sq_to(candidate) < min_player_dist_sq {
                return false;
            }
            if geometry::point_in_polygon(candidate, &player.territory) {
                return false;
            }
            if player
                .territory
                .iter()
                .any(|v| v.distance_sq_to(candidate) < clearance_sq)
            {
                return false;
            }
        }
        true
    }

    fn inside_any_live_territory(&self, candidate: Vec2) -> bool {
        self.players()
            .filter(|p| p.is_alive())
            .any(|p| geometry::point_in_polygon(candidate, &p.territory))
    }

    /// Repair broken per-player invariants, logging each fix. Runs at the
    /// end of every tick; a repaired player keeps playing.
    pub fn repair_invariants(&mut self) {
        for player in self.players.values_mut() {
            if !player.position.is_finite() {
                warn!(player = %player.id, "non-finite position, resetting to arena center");
                player.position = ARENA_CENTER;
                player.prev_position = ARENA_CENTER;
            }
            if player.is_outside && (player.exit_point.is_none() || player.trail.is_empty()) {
                warn!(player = %player.id, "outside without trail state, repairing");
                player.clear_trail_state();
            }
            if !player.is_outside && (!player.trail.is_empty() || player.exit_point.is_some()) {
                warn!(player = %player.id, "inside with stale trail state, repairing");
                player.clear_trail_state();
            }
            if player.is_dead && !player.trail.is_empty() {
                warn!(player = %player.id, "dead player with trail, repairing");
                player.trail.clear();
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform random point in the arena disc (`r = sqrt(u) * R`)
fn random_arena_point(rng: &mut impl Rng) -> Vec2 {
    let u: f64 = rng.gen();
    let r = u.sqrt() * world::ARENA_RADIUS;
    let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    ARENA_CENTER + Vec2::from_angle(theta) * r
}
