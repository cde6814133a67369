/// World/arena constants
pub mod world {
    /// World bounding square side length
    pub const WIDTH: f64 = 5000.0;
    pub const HEIGHT: f64 = 5000.0;
    /// Arena is the circle inscribed in the world square
    pub const ARENA_CENTER_X: f64 = 2500.0;
    pub const ARENA_CENTER_Y: f64 = 2500.0;
    pub const ARENA_RADIUS: f64 = 2500.0;
    /// Players are clamped this far inside the arena boundary
    pub const BOUNDARY_MARGIN: f64 = 1.0;
}

/// Simulation timing constants
pub mod sim {
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f64 = 1.0 / TICK_RATE as f64;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE as u64;
}

/// Player movement constants
pub mod movement {
    /// Scalar speed once a player has received their first input (units/second)
    pub const PLAYER_SPEED: f64 = 500.0;
    /// Steering factor for the frame-rate-independent heading lerp
    pub const TURN_SPEED: f64 = 12.0;
}

/// Trail constants
pub mod trail {
    /// Minimum spacing between recorded trail points (world units)
    pub const POINT_DISTANCE: f64 = 10.0;
    /// A trail must be longer than this to close a capture on re-entry
    pub const MIN_CAPTURE_POINTS: usize = 2;
    /// A trail must be longer than this to close a loop in open space
    pub const MIN_LOOP_POINTS: usize = 10;
    /// Loop closure triggers when the head comes within this of the exit point
    pub const LOOP_CLOSE_DISTANCE: f64 = 80.0;
    /// Self-collision ignores this many trail segments behind the head
    pub const SELF_HIT_MIN_AGE: usize = 20;
    /// Self-collision is suppressed within this radius of the exit point
    pub const EXIT_GRACE_RADIUS: f64 = 100.0;
}

/// Territory constants
pub mod territory {
    /// Diameter-ish parameter of the seed territory
    pub const STARTING_SIZE: f64 = 300.0;
    /// Seed territory circumradius
    pub const SEED_RADIUS: f64 = STARTING_SIZE / 2.0 + 5.0;
    /// Vertex count of the regular seed polygon
    pub const SEED_VERTICES: usize = 32;
    /// Committed territories must exceed this absolute area
    pub const MIN_AREA: f64 = 100.0;
    /// Default polygon simplification tolerance
    pub const SIMPLIFY_TOLERANCE: f64 = 1.0;
    /// Coarser tolerance applied when the simplified polygon is still too large
    pub const SIMPLIFY_TOLERANCE_COARSE: f64 = 2.0;
    /// Vertex count that triggers the coarser simplification pass
    pub const MAX_VERTICES: usize = 400;
    /// Grace period after a successful capture (seconds)
    pub const CAPTURE_GRACE: f64 = 0.5;
    /// Fraction of the arena area that wins the game
    pub const WIN_AREA_FRACTION: f64 = 0.99;
}

/// Spawn placement constants
pub mod spawn {
    /// Minimum distance between spawn points and existing players
    pub const MIN_DISTANCE: f64 = 500.0;
    /// Required clearance between a spawn point and any live territory vertex,
    /// on top of the seed radius
    pub const TERRITORY_CLEARANCE: f64 = 100.0;
    /// Attempts before relaxing the clearance requirement
    pub const MAX_ATTEMPTS: u32 = 30;
    /// Dead bots are removed after this many seconds
    pub const BOT_REMOVAL_DELAY: f64 = 1.0;
}

/// Bot controller constants
pub mod bot {
    /// Bot decision rate in Hz
    pub const DECISION_RATE: f64 = 6.0;
    /// Seconds between bot decisions
    pub const DECISION_INTERVAL: f64 = 1.0 / DECISION_RATE;
    /// Bots steer back toward the center within this distance of the boundary
    pub const BOUNDARY_AVOID_MARGIN: f64 = 300.0;
    /// Trail length at which a bot heads home
    pub const RETURN_TRAIL_POINTS: usize = 40;
    /// Random wander turns stay within this many radians of the current heading
    pub const TURN_RANGE: f64 = std::f64::consts::PI / 3.0;
    /// Wander cooldown range in seconds
    pub const COOLDOWN_MIN: f64 = 0.5;
    pub const COOLDOWN_MAX: f64 = 2.5;
    /// Bots fill in while fewer humans than this are present
    pub const MIN_HUMANS_FOR_BOTS: usize = 3;
    /// Total player count the bot population manager tops up to
    pub const TARGET_TOTAL_PLAYERS: usize = 4;
    /// Seconds between population manager passes
    pub const POPULATION_INTERVAL: f64 = 2.0;
    /// Bot player ids carry this prefix
    pub const ID_PREFIX: &str = "BOT_";
}

/// Display palette assigned round-robin at join time; opaque to the core
pub const PLAYER_COLORS: &[&str] = &[
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#54A0FF", "#5F27CD",
    "#01A3A4", "#F368E0",
];

/// Absolute territory area at which a player wins
#[inline]
pub fn victory_threshold() -> f64 {
    territory::WIN_AREA_FRACTION * std::f64::consts::PI * world::ARENA_RADIUS * world::ARENA_RADIUS
}
