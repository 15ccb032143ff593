//! Simulation configuration with documented constants
//!
//! All magic numbers of the live-world layer are collected here with
//! explanations of their purpose and where they came from.

/// Configuration for the live-world simulation
///
/// The distance values are in world units (centimeters in the shipped game
/// data) and are tuned to that content. Changing them shifts AI
/// level-of-detail boundaries and interaction reach.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // === LEVEL OF DETAIL ===
    /// Radius around the player inside which NPCs run full AI (world units)
    ///
    /// NPCs inside this radius form the "near" set: they receive passive
    /// perception, zone-trigger tests and active player perception.
    pub near_distance: f32,

    /// Radius around the player for reduced AI (world units)
    ///
    /// Between `near_distance` and this, NPCs run the far tier; beyond it
    /// they run the minimal far2 tier.
    pub far_distance: f32,

    /// Initial capacity reserved for the near-NPC set
    pub near_reserve: usize,

    // === TARGET SEARCH ===
    /// Vertical eye offset of a standing observer (world units)
    ///
    /// Also the upper bound of the span used by the item visibility
    /// heuristic: an item between observer height and observer height plus
    /// this value is ray-tested at eye level.
    pub eye_height: f32,

    /// Vertical offset added to an item outside the eye span for its
    /// visibility ray test (world units)
    pub item_ray_offset: f32,

    /// Search radius for `available_mob` lookups (world units)
    pub mob_search_radius: f32,

    // === SPATIAL INDEX ===
    /// Cell size of the broad-phase grid (world units)
    ///
    /// Queries over-approximate by whole cells; a cell roughly the size of
    /// the common interaction radius keeps the rejection test cheap without
    /// inflating the candidate set.
    pub grid_cell_size: f32,

    // === PROJECTILES ===
    /// Distance a bullet may travel before it is considered stopped
    /// (world units)
    pub bullet_max_range: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            near_distance: 3000.0,
            far_distance: 6000.0,
            near_reserve: 512,

            eye_height: 180.0,
            item_ray_offset: 20.0,
            mob_search_radius: 1000.0,

            grid_cell_size: 1000.0,

            bullet_max_range: 5000.0,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.near_distance >= self.far_distance {
            return Err(format!(
                "near_distance ({}) must be < far_distance ({})",
                self.near_distance, self.far_distance
            ));
        }
        if self.grid_cell_size <= 0.0 {
            return Err("grid_cell_size must be positive".into());
        }
        if self.eye_height <= 0.0 || self.item_ray_offset < 0.0 {
            return Err("eye geometry must be non-negative".into());
        }
        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<SimulationConfig> = OnceLock::new();

/// Get the global simulation config (initializes with defaults if not set)
pub fn config() -> &'static SimulationConfig {
    CONFIG.get_or_init(SimulationConfig::default)
}

/// Set the global simulation config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: SimulationConfig) -> Result<(), SimulationConfig> {
    CONFIG.set(config)
}
