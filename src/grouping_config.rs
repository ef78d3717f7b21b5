use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DISTANCE: f64 = 0.35;
pub const DEFAULT_ASSET_BOOST: f64 = 0.08;
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;
pub const DEFAULT_MAX_DESCRIPTIONS_PER_GROUP: usize = 8;

/// Tunables for one grouping run, passed explicitly to every entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Similarity cutoff; smaller is stricter
    pub max_distance: f64,
    /// Distance discount for items that share an entity tag
    pub asset_boost: f64,
    /// Groups smaller than this are dropped before presentation
    pub min_group_size: usize,
    /// Cap on descriptions sent to the analysis service per group
    pub max_descriptions_per_group: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            asset_boost: DEFAULT_ASSET_BOOST,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            max_descriptions_per_group: DEFAULT_MAX_DESCRIPTIONS_PER_GROUP,
        }
    }
}

impl GroupingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            max_distance: 0.25,
            ..Default::default()
        }
    }

    pub fn relaxed() -> Self {
        Self {
            max_distance: 0.5,
            ..Default::default()
        }
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_asset_boost(mut self, asset_boost: f64) -> Self {
        self.asset_boost = asset_boost;
        self
    }

    pub fn with_min_group_size(mut self, size: usize) -> Self {
        self.min_group_size = size.max(1);
        self
    }

    pub fn with_max_descriptions(mut self, count: usize) -> Self {
        self.max_descriptions_per_group = count.max(1);
        self
    }
}
