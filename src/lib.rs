// Grouping engine
pub mod distance;
pub mod entity_extractor;
pub mod error;
pub mod group_builder;
pub mod grouping;
pub mod grouping_config;

// External services and plumbing
pub mod api;
pub mod config;
pub mod embedding_service;
pub mod implementations;
pub mod llm_config;
pub mod llm_service;
pub mod pipeline;
pub mod ticket_loader;
pub mod traits;

pub use distance::{compute_distances, DistanceMatrix};
pub use entity_extractor::{extract_entities, EntityTags};
pub use error::{GroupingError, InputError};
pub use group_builder::{build_groups, Group};
pub use grouping::{group_items, meaningful_groups, Item};
pub use grouping_config::GroupingConfig;
