use crate::distance::compute_distances;
use crate::entity_extractor::EntityTags;
use crate::error::{InputError, Result};
use crate::group_builder::{build_groups, Group};
use crate::grouping_config::GroupingConfig;
use serde::{Deserialize, Serialize};

/// One ticket as seen by the grouping engine
///
/// Fixed at construction; the engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    index: usize,
    embedding: Vec<f32>,
    entity_tags: EntityTags,
}

impl Item {
    pub fn new(index: usize, embedding: Vec<f32>, entity_tags: EntityTags) -> Self {
        Self {
            index,
            embedding,
            entity_tags,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn entity_tags(&self) -> &EntityTags {
        &self.entity_tags
    }
}

/// Run the full grouping engine over `items`
///
/// Items must be indexed `0..N` in slice order; any other index is invalid
/// input. Returns the complete partition; use [`meaningful_groups`] to apply the size filter.
pub fn group_items(items: &[Item], config: &GroupingConfig) -> Result<Vec<Group>> {
    if items.is_empty() {
        return Err(InputError::Empty.into());
    }
    if let Some((position, item)) = items
        .iter()
        .enumerate()
        .find(|(position, item)| item.index() != *position)
    {
        return Err(InputError::IndexMismatch {
            position,
            index: item.index(),
        }
        .into());
    }

    let vectors: Vec<&[f32]> = items.iter().map(|item| item.embedding()).collect();
    let tags: Vec<EntityTags> = items.iter().map(|item| item.entity_tags.clone()).collect();

    let distances = compute_distances(&vectors)?;
    build_groups(&distances, &tags, config.max_distance, config.asset_boost)
}

/// Drop groups with fewer than `min_group_size` members
///
/// Membership of the surviving groups is untouched.
pub fn meaningful_groups(groups: Vec<Group>, min_group_size: usize) -> Vec<Group> {
    groups
        .into_iter()
        .filter(|group| group.len() >= min_group_size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GroupingError;

    fn item(index: usize, embedding: Vec<f32>, tags: &[&str]) -> Item {
        Item::new(
            index,
            embedding,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_group_items_end_to_end() {
        let items = vec![
            item(0, vec![1.0, 0.0, 0.0], &[]),
            item(1, vec![0.98, 0.05, 0.0], &[]),
            item(2, vec![0.0, 0.0, 1.0], &[]),
        ];

        let groups = group_items(&items, &GroupingConfig::default()).unwrap();
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_group_items_entity_boost() {
        // cos = 0.6 → distance 0.4, pulled to 0.32 by the shared host
        let items = vec![
            item(0, vec![1.0, 0.0], &["dir-sync-01"]),
            item(1, vec![0.6, 0.8], &["dir-sync-01"]),
        ];

        let groups = group_items(&items, &GroupingConfig::default()).unwrap();
        assert_eq!(groups, vec![vec![0, 1]]);

        let groups = group_items(&items, &GroupingConfig::default().with_asset_boost(0.0)).unwrap();
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_group_items_empty() {
        let err = group_items(&[], &GroupingConfig::default()).unwrap_err();
        assert_eq!(err, GroupingError::InvalidInput(InputError::Empty));
    }

    #[test]
    fn test_group_items_index_must_match_position() {
        let items = vec![
            item(0, vec![1.0, 0.0], &[]),
            item(5, vec![0.9, 0.1], &[]),
        ];

        let err = group_items(&items, &GroupingConfig::default()).unwrap_err();
        assert_eq!(
            err.input(),
            &InputError::IndexMismatch {
                position: 1,
                index: 5
            }
        );
    }

    #[test]
    fn test_meaningful_groups_filter() {
        let groups = vec![vec![0, 2], vec![1], vec![3, 4, 5]];

        assert_eq!(
            meaningful_groups(groups.clone(), 2),
            vec![vec![0, 2], vec![3, 4, 5]]
        );
        assert_eq!(meaningful_groups(groups.clone(), 1), groups);
        assert!(meaningful_groups(groups, 4).is_empty());
    }
}
