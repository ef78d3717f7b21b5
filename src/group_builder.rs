/// Connected-component grouping over a thresholded distance graph
///
/// Two items are adjacent when their adjusted distance is at most
/// `max_distance`, where the adjusted distance is the raw distance minus
/// `asset_boost` whenever the items share an entity tag. Groups are the
/// connected components of that graph.
///
/// The adjusted distance is not floored at zero. A negative value can only make
/// the inclusion test easier to pass, never harder.
use crate::distance::DistanceMatrix;
use crate::entity_extractor::{shares_entity, EntityTags};
use crate::error::{InputError, Result};

/// One connected component: member indices in strictly increasing order
pub type Group = Vec<usize>;

/// Raw distance between `i` and `j`, discounted when they share an entity
#[inline]
pub fn adjusted_distance(
    distances: &DistanceMatrix,
    entity_tags: &[EntityTags],
    i: usize,
    j: usize,
    asset_boost: f64,
) -> f64 {
    let raw = distances.get(i, j);
    if shares_entity(&entity_tags[i], &entity_tags[j]) {
        raw - asset_boost
    } else {
        raw
    }
}

/// Partition `[0, N)` into connected components of the threshold graph
///
/// Groups come out ordered by their lowest member index. The partition does
/// not depend on traversal order; the explicit stack only fixes the visit
/// sequence.
pub fn build_groups(
    distances: &DistanceMatrix,
    entity_tags: &[EntityTags],
    max_distance: f64,
    asset_boost: f64,
) -> Result<Vec<Group>> {
    let n = distances.len();
    if n == 0 {
        return Err(InputError::Empty.into());
    }
    if entity_tags.len() != n {
        return Err(InputError::TagCountMismatch {
            expected: n,
            found: entity_tags.len(),
        }
        .into());
    }

    let mut visited = vec![false; n];
    let mut groups: Vec<Group> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }

        let mut group = Vec::new();
        stack.push(seed);

        while let Some(current) = stack.pop() {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            group.push(current);

            for j in 0..n {
                if visited[j] {
                    continue;
                }
                if adjusted_distance(distances, entity_tags, current, j, asset_boost)
                    <= max_distance
                {
                    stack.push(j);
                }
            }
        }

        group.sort_unstable();
        groups.push(group);
    }

    tracing::debug!(
        "Built {} groups from {} items (max_distance={}, asset_boost={})",
        groups.len(),
        n,
        max_distance,
        asset_boost
    );

    Ok(groups)
}
