/// Dense pairwise cosine distances
///
/// Builds the N×N matrix consumed by the group builder. Rows are independent
/// and computed in parallel; every entry is `1 - cos(v_i, v_j)` clamped to
/// `[0, 2]`, the diagonal is exactly zero, and a pair involving a
/// zero-magnitude vector gets the fallback distance of 1.0.
use crate::error::{GroupingError, InputError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Distance assigned when either vector has zero magnitude
pub const ZERO_VECTOR_DISTANCE: f64 = 1.0;

/// Square, symmetric, non-negative distance matrix stored row-major
///
/// Serialised as a list of rows; deserialising goes through [`DistanceMatrix::from_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Build a matrix from explicit rows
    ///
    /// Fails if there are no rows or any row length differs from the row count.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(InputError::Empty.into());
        }

        let mut values = Vec::with_capacity(size * size);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != size {
                return Err(InputError::NotSquare {
                    row,
                    expected: size,
                    found: cols.len(),
                }
                .into());
            }
            values.extend(cols);
        }

        Ok(Self { size, values })
    }

    /// Number of items (rows and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size)
    }
}

impl TryFrom<Vec<Vec<f64>>> for DistanceMatrix {
    type Error = GroupingError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<DistanceMatrix> for Vec<Vec<f64>> {
    fn from(matrix: DistanceMatrix) -> Self {
        matrix.rows().map(<[f64]>::to_vec).collect()
    }
}

/// Compute the pairwise cosine-distance matrix for `vectors`
///
/// All vectors must share one non-zero length and contain only finite values.
pub fn compute_distances<V>(vectors: &[V]) -> Result<DistanceMatrix>
where
    V: AsRef<[f32]> + Sync,
{
    validate_vectors(vectors)?;

    let norms: Vec<f64> = vectors.par_iter().map(|v| norm(v.as_ref())).collect();
    let size = vectors.len();

    let rows: Vec<Vec<f64>> = (0..size)
        .into_par_iter()
        .map(|i| {
            (0..size)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        cosine_distance(vectors[i].as_ref(), norms[i], vectors[j].as_ref(), norms[j])
                    }
                })
                .collect()
        })
        .collect();

    tracing::debug!("Computed {}x{} distance matrix", size, size);

    Ok(DistanceMatrix {
        size,
        values: rows.into_iter().flatten().collect(),
    })
}

fn validate_vectors<V: AsRef<[f32]>>(vectors: &[V]) -> Result<()> {
    let first = vectors.first().ok_or(InputError::Empty)?;
    let expected = first.as_ref().len();
    if expected == 0 {
        return Err(InputError::ZeroDimension.into());
    }

    for (index, vector) in vectors.iter().enumerate() {
        let vector = vector.as_ref();
        if vector.len() != expected {
            return Err(InputError::DimensionMismatch {
                index,
                expected,
                found: vector.len(),
            }
            .into());
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(InputError::NonFinite { index }.into());
        }
    }

    Ok(())
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum()
}

#[inline]
fn norm(v: &[f32]) -> f64 {
    dot(v, v).sqrt()
}

/// `1 - cosine similarity`, clamped to `[0, 2]`
///
/// Multiplication is commutative in IEEE arithmetic and the summation order
/// is fixed, so `cosine_distance(a, b) == cosine_distance(b, a)` bit for bit.
fn cosine_distance(a: &[f32], norm_a: f64, b: &[f32], norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return ZERO_VECTOR_DISTANCE;
    }

    let similarity = dot(a, b) / (norm_a * norm_b);
    (1.0 - similarity).clamp(0.0, 2.0)
}
