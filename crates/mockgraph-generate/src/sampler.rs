use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mockgraph_core::{GenerationError, Result};

/// Highest number of fractional digits accepted by [`Sampler::real`].
pub const MAX_PRECISION: u32 = 9;

// Tolerance applied when snapping scaled bounds onto the decimal grid, so
// that e.g. 0.55 * 100 = 55.000000000000007 still admits 55.
const GRID_SNAP: f64 = 1e-6;

/// Uniform draws from pools and bounded numeric ranges.
///
/// The sampler owns its random source, which is injected by the caller.
/// Every draw is independent; nothing is cached between calls.
pub struct Sampler {
    rng: Box<dyn RngCore + Send>,
}

impl Sampler {
    pub fn new(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Sampler backed by a ChaCha8 stream seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Uniform index in `0..len`.
    pub fn index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(GenerationError::EmptyPool);
        }
        Ok(self.rng.random_range(0..len))
    }

    /// Uniform pick from a non-empty pool.
    pub fn one<'a, T>(&mut self, pool: &'a [T]) -> Result<&'a T> {
        let index = self.index(pool.len())?;
        Ok(&pool[index])
    }

    /// `count` distinct elements of `pool` in randomized order.
    ///
    /// Requests larger than the pool are rejected rather than truncated.
    pub fn many<'a, T>(&mut self, pool: &'a [T], count: usize) -> Result<Vec<&'a T>> {
        if count > pool.len() {
            return Err(GenerationError::InsufficientPoolSize {
                requested: count,
                available: pool.len(),
            });
        }
        let indices = rand::seq::index::sample(self.rng.as_mut(), pool.len(), count);
        Ok(indices.into_iter().map(|index| &pool[index]).collect())
    }

    /// Draws a count in `[min, max]`, then that many distinct elements.
    ///
    /// `max` is checked against the pool up front so an oversized request
    /// fails on every draw, not only on unlucky ones.
    pub fn many_between<'a, T>(
        &mut self,
        pool: &'a [T],
        min: usize,
        max: usize,
    ) -> Result<Vec<&'a T>> {
        if min > max {
            return Err(GenerationError::InvalidRange(format!(
                "count min {min} exceeds max {max}"
            )));
        }
        if max > pool.len() {
            return Err(GenerationError::InsufficientPoolSize {
                requested: max,
                available: pool.len(),
            });
        }
        let count = self.rng.random_range(min..=max);
        self.many(pool, count)
    }

    /// Uniform integer in `[min, max]`.
    pub fn integer(&mut self, min: i64, max: i64) -> Result<i64> {
        if min > max {
            return Err(GenerationError::InvalidRange(format!(
                "integer min {min} exceeds max {max}"
            )));
        }
        Ok(self.rng.random_range(min..=max))
    }

    /// Uniform real in `[min, max]` with at most `precision` fractional
    /// digits.
    ///
    /// Values are drawn from the decimal grid of step `10^-precision` that
    /// lies inside the bounds, so rounding can never leave the range.
    pub fn real(&mut self, min: f64, max: f64, precision: u32) -> Result<f64> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GenerationError::InvalidRange(format!(
                "real bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(GenerationError::InvalidRange(format!(
                "real min {min} exceeds max {max}"
            )));
        }
        if precision > MAX_PRECISION {
            return Err(GenerationError::InvalidRange(format!(
                "precision {precision} exceeds {MAX_PRECISION} fractional digits"
            )));
        }

        let scale = 10_f64.powi(precision as i32);
        let low = (min * scale - GRID_SNAP).ceil();
        let high = (max * scale + GRID_SNAP).floor();
        // i64::MAX is not representable as f64; 2^63 itself is already out.
        if low < i64::MIN as f64 || high >= i64::MAX as f64 {
            return Err(GenerationError::InvalidRange(format!(
                "real bounds [{min}, {max}] at precision {precision} exceed the integer grid"
            )));
        }

        let mut low = low as i64;
        let mut high = high as i64;
        // The snap may admit one grid point just outside the bounds.
        if (low as f64 / scale) < min {
            low += 1;
        }
        if (high as f64 / scale) > max {
            high -= 1;
        }
        if low > high {
            return Err(GenerationError::InvalidRange(format!(
                "no value with {precision} fractional digits in [{min}, {max}]"
            )));
        }

        let step = self.rng.random_range(low..=high);
        Ok(step as f64 / scale)
    }

    /// Raw random source, for collaborators such as faker providers.
    pub fn rng(&mut self) -> &mut dyn RngCore {
        self.rng.as_mut()
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").finish_non_exhaustive()
    }
}

/// Number of fractional digits in the shortest decimal rendering of
/// `value`.
pub fn fractional_digits(value: f64) -> usize {
    let rendered = value.to_string();
    rendered
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}
