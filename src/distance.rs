//! Distance capability consumed by every builder.
//!
//! The metric itself is supplied by the caller. Builders only require that it
//! is symmetric and non-negative, and that it rejects vectors of unequal
//! length with [`Error::DimensionMismatch`].

use crate::error::{Error, Result};

/// A pairwise distance between two feature vectors.
pub trait Distance {
    /// Distance between `a` and `b`.
    ///
    /// Must fail with [`Error::DimensionMismatch`] when `a.len() != b.len()`.
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64>;
}

impl<D: Distance + ?Sized> Distance for &D {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        (**self).distance(a, b)
    }
}

/// Fail unless both vectors have the same length.
#[inline]
pub fn check_dims(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        })
    }
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Distance for Euclidean {
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        Ok(SquaredEuclidean.distance(a, b)?.sqrt())
    }
}

/// Squared Euclidean distance. Not a metric, but cheaper and order-preserving.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl Distance for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_dims(a, b)?;
        Ok(a.iter()
            .zip(b)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum())
    }
}

/// Adapts a plain closure into a [`Distance`].
///
/// The closure never sees vectors of unequal length; the adapter rejects them
/// first.
///
/// ```rust
/// use somcluster::distance::{Distance, FnDistance};
///
/// let manhattan = FnDistance(|a: &[f64], b: &[f64]| {
///     a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>()
/// });
/// assert_eq!(manhattan.distance(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 3.0);
/// assert!(manhattan.distance(&[0.0], &[1.0, 2.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnDistance<F>(pub F);

impl<F> Distance for FnDistance<F>
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_dims(a, b)?;
        Ok((self.0)(a, b))
    }
}
