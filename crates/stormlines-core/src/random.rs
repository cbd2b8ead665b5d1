//! Small sampling helpers over any [`rand::Rng`].
//!
//! Everything random in the scene goes through these so that callers can
//! inject a seeded generator.

use rand::Rng;

/// Uniform sample in `[min, max)`. Degenerate ranges return `min`.
#[inline]
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    (max - min) * rng.gen::<f32>() + min
}

#[inline]
pub fn rand_range_f64<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    (max - min) * rng.gen::<f64>() + min
}

/// Sample from a `(min, max)` pair, the shape used by the tuning tables.
#[inline]
pub fn rand_band<R: Rng + ?Sized>(rng: &mut R, band: (f32, f32)) -> f32 {
    rand_range(rng, band.0, band.1)
}

/// True with probability `p`.
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.gen::<f32>() < p
}

/// Clamp a possibly out-of-range index into `[0, len - 1]`.
///
/// An empty sequence maps everything to 0; callers never index an empty path.
#[inline]
pub fn clamp_index(index: i64, len: usize) -> usize {
    let last = len.saturating_sub(1) as i64;
    index.clamp(0, last) as usize
}
