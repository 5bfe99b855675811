//! Logit → probability conversion and acceptance thresholds shared by every stage.

/// Sigmoid activation.
#[inline]
pub fn probability(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Strictly above `threshold` and not above 1.0. NaN is never accepted.
#[inline]
pub fn accept(probability: f32, threshold: f32) -> bool {
    probability > threshold && probability <= 1.0
}

/// Convenience for the common `accept(probability(logit), threshold)` pair.
#[inline]
pub fn accept_logit(logit: f32, threshold: f32) -> bool {
    accept(probability(logit), threshold)
}
