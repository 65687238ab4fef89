//! Pixel-level causal verifier.
//!
//! `PixelDeltaVerifier` counts pixels whose intensity changed between a
//! before and an after frame. The comparison is exact integer arithmetic; a
//! pixel counts as changed when any one of its channels moved by more than
//! `NOISE_FLOOR`.

use tracing::debug;

use attest_contracts::{
    error::{AttestError, AttestResult},
    frame::{Frame, Samples},
    verify::Decision,
};
use attest_core::traits::CausalVerifier;

/// Largest per-channel difference still treated as "unchanged".
///
/// Zero: any detectable change counts.
pub const NOISE_FLOOR: i32 = 0;

/// The pixel-delta `CausalVerifier`. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelDeltaVerifier;

impl PixelDeltaVerifier {
    pub fn new() -> Self {
        Self
    }
}

/// Count pixels in two equally-shaped interleaved buffers where any channel
/// differs by more than the noise floor.
fn changed_pixels<T>(before: &[T], after: &[T], channels: usize) -> u64
where
    T: Copy + Into<i32>,
{
    before
        .chunks_exact(channels)
        .zip(after.chunks_exact(channels))
        .filter(|(a, b)| {
            a.iter()
                .zip(b.iter())
                .any(|(&x, &y)| (x.into() - y.into()).abs() > NOISE_FLOOR)
        })
        .count() as u64
}

impl CausalVerifier for PixelDeltaVerifier {
    fn compute_delta(&self, before: &Frame, after: &Frame) -> AttestResult<u64> {
        let (left, right) = (before.shape(), after.shape());
        if left != right {
            return Err(AttestError::DimensionMismatch {
                left: left.to_string(),
                right: right.to_string(),
            });
        }

        let channels = usize::from(before.channels());
        let delta = match (before.samples(), after.samples()) {
            (Samples::U8(a), Samples::U8(b)) => changed_pixels(a, b, channels),
            (Samples::U16(a), Samples::U16(b)) => changed_pixels(a, b, channels),
            // Equal shapes imply equal bit depth.
            _ => {
                return Err(AttestError::DimensionMismatch {
                    left: left.to_string(),
                    right: right.to_string(),
                })
            }
        };

        debug!(shape = %left, delta, "pixel delta computed");
        Ok(delta)
    }

    fn decide(&self, delta_count: u64) -> Decision {
        if delta_count > 0 {
            Decision::Pass
        } else {
            Decision::Fail
        }
    }
}
