//! # attest-verify
//!
//! The trusted verification primitives of ATTEST.
//!
//! - [`PixelDeltaVerifier`] implements `CausalVerifier`: it counts changed
//!   pixels between two frames and turns the count into a `Decision`.
//! - [`Sha256Checker`] implements `IntegrityChecker`: the checksum stored
//!   with every observation and artifact.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_core::traits::CausalVerifier;
//! use attest_verify::PixelDeltaVerifier;
//!
//! let verifier = PixelDeltaVerifier::new();
//! let delta = verifier.compute_delta(&before, &after)?;
//! if verifier.decide(delta).is_pass() {
//!     println!("{delta} pixels changed");
//! }
//! ```

pub mod integrity;
pub mod pixel;

pub use integrity::Sha256Checker;
pub use pixel::{PixelDeltaVerifier, NOISE_FLOOR};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use attest_contracts::{
        error::AttestError,
        frame::{Frame, Samples},
        verify::Decision,
    };
    use attest_core::traits::{CausalVerifier, IntegrityChecker};

    use super::{PixelDeltaVerifier, Sha256Checker};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn gray(width: u32, height: u32, value: u8) -> Frame {
        Frame::filled(width, height, 3, value).unwrap()
    }

    // ── compute_delta ─────────────────────────────────────────────────────────

    #[test]
    fn test_identical_frames_have_zero_delta() {
        let frame = gray(8, 6, 40);
        let delta = PixelDeltaVerifier::new().compute_delta(&frame, &frame.clone()).unwrap();
        assert_eq!(delta, 0);
    }

    #[test]
    fn test_single_pixel_change_counts_once() {
        let before = gray(8, 6, 40);
        let mut after = before.clone();
        after.set_pixel(3, 2, 255);

        let delta = PixelDeltaVerifier::new().compute_delta(&before, &after).unwrap();
        assert_eq!(delta, 1, "all channels of one pixel changed; still one pixel");
    }

    /// A change on a single channel is enough to count the pixel.
    #[test]
    fn test_one_channel_change_counts_pixel() {
        let mut samples = vec![10u8; 2 * 2 * 3];
        let before = Frame::new(2, 2, 3, Samples::U8(samples.clone())).unwrap();
        samples[4] = 11;
        let after = Frame::new(2, 2, 3, Samples::U8(samples)).unwrap();

        assert_eq!(PixelDeltaVerifier::new().compute_delta(&before, &after).unwrap(), 1);
    }

    /// Narrow samples must not wrap when the after value is lower.
    #[test]
    fn test_decreasing_intensity_is_detected() {
        let before = gray(4, 4, 200);
        let mut after = before.clone();
        after.set_pixel(0, 0, 0);
        after.set_pixel(3, 3, 199);

        assert_eq!(PixelDeltaVerifier::new().compute_delta(&before, &after).unwrap(), 2);
    }

    #[test]
    fn test_sixteen_bit_frames() {
        let before = Frame::new(3, 1, 1, Samples::U16(vec![0, 40_000, u16::MAX])).unwrap();
        let after = Frame::new(3, 1, 1, Samples::U16(vec![0, 40_001, 0])).unwrap();

        assert_eq!(PixelDeltaVerifier::new().compute_delta(&before, &after).unwrap(), 2);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let verifier = PixelDeltaVerifier::new();

        let err = verifier.compute_delta(&gray(8, 6, 0), &gray(6, 8, 0)).unwrap_err();
        assert!(matches!(err, AttestError::DimensionMismatch { .. }));

        let rgba = Frame::filled(8, 6, 4, 0).unwrap();
        let err = verifier.compute_delta(&gray(8, 6, 0), &rgba).unwrap_err();
        assert!(matches!(err, AttestError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_bit_depth_mismatch_is_an_error() {
        let narrow = Frame::new(1, 1, 1, Samples::U8(vec![7])).unwrap();
        let wide = Frame::new(1, 1, 1, Samples::U16(vec![7])).unwrap();

        let err = PixelDeltaVerifier::new().compute_delta(&narrow, &wide).unwrap_err();
        assert!(err.to_string().contains("1x1x1@8bit"));
    }

    // ── decide ────────────────────────────────────────────────────────────────

    #[test]
    fn test_decide_boundary_at_zero() {
        let verifier = PixelDeltaVerifier::new();
        assert_eq!(verifier.decide(0), Decision::Fail);
        assert_eq!(verifier.decide(1), Decision::Pass);
        assert_eq!(verifier.decide(u64::MAX), Decision::Pass);
    }

    // ── hash ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_is_deterministic() {
        let checker = Sha256Checker::new();
        let bytes = gray(4, 4, 9).raw_bytes();
        assert_eq!(checker.hash(&bytes), checker.hash(&bytes));
        assert_eq!(checker.hash(&bytes), Sha256Checker.hash(&bytes.clone()));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            Sha256Checker::new().hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_shape_and_sensitivity() {
        let checker = Sha256Checker::new();
        let a = checker.hash(b"before");
        let b = checker.hash(b"after");

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
