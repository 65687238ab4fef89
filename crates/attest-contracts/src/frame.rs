//! Raw raster frames handed over by the capture collaborator.
//!
//! No codec lives here. A `Frame` is interleaved samples, row-major, with
//! `channels` samples per pixel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AttestError, AttestResult};

/// Interleaved sample storage at one of the supported bit depths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::U16(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            Self::U8(_) => 8,
            Self::U16(_) => 16,
        }
    }
}

/// A captured screen frame.
///
/// Deserialization goes through `Frame::new`, so every `Frame` in memory
/// has a sample buffer matching its geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl Frame {
    /// Build a frame, checking that the sample buffer matches the geometry.
    pub fn new(width: u32, height: u32, channels: u8, samples: Samples) -> AttestResult<Self> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(AttestError::MalformedFrame {
                reason: format!("zero dimension in {width}x{height}x{channels}"),
            });
        }
        let expected = sample_count(width, height, channels)?;
        if samples.len() != expected {
            return Err(AttestError::MalformedFrame {
                reason: format!(
                    "{width}x{height}x{channels} needs {expected} samples, got {}",
                    samples.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// An 8-bit frame with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> AttestResult<Self> {
        let len = sample_count(width, height, channels)?;
        Self::new(width, height, channels, Samples::U8(vec![value; len]))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Geometry and depth only; two frames are comparable iff these match.
    pub fn shape(&self) -> FrameShape {
        FrameShape {
            width: self.width,
            height: self.height,
            channels: self.channels,
            bit_depth: self.samples.bit_depth(),
        }
    }

    /// Overwrite every channel of pixel `(x, y)` with `value`.
    ///
    /// Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u16) {
        if x >= self.width || y >= self.height {
            return;
        }
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        match &mut self.samples {
            Samples::U8(s) => s[start..start + c].fill(value.min(u16::from(u8::MAX)) as u8),
            Samples::U16(s) => s[start..start + c].fill(value),
        }
    }

    /// The exact raster bytes handed to the object store and hashed.
    /// 16-bit samples are little-endian.
    pub fn raw_bytes(&self) -> Vec<u8> {
        match &self.samples {
            Samples::U8(s) => s.clone(),
            Samples::U16(s) => s.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

/// `width * height * channels`, or `MalformedFrame` if it overflows `usize`.
fn sample_count(width: u32, height: u32, channels: u8) -> AttestResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(usize::from(channels)))
        .ok_or_else(|| AttestError::MalformedFrame {
            reason: format!("{width}x{height}x{channels} overflows the sample count"),
        })
}

/// Unchecked wire form of a `Frame`.
#[derive(Deserialize)]
struct RawFrame {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl TryFrom<RawFrame> for Frame {
    type Error = AttestError;

    fn try_from(raw: RawFrame) -> AttestResult<Self> {
        Self::new(raw.width, raw.height, raw.channels, raw.samples)
    }
}

/// Width, height, channel count, and bit depth of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub bit_depth: u8,
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}@{}bit",
            self.width, self.height, self.channels, self.bit_depth
        )
    }
}
