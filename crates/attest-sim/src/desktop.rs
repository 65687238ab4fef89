//! A simulated desktop that serves as both capture and input collaborator.
//!
//! The screen is a single shared `Frame`. A responsive desktop paints the
//! pixel under a mouse event (or the top-left pixel for key events) so the
//! action leaves a one-pixel trace; an unresponsive one acknowledges input
//! and changes nothing.

use std::sync::{Arc, Mutex};

use tracing::debug;

use attest_contracts::{
    error::{AttestError, AttestResult},
    evidence::ActionParameters,
    frame::{Frame, Samples},
};
use attest_core::traits::{CaptureSource, InputDriver};

/// Default screen geometry: 640x480 RGB, mid-gray.
pub const SCREEN_WIDTH: u32 = 640;
pub const SCREEN_HEIGHT: u32 = 480;
const SCREEN_CHANNELS: u8 = 3;
const BACKGROUND: u8 = 0x80;

fn poisoned(step: &str, e: impl std::fmt::Display) -> AttestError {
    AttestError::TransportFailure {
        step: step.to_string(),
        reason: format!("desktop state lock poisoned: {e}"),
    }
}

#[derive(Clone)]
pub struct SimulatedDesktop {
    screen: Arc<Mutex<Frame>>,
    responsive: bool,
    performed: Arc<Mutex<Vec<ActionParameters>>>,
}

impl SimulatedDesktop {
    /// A mid-gray 640x480 screen.
    pub fn new(responsive: bool) -> AttestResult<Self> {
        let frame = Frame::filled(SCREEN_WIDTH, SCREEN_HEIGHT, SCREEN_CHANNELS, BACKGROUND)?;
        Ok(Self::with_frame(frame, responsive))
    }

    pub fn with_frame(frame: Frame, responsive: bool) -> Self {
        Self {
            screen: Arc::new(Mutex::new(frame)),
            responsive,
            performed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_responsive(&self) -> bool {
        self.responsive
    }

    /// Every action acknowledged so far, in order.
    pub fn performed(&self) -> AttestResult<Vec<ActionParameters>> {
        Ok(self
            .performed
            .lock()
            .map_err(|e| poisoned("perform_action", e))?
            .clone())
    }
}

/// Screen coordinates an action touches, if they are non-negative.
fn target_pixel(action: &ActionParameters) -> Option<(u32, u32)> {
    let (x, y) = match action {
        ActionParameters::MouseMove { x, y } | ActionParameters::MouseClick { x, y, .. } => (*x, *y),
        ActionParameters::KeyPress { .. } | ActionParameters::KeyRelease { .. } => (0, 0),
    };
    Some((u32::try_from(x).ok()?, u32::try_from(y).ok()?))
}

/// First sample of pixel `(x, y)`, or `None` when out of bounds.
fn first_sample(frame: &Frame, x: u32, y: u32) -> Option<u16> {
    if x >= frame.width() || y >= frame.height() {
        return None;
    }
    let idx = (y as usize * frame.width() as usize + x as usize) * usize::from(frame.channels());
    match frame.samples() {
        Samples::U8(s) => s.get(idx).map(|v| u16::from(*v)),
        Samples::U16(s) => s.get(idx).copied(),
    }
}

impl CaptureSource for SimulatedDesktop {
    fn capture_frame(&self) -> AttestResult<Frame> {
        let screen = self.screen.lock().map_err(|e| poisoned("capture", e))?;
        Ok(screen.clone())
    }
}

impl InputDriver for SimulatedDesktop {
    fn perform(&self, action: &ActionParameters) -> AttestResult<()> {
        self.performed
            .lock()
            .map_err(|e| poisoned("perform_action", e))?
            .push(action.clone());

        if !self.responsive {
            debug!(action_type = %action.action_type(), "unresponsive desktop ignored input");
            return Ok(());
        }

        let mut screen = self.screen.lock().map_err(|e| poisoned("perform_action", e))?;
        if let Some((x, y)) = target_pixel(action) {
            if let Some(current) = first_sample(&screen, x, y) {
                // Invert against the background so the change is always visible.
                let painted = if current == 0 { u16::MAX } else { 0 };
                screen.set_pixel(x, y, painted);
                debug!(x, y, painted, "desktop painted pixel");
            }
        }
        Ok(())
    }
}
