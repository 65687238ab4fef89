//! # attest-sim
//!
//! Simulated collaborators and reference scenarios for ATTEST.
//!
//! - [`SimulatedDesktop`] stands in for both the screen-capture and the
//!   OS-input collaborator.
//! - [`FsObjectStore`] and [`MemoryObjectStore`] store evidence bytes.
//! - [`scenarios`] runs the three reference cases end to end:
//!
//! 1. **No change**: an unresponsive desktop, delta 0, decision `Fail`,
//!    execution sealed `failed`.
//! 2. **Change**: one repainted pixel, delta 1, decision `Pass`,
//!    `pixel_delta` artifact recorded, execution sealed `completed`.
//! 3. **Unknown execution**: evidence for a missing execution is rejected
//!    with `NotFound`.

pub mod desktop;
pub mod scenarios;
pub mod store;

pub use desktop::SimulatedDesktop;
pub use scenarios::SimRuntime;
pub use store::{FsObjectStore, MemoryObjectStore};
