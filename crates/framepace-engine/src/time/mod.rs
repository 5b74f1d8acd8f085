//! Time subsystem.
//!
//! Provides the monotonic clock and the layered wait loop used to land a frame
//! on its pacing deadline. Both sit behind small traits so the scheduler can
//! be driven by a manual clock in tests.
//! Intended usage:
//! - one `ClockSource` per scheduler
//! - one `PacingWaiter::wait_until` per paced frame

mod clock;
mod millis;
mod wait;

pub use clock::{ClockSource, InstantTicks, TickSource, MICROS_PER_SECOND};
pub use millis::system_millis;
pub use wait::{pacing_deadline, OsWait, PacingMargins, PacingWaiter, ThreadWait, MAX_LAG_FRAMES};
