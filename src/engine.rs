pub mod animation;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod scheduler;
pub mod session;

pub use animation::{Pose, SettleAnimation};
pub use controller::{
    DragController, DragOptions, DragStats, DropEvent, DropHandler, KeyCode, ZoneSource,
};
pub use error::DragError;
pub use geometry::{point_after, point_in_bounds, Axis, Point, Rect, Size};
pub use scheduler::{Clock, FrameScheduler, ManualClock, SystemClock, TaskId};
pub use session::{DragPhase, DropOutcome};

#[cfg(test)]
mod tests;
