//! Domain model: lessons, targets and the bottlenecks found in their schedules.

pub mod bottleneck;
pub mod lesson;
pub mod macros;
pub mod request;
pub mod target;

pub use bottleneck::*;
pub use lesson::*;
pub use request::*;
pub use target::*;
