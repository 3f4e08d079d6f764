// Domain models

mod counters;
mod device;
mod frame;

pub use counters::{CounterSnapshot, TrackedCounter};
pub use device::Device;
pub use frame::{DeviceThroughput, ThroughputFrame};
