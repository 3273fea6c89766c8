pub mod acquisition;

pub use acquisition::{InitReport, SensorSuite, SensorTick};
