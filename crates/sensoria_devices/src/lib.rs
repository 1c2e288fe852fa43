pub mod adapters;
pub mod fanout;
pub mod port;
pub mod registry;

pub use adapters::SimulatedDevice;
pub use fanout::{BroadcastContent, FanOut, FanOutConfig};
pub use port::{DeviceError, DevicePayload, DevicePort, OutboundEvent};
pub use registry::{DeviceRegistry, RegisteredDevice};
