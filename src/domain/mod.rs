// Domain layer: sensor/cart models and the ports the stream core talks through.
// Only std/serde here; adapters live under crate::adapters.

pub mod model;
pub mod ports;
