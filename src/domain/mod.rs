// Domain layer: relay payload types and the ports the service depends on.

pub mod model;
pub mod ports;
