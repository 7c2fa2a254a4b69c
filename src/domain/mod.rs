// Domain layer: card data value types and the ports the pipeline talks through.

pub mod model;
pub mod ports;
