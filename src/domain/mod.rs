// Domain layer: product/analysis models and the ports (traits) the pipeline depends on.

pub mod model;
pub mod ports;
