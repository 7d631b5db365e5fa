// Domain layer: models, boundary requests and ports (interfaces).

pub mod model;
pub mod ports;
pub mod requests;
