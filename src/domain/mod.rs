// Domain layer: conference models and the ports the importer talks to.

pub mod model;
pub mod ports;
