/// Storm-surge warning service.
///
/// Turns an ADCIRC storm-surge run (grid, maximum elevations, optional
/// elevation time series) and administrative boundaries into per-town
/// warnings, neighbor notifications, earliest-onset times and colour-coded
/// maps.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod geometry;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod verify;
