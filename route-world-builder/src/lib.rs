/// GPS track to 3D world: route polyline, road ribbon and route-following terrain
pub mod bounds;
pub mod config;
pub mod coupling;
pub mod crossfall;
pub mod dds_writer;
pub mod error;
pub mod export;
pub mod geo;
pub mod gpx_track;
pub mod heightmap;
pub mod manifest;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod polyline;
pub mod raycast;
pub mod relaxation;
pub mod route_index;
#[cfg(feature = "bevy")]
pub mod sink;
pub mod undulation;

pub use config::{GenerationConfig, TerrainParams};
pub use error::{BuildError, Result};
pub use geo::GeoPoint;
pub use pipeline::{GeneratedWorld, WorldBuilder};
