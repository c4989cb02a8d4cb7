/// Error taxonomy for route-to-world generation
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse GPX track: {0}")]
    GpxParse(String),
    #[error("no track points found in GPX")]
    EmptyTrack,
    #[error("route is too short: {points} point(s), need at least 2")]
    RouteTooShort { points: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to write DDS texture: {0}")]
    Dds(#[from] ddsfile::Error),
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, BuildError>;
