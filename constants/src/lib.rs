/// Shared tuning tables for route-to-terrain generation
pub mod detail;
pub mod geo;
pub mod road;
pub mod terrain;
