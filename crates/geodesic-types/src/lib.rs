// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Types
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! State points, distance modes, diagnostics, configuration and the
//! error hierarchy shared by the geodesic kernel crates.

pub mod config;
pub mod error;
pub mod result;
pub mod state;

pub use config::{
    ChristoffelConfig, DerivativeScheme, EngineConfig, GeoConfig, LineConfig, StrictConfig,
};
pub use error::{GeodesicError, GeodesicResult};
pub use result::{
    BackendStats, Diagnostics, DistanceMode, DistanceResult, GeoStats, GeodesicPath, LineStats,
    NormalizedDistance, ShootStats,
};
pub use state::{clamp_embedded, clamp_unit, Christoffel, Matrix4, StatePoint, Vector4, DIM};
