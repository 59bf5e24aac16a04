//! Incremental tube-stroke geometry.

pub use self::arena::FixedArena;
pub use self::color_mode::{ColorMode, RAINBOW_PERIOD};
pub use self::config::StrokeConfig;
pub use self::mesh::{AddPoint, MeshSnapshot, SharedStrokeMesh, StrokeMesh};

mod arena;
mod color_mode;
mod config;
mod mesh;
pub mod ring;
