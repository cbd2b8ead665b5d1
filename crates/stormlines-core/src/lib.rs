pub mod ambient;
pub mod audio;
pub mod bus;
pub mod config;
pub mod constants;
pub mod lightning;
pub mod path;
pub mod random;
pub mod scene;
pub mod surface;

pub use ambient::*;
pub use audio::*;
pub use bus::*;
pub use config::*;
pub use lightning::*;
pub use path::*;
pub use scene::*;
pub use surface::*;

/// Point type shared by paths and lightning.
pub use glam::Vec2;
