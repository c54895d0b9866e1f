//! # Tessera
//!
//! **A CPU software rasterizer: vertex batches in, packed pixels out.**
//!
//! Geometry lives in [`SceneObject`]s. A [`Pipeline`] transforms them
//! through a [`Camera`], clips against the view volume, and fills or
//! outlines every triangle into a [`Framebuffer`] of `0xAARRGGBB` pixels.
//! The GPU is only used to show the result in a window.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessera::*;
//!
//! fn main() -> Result<(), AppError> {
//!     init_logging(LoggingConfig::default());
//!
//!     let config = RenderConfig::new().title("Cube");
//!     let mut pipeline = Pipeline::new(&config);
//!     pipeline.add_object(primitives::cube()?);
//!
//!     run(config, pipeline, TextureCache::new())
//! }
//! ```
//!
//! Rendering does not need a window at all:
//!
//! ```
//! use tessera::*;
//!
//! let mut pipeline = Pipeline::new(&RenderConfig::new().size(64, 64));
//! pipeline.add_object(primitives::triangle().unwrap());
//! let stats = pipeline.render_frame(&NoTextures);
//! assert_eq!(stats.triangles, 1);
//! assert_eq!(pipeline.present().len(), 64 * 64);
//! ```

mod app;
mod assets;
mod batch;
mod camera;
mod color;
mod config;
mod display;
mod error;
mod framebuffer;
mod input;
mod logging;
mod pipeline;
pub mod primitives;
pub mod raster;
mod scene;
mod texture;

pub use app::run;
pub use assets::AssetLoader;
pub use batch::{Vertex, VertexBatch};
pub use camera::{Camera, MAX_SCALE, MIN_SCALE};
pub use color::Color;
pub use config::RenderConfig;
pub use display::{FramebufferBlit, GpuContext};
pub use error::{AppError, ConfigError, DisplayError, GeometryError};
pub use framebuffer::{DepthTest, FAR_DEPTH, Framebuffer};
pub use input::Input;
pub use logging::{LoggingConfig, init_logging};
pub use pipeline::{Axis, Command, Direction, DrawMode, FrameStats, ObjectId, Pipeline};
pub use scene::{Primitive, SceneObject};
pub use texture::{FALLBACK_COLOR, NoTextures, Texture, TextureCache, TextureHandle, TextureSampler};

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
