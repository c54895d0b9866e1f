//! Error types shared across the crate.
//!
//! Each concern gets its own enum so callers can match on what actually went
//! wrong: geometry problems are loader-time contract violations, config and
//! display errors come from the outside world.

/// Errors raised while building or loading geometry.
///
/// These are loader-time failures: a [`SceneObject`](crate::SceneObject) that
/// would carry malformed data is rejected before it reaches the rasterizer.
#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    /// A populated vertex column does not match the position count.
    #[error("column '{column}' has {found} entries, expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        found: usize,
    },

    /// A primitive references a vertex that does not exist.
    #[error("primitive {primitive} references vertex {index} but the batch has {vertex_count}")]
    IndexOutOfRange {
        primitive: usize,
        index: u32,
        vertex_count: usize,
    },

    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File format could not be determined from the extension.
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),

    /// The geometry data was invalid or corrupt.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors raised while reading a [`RenderConfig`](crate::RenderConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    /// A value was syntactically fine but cannot drive the renderer.
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Errors raised by the window presentation layer.
#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Errors that end the interactive viewer.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
