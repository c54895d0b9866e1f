//! Interactive viewer.
//!
//! ```text
//! tessera [config.toml] [object ...]
//! ```
//!
//! With no objects named, shows a translucent red quad over an opaque blue
//! one next to a textured cube (`./assets/texture.png`, or a checkerboard
//! when that file is missing). Named objects are loaded through
//! [`AssetLoader`] from `./assets` (built-in shapes or `.stl` files).

use std::process::ExitCode;

use tessera::{
    AppError, AssetLoader, Color, LoggingConfig, Pipeline, RenderConfig, Texture, TextureCache,
    Vec2, Vec3, init_logging, primitives, run,
};

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match viewer(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn viewer(args: Vec<String>) -> Result<(), AppError> {
    let (config, names) = match args.split_first() {
        Some((first, rest)) if first.ends_with(".toml") => {
            log::info!("loading config from {first}");
            (RenderConfig::load(first)?, rest)
        }
        _ => (RenderConfig::default(), args.as_slice()),
    };

    let loader = AssetLoader::new("assets").centered().normalized();

    let mut textures = TextureCache::new();
    let texture_path = loader.root().join("texture.png");
    let cube_texture = match textures.load(&texture_path) {
        Ok(handle) => handle,
        Err(e) => {
            log::debug!("{}: {e}; using a checkerboard", texture_path.display());
            textures.insert(Texture::checkerboard(
                64,
                8,
                Color::WHITE,
                Color::rgb(0.3, 0.3, 0.35),
            ))
        }
    };

    let mut pipeline = Pipeline::new(&config);
    if names.is_empty() {
        pipeline.add_object(primitives::quad(
            Vec3::new(-0.6, 0.0, -1.0),
            Vec2::splat(1.5),
            Color::BLUE,
        )?);
        pipeline.add_object(primitives::quad(
            Vec3::new(-0.2, 0.3, 0.0),
            Vec2::splat(1.5),
            Color::RED.with_alpha(0.1),
        )?);
        pipeline.add_object(
            primitives::cube()?
                .with_texture(cube_texture)
                .translated(Vec3::new(1.2, 0.0, 0.0)),
        );
    } else {
        for name in names {
            pipeline.add_object(loader.load_object(name)?);
        }
    }

    run(config, pipeline, textures)
}
