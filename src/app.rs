use std::ops::ControlFlow as Flow;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::RenderConfig;
use crate::display::{FramebufferBlit, GpuContext};
use crate::error::AppError;
use crate::input::Input;
use crate::pipeline::Pipeline;
use crate::texture::TextureCache;

/// Opens a window and runs the interactive viewer until it is closed or
/// `Escape` is pressed.
///
/// The window is sized from `config`; the framebuffer keeps the size the
/// pipeline was built with and is scaled to fit.
///
/// # Example
/// ```ignore
/// let config = tessera::RenderConfig::new().title("Viewer");
/// let mut pipeline = tessera::Pipeline::new(&config);
/// pipeline.add_object(tessera::primitives::cube()?);
/// tessera::run(config, pipeline, tessera::TextureCache::new())?;
/// ```
pub fn run(
    config: RenderConfig,
    pipeline: Pipeline,
    textures: TextureCache,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Viewer {
        state: ViewerState::Pending {
            config,
            pipeline,
            textures,
        },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Viewer {
    state: ViewerState,
    /// Set when window or GPU setup fails; reported once the loop exits.
    error: Option<AppError>,
}

enum ViewerState {
    Pending {
        config: RenderConfig,
        pipeline: Pipeline,
        textures: TextureCache,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        blit: FramebufferBlit,
        pipeline: Pipeline,
        textures: TextureCache,
        input: Input,
        last_frame: Instant,
    },
    Finished,
}

fn start(
    event_loop: &ActiveEventLoop,
    config: &RenderConfig,
    pipeline: &Pipeline,
) -> Result<(Arc<Window>, GpuContext, FramebufferBlit), AppError> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = Arc::new(event_loop.create_window(window_attrs)?);
    let gpu = GpuContext::new(window.clone())?;
    let framebuffer = pipeline.framebuffer();
    let blit = FramebufferBlit::new(&gpu, framebuffer.width(), framebuffer.height());
    log::info!(
        "viewer started: {}x{} framebuffer, {} objects",
        framebuffer.width(),
        framebuffer.height(),
        pipeline.objects().len()
    );
    Ok((window, gpu, blit))
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, ViewerState::Pending { .. }) {
            return;
        }
        let ViewerState::Pending {
            config,
            pipeline,
            textures,
        } = std::mem::replace(&mut self.state, ViewerState::Finished)
        else {
            return;
        };

        match start(event_loop, &config, &pipeline) {
            Ok((window, gpu, blit)) => {
                window.request_redraw();
                self.state = ViewerState::Running {
                    window,
                    gpu,
                    blit,
                    pipeline,
                    textures,
                    input: Input::new(),
                    last_frame: Instant::now(),
                };
            }
            Err(e) => {
                log::error!("viewer setup failed: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerState::Running {
            window,
            gpu,
            blit,
            pipeline,
            textures,
            input,
            last_frame,
        } = &mut self.state
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                for command in input.commands() {
                    if let Flow::Break(()) = pipeline.apply(command) {
                        event_loop.exit();
                        return;
                    }
                }

                let stats = pipeline.render_frame(&*textures);
                blit.present(gpu, pipeline.present());

                let now = Instant::now();
                log::trace!(
                    "frame {:.2} ms: {} triangles, {} rejected, {} clipped, {} fragments",
                    now.duration_since(*last_frame).as_secs_f64() * 1000.0,
                    stats.triangles,
                    stats.rejected,
                    stats.clipped,
                    stats.fragments
                );
                *last_frame = now;

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
