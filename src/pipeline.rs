//! The per-frame transform and rasterize loop.
//!
//! A [`Pipeline`] owns everything one view of one scene needs: the render
//! list, the camera, the framebuffer and the current draw mode. There is no
//! global state, so any number of pipelines can coexist (the tests below
//! build one per case).
//!
//! # Frame Structure
//!
//! [`Pipeline::render_frame`] runs these steps in order:
//!
//! 1. Clear the framebuffer.
//! 2. For each object, in the order it was added, transform every position
//!    by `projection * view` into that object's scratch buffer, keeping the
//!    clip-space position, its `w`, and the screen-space position. Normals
//!    are rotated into view space. The object's own geometry is only read.
//! 3. For each triangle, reject it if it lies entirely outside one frustum
//!    plane, clip it against the near plane if it crosses it, then fill or
//!    outline it according to the [`DrawMode`].
//!
//! Because model-space geometry never changes, moving the camera and
//! rendering again always starts from the original vertices.

use std::ops::ControlFlow;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::batch::VertexBatch;
use crate::camera::Camera;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::framebuffer::{DepthTest, Framebuffer};
use crate::raster::{
    ClipVertex, Fragment, RasterVertex, clip_near, draw_line, project_point, rasterize_triangle,
};
use crate::scene::SceneObject;
use crate::texture::{TextureHandle, TextureSampler};

/// How triangles are turned into pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Unlit fill with vertex, override or texture color.
    Solid,
    /// Lambert lighting with one normal per triangle.
    #[default]
    FaceLit,
    /// Lambert lighting with interpolated vertex normals.
    SmoothLit,
    /// Triangle edges only. No fill, no depth test.
    Wireframe,
}

impl DrawMode {
    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            DrawMode::Solid => DrawMode::FaceLit,
            DrawMode::FaceLit => DrawMode::SmoothLit,
            DrawMode::SmoothLit => DrawMode::Wireframe,
            DrawMode::Wireframe => DrawMode::Solid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawMode::Solid => "solid",
            DrawMode::FaceLit => "face lit",
            DrawMode::SmoothLit => "smooth lit",
            DrawMode::Wireframe => "wireframe",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Discrete requests from the input layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Translate the camera along a world axis by one move step.
    Move { axis: Axis, direction: Direction },
    /// Rotate the camera about one of its local axes: X pitches, Y yaws,
    /// Z rolls.
    Rotate { axis: Axis, direction: Direction },
    /// `Positive` zooms in (narrower view), `Negative` zooms out.
    Zoom(Direction),
    CycleDrawMode,
    Quit,
}

/// Index of an object in a pipeline's render list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Counters for one call to [`Pipeline::render_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub objects: usize,
    /// Triangles submitted, before rejection.
    pub triangles: usize,
    /// Triangles entirely outside the view volume.
    pub rejected: usize,
    /// Triangles that crossed the near plane.
    pub clipped: usize,
    pub degenerate: usize,
    /// Fragments the framebuffer accepted.
    pub fragments: usize,
}

/// Per-object transform output, reused across frames.
#[derive(Debug, Default)]
struct Scratch {
    clip: Vec<Vec4>,
    w: Vec<f32>,
    screen: Vec<Vec3>,
    normals: Vec<Vec3>,
    face_normals: Vec<Vec3>,
}

impl Scratch {
    fn transform(
        &mut self,
        batch: &VertexBatch,
        view_projection: Mat4,
        view_rotation: Mat3,
        size: Vec2,
    ) {
        self.clip.clear();
        self.w.clear();
        self.screen.clear();
        self.normals.clear();
        self.face_normals.clear();

        self.clip
            .extend(batch.positions().iter().map(|p| view_projection * *p));
        self.w.extend(self.clip.iter().map(|c| c.w));
        self.screen
            .extend(self.clip.iter().map(|c| project_point(*c, size).0));
        self.normals
            .extend(batch.normals().iter().map(|n| view_rotation * n.truncate()));
        self.face_normals.extend(
            batch
                .face_normals()
                .iter()
                .map(|n| view_rotation * n.truncate()),
        );
    }
}

/// Everything the fragment stage needs that is fixed for a frame.
struct Shader<'a> {
    mode: DrawMode,
    /// Unit vector towards the light, in view space.
    light: Vec3,
    ambient: f32,
    textures: &'a dyn TextureSampler,
}

/// Per-triangle inputs to the fragment stage.
struct Surface {
    texture: Option<TextureHandle>,
    face_normal: Vec3,
    smooth: bool,
}

impl Shader<'_> {
    fn intensity(&self, normal: Vec3) -> f32 {
        self.ambient + (1.0 - self.ambient) * normal.dot(self.light).max(0.0)
    }

    fn shade(&self, surface: &Surface, fragment: &Fragment) -> Color {
        let mut color = Color::from_vec4(fragment.color);
        if let Some(texture) = surface.texture {
            color = self.textures.sample(texture, fragment.uv).modulate(color);
        }
        match self.mode {
            DrawMode::Solid | DrawMode::Wireframe => color,
            DrawMode::FaceLit => color.scale_rgb(self.intensity(surface.face_normal)),
            DrawMode::SmoothLit => {
                let normal = if surface.smooth {
                    fragment.normal.normalize_or_zero()
                } else {
                    surface.face_normal
                };
                color.scale_rgb(self.intensity(normal))
            }
        }
    }
}

/// A render list, a camera and the framebuffer they draw into.
pub struct Pipeline {
    objects: Vec<SceneObject>,
    scratch: Vec<Scratch>,
    camera: Camera,
    framebuffer: Framebuffer,
    draw_mode: DrawMode,
    light_direction: Vec3,
    ambient: f32,
    move_step: f32,
    rotate_step: f32,
    zoom_step: f32,
}

impl Pipeline {
    /// Builds an empty pipeline. The config is expected to be valid; see
    /// [`RenderConfig::validate`].
    pub fn new(config: &RenderConfig) -> Self {
        let camera = Camera::new()
            .with_fov(config.fov_degrees)
            .with_aspect(config.aspect())
            .with_clip(config.near, config.far);
        Self {
            objects: Vec::new(),
            scratch: Vec::new(),
            camera,
            framebuffer: Framebuffer::new(config.width, config.height, config.background_color()),
            draw_mode: DrawMode::default(),
            light_direction: Vec3::from(config.light_direction).normalize_or_zero(),
            ambient: config.ambient.clamp(0.0, 1.0),
            move_step: config.move_step,
            rotate_step: config.rotate_step,
            zoom_step: config.zoom_step,
        }
    }

    /// Appends to the render list. Objects are drawn in the order added.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        log::info!(
            "added '{}' to render list ({} triangles)",
            object.name(),
            object.triangle_count()
        );
        self.objects.push(object);
        self.scratch.push(Scratch::default());
        ObjectId(self.objects.len() - 1)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// The last rendered frame as packed `0xAARRGGBB` pixels.
    pub fn present(&self) -> &[u32] {
        self.framebuffer.present()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        if mode != self.draw_mode {
            log::debug!("draw mode: {}", mode.name());
        }
        self.draw_mode = mode;
    }

    pub fn cycle_draw_mode(&mut self) {
        self.set_draw_mode(self.draw_mode.next());
    }

    /// World-space direction towards the light.
    pub fn set_light_direction(&mut self, direction: Vec3) {
        self.light_direction = direction.normalize_or_zero();
    }

    /// Applies one input command. Returns `Break` when the viewer should
    /// shut down.
    pub fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Move { axis, direction } => {
                let step = direction.sign() * self.move_step * self.camera.scale();
                self.camera.move_by(axis.unit() * step);
            }
            Command::Rotate { axis, direction } => {
                let angle = direction.sign() * self.rotate_step;
                match axis {
                    Axis::X => self.camera.rotate(angle, 0.0, 0.0),
                    Axis::Y => self.camera.rotate(0.0, angle, 0.0),
                    Axis::Z => self.camera.rotate(0.0, 0.0, angle),
                }
            }
            Command::Zoom(direction) => {
                let factor = match direction {
                    Direction::Positive => 1.0 / self.zoom_step,
                    Direction::Negative => self.zoom_step,
                };
                self.camera.zoom(factor);
                log::debug!("zoom scale: {:.3}", self.camera.scale());
            }
            Command::CycleDrawMode => self.cycle_draw_mode(),
            Command::Quit => {
                log::info!("quit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Clears the framebuffer and draws every object.
    pub fn render_frame(&mut self, textures: &dyn TextureSampler) -> FrameStats {
        self.framebuffer.clear();

        let view_projection = self.camera.view_projection();
        let view_rotation = self.camera.view_rotation();
        let shader = Shader {
            mode: self.draw_mode,
            light: (view_rotation * self.light_direction).normalize_or_zero(),
            ambient: self.ambient,
            textures,
        };
        let size = Vec2::new(
            self.framebuffer.width() as f32,
            self.framebuffer.height() as f32,
        );

        let mut stats = FrameStats {
            objects: self.objects.len(),
            ..Default::default()
        };
        for (object, scratch) in self.objects.iter().zip(&mut self.scratch) {
            scratch.transform(object.batch(), view_projection, view_rotation, size);
            draw_object(&mut self.framebuffer, object, scratch, &shader, size, &mut stats);
        }

        log::trace!(
            "frame: {} triangles, {} rejected, {} clipped, {} degenerate, {} fragments",
            stats.triangles,
            stats.rejected,
            stats.clipped,
            stats.degenerate,
            stats.fragments
        );
        stats
    }
}

/// True when all three clip-space vertices are outside the same frustum
/// plane. The near plane is `z = 0` and the far plane `z = w`.
fn outside_frustum(clip: &[Vec4; 3]) -> bool {
    let all = |test: fn(&Vec4) -> bool| clip.iter().all(test);
    all(|c| c.z < 0.0)
        || all(|c| c.z > c.w)
        || all(|c| c.x < -c.w)
        || all(|c| c.x > c.w)
        || all(|c| c.y < -c.w)
        || all(|c| c.y > c.w)
}

fn draw_object(
    fb: &mut Framebuffer,
    object: &SceneObject,
    scratch: &Scratch,
    shader: &Shader<'_>,
    size: Vec2,
    stats: &mut FrameStats,
) {
    let batch = object.batch();
    let depth_test = match shader.mode {
        DrawMode::Wireframe => DepthTest::Disabled,
        _ => DepthTest::Enabled,
    };

    // Indices were checked against the batch when the object was built.
    for (slot, primitive) in object.primitives().iter().enumerate() {
        stats.triangles += 1;
        let indices = primitive.indices.map(|i| i as usize);
        let clip = indices.map(|i| scratch.clip[i]);
        if outside_frustum(&clip) {
            stats.rejected += 1;
            continue;
        }

        let surface = Surface {
            texture: primitive.texture.filter(|_| batch.has_uvs()),
            face_normal: scratch.face_normals.get(slot).copied().unwrap_or(Vec3::Z),
            smooth: batch.has_normals(),
        };
        let vertices = indices.map(|i| ClipVertex {
            position: scratch.clip[i],
            color: primitive.color.map_or_else(
                || batch.colors().get(i).copied().unwrap_or(Vec4::ONE),
                Color::to_vec4,
            ),
            uv: batch.uvs().get(i).copied().unwrap_or(Vec2::ZERO),
            normal: scratch.normals.get(i).copied().unwrap_or(surface.face_normal),
        });

        if clip.iter().any(|c| c.z < 0.0) {
            stats.clipped += 1;
            let polygon = clip_near(&vertices);
            if shader.mode == DrawMode::Wireframe {
                let outline: Vec<RasterVertex> =
                    polygon.vertices().iter().map(|v| v.project(size)).collect();
                stats.fragments += draw_outline(fb, &outline);
                continue;
            }
            for triangle in polygon.triangles() {
                let projected = triangle.map(|v| v.project(size));
                fill(fb, &projected, depth_test, shader, &surface, stats);
            }
        } else {
            let projected = [0usize, 1, 2].map(|k| {
                let i = indices[k];
                RasterVertex {
                    position: scratch.screen[i],
                    inv_w: 1.0 / scratch.w[i],
                    color: vertices[k].color,
                    uv: vertices[k].uv,
                    normal: vertices[k].normal,
                }
            });
            if shader.mode == DrawMode::Wireframe {
                stats.fragments += draw_outline(fb, &projected);
            } else {
                fill(fb, &projected, depth_test, shader, &surface, stats);
            }
        }
    }
}

fn fill(
    fb: &mut Framebuffer,
    triangle: &[RasterVertex; 3],
    depth_test: DepthTest,
    shader: &Shader<'_>,
    surface: &Surface,
    stats: &mut FrameStats,
) {
    let result = rasterize_triangle(fb, triangle, depth_test, |fragment| {
        shader.shade(surface, fragment)
    });
    stats.degenerate += usize::from(result.degenerate);
    stats.fragments += result.written as usize;
}

/// Closed polyline through the projected vertices.
fn draw_outline(fb: &mut Framebuffer, vertices: &[RasterVertex]) -> usize {
    let mut written = 0;
    for (k, a) in vertices.iter().enumerate() {
        let b = &vertices[(k + 1) % vertices.len()];
        written += draw_line(
            fb,
            a.position.truncate(),
            b.position.truncate(),
            Color::from_vec4(a.color),
            Color::from_vec4(b.color),
        ) as usize;
    }
    written
}
