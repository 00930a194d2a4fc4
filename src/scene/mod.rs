//! Scene assembly and the per-frame render loop.

use thiserror::Error;

use crate::camera::PerspectiveCamera;
use crate::config::SceneSettings;
use crate::core::{Context, ContextError, FrameScheduler, RenderConfig, SchedulerState};
use crate::environment::GradientSky;
use crate::loaders::{LoadError, SeedMesh};
use crate::particles::{ComputeInitError, FeedbackCompute, ParticleSwarm, StateDebugView};
use crate::starfield::Starfield;

/// Fatal startup errors. None of these are retried.
#[derive(Error, Debug)]
pub enum SceneInitError {
    /// GPU context creation failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The compute engine could not be set up.
    #[error(transparent)]
    Compute(#[from] ComputeInitError),

    /// The seed mesh was missing or unusable.
    #[error(transparent)]
    Mesh(#[from] LoadError),
}

/// The complete particle scene.
///
/// Owns the GPU context and every pass. The host drives it with three calls:
/// [`render`](FlowScene::render) once per frame, [`resize`](FlowScene::resize)
/// on viewport changes, and [`set_visible`](FlowScene::set_visible) on
/// visibility changes.
pub struct FlowScene {
    context: Context,
    settings: SceneSettings,
    scheduler: FrameScheduler,
    camera: PerspectiveCamera,
    compute: FeedbackCompute,
    swarm: ParticleSwarm,
    starfield: Starfield,
    sky: GradientSky,
    debug_view: StateDebugView,
    clear_color: wgpu::Color,
}

impl FlowScene {
    /// Create the scene from a window handle and a seed mesh.
    ///
    /// # Safety
    /// The window must outlive the scene.
    pub async fn new<W>(
        window: W,
        width: u32,
        height: u32,
        mesh: SeedMesh,
        config: RenderConfig,
    ) -> Result<Self, SceneInitError>
    where
        W: Into<wgpu::SurfaceTarget<'static>>,
    {
        let context = Context::new(window, width, height, &config).await?;

        let compute = FeedbackCompute::new(&context.device, &context.queue, &mesh)?;
        let swarm = ParticleSwarm::new(
            &context.device,
            &mesh,
            compute.grid_size(),
            compute.targets().views(),
            context.surface_format,
        );
        let starfield = Starfield::new(&context.device, context.surface_format);
        let sky = GradientSky::new(&context.device, &context.queue, context.surface_format);
        let debug_view =
            StateDebugView::new(&context.device, compute.targets(), context.surface_format);

        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(context.aspect_ratio());

        log::info!(
            "scene ready: {} particles, {} stars",
            swarm.particle_count(),
            starfield.star_count()
        );

        Ok(Self {
            context,
            settings: SceneSettings::default(),
            scheduler: FrameScheduler::new(),
            camera,
            compute,
            swarm,
            starfield,
            sky,
            debug_view,
            clear_color: config.clear_color,
        })
    }

    /// Advance the simulation and render one frame.
    ///
    /// While paused this is a no-op. The compute dispatch and the draws that
    /// read its output are recorded into a single command stream, so the
    /// ping-pong data dependency orders them without any host-side waiting.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(timing) = self.scheduler.begin_frame() else {
            return Ok(());
        };
        let settings = self.settings.snapshot();

        let frame = self.context.get_current_texture()?;
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let resolution = [self.context.width as f32, self.context.height as f32];
        self.swarm.update_uniforms(
            &self.context.queue,
            &self.camera,
            resolution,
            &settings,
            timing.elapsed,
            self.compute.grid_size(),
        );
        self.starfield
            .update_uniforms(&self.context.queue, &self.camera, resolution, timing.elapsed);

        let mut encoder = self.context.create_command_encoder();

        self.compute
            .step(&mut encoder, &self.context.queue, &timing, &settings);
        let current = self.compute.targets().current_index();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.sky.draw(&mut pass);
            self.swarm.draw(&mut pass, current);
            if settings.show_starfield {
                self.starfield.draw(&mut pass);
            }
            if settings.show_state_debug {
                self.debug_view.draw(&mut pass, current);
            }
        }

        self.context.submit(Some(encoder.finish()));
        frame.present();

        Ok(())
    }

    /// Handle a viewport resize (physical pixels).
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.camera.set_aspect(self.context.aspect_ratio());
    }

    /// Apply a host visibility change; hiding pauses the simulation clock.
    pub fn set_visible(&mut self, visible: bool) {
        self.scheduler.set_visible(visible);
    }

    /// Whether the scene is currently producing frames.
    pub fn is_running(&self) -> bool {
        self.scheduler.state() == SchedulerState::Running
    }

    /// The tunable settings (control surface).
    #[inline]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Mutable access to the tunable settings.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        &mut self.settings
    }

    /// The camera.
    #[inline]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Mutable access to the camera (for host-side orbit controls).
    #[inline]
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    /// The GPU context.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }
}
