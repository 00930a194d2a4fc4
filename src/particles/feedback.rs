//! Feedback buffer compute engine.
//!
//! Per-particle state lives in a pair of square `Rgba32Float` textures (one
//! texel per particle: position in rgb, lifetime phase in alpha). Every frame
//! one compute dispatch reads the texture holding the previous state and
//! storage-writes the next state into the other, then the pair's current
//! index flips. The input texture is never written by the pass that reads it,
//! which is what makes the ping-pong safe.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::config::SceneSettings;
use crate::core::FrameTiming;
use crate::loaders::SeedMesh;

/// Compute workgroup side length; dispatches cover the grid in 8x8 tiles.
const WORKGROUP_SIZE: u32 = 8;

/// Errors raised while setting up the compute engine. All are fatal.
#[derive(Error, Debug)]
pub enum ComputeInitError {
    /// The seed mesh produced zero particles.
    #[error("Particle count must be non-zero")]
    EmptyParticleSet,

    /// The state texture would exceed the device's texture size limit.
    #[error("State texture side {side} exceeds device limit {limit}")]
    GridTooLarge {
        /// Required texture side length.
        side: u32,
        /// Device limit for 2D textures.
        limit: u32,
    },
}

/// Smallest integer `n` with `n * n >= count`.
pub fn grid_size_for(count: u32) -> u32 {
    let mut side = (count as f64).sqrt().ceil() as u32;
    while side as u64 * (side as u64) < count as u64 {
        side += 1;
    }
    side
}

/// Simulation uniforms, mirrored by `SimUniform` in the compute shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SimUniform {
    time: f32,
    delta_time: f32,
    influence: f32,
    strength: f32,
    frequency: f32,
    cycle_duration: f32,
    grid_size: u32,
    particle_count: u32,
}

/// The ping-pong state texture pair.
///
/// Exactly one texture is the readable current result at any time, tracked by
/// an explicit index rather than by swapping handles.
pub struct StateTargets {
    #[allow(dead_code)]
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    current: usize,
}

impl StateTargets {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, side: u32, seed_data: &[f32]) -> Self {
        let descriptor = wgpu::TextureDescriptor {
            label: Some("Particle State Texture"),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };

        // Both targets start from the seed state so the first frame reads
        // valid data regardless of orientation.
        let textures = [0, 1].map(|_| {
            device.create_texture_with_data(
                queue,
                &descriptor,
                wgpu::util::TextureDataOrder::LayerMajor,
                bytemuck::cast_slice(seed_data),
            )
        });
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];

        Self {
            textures,
            views,
            current: 0,
        }
    }

    /// Index of the texture holding the most recently written state.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// View of the texture holding the most recently written state.
    #[inline]
    pub fn current_view(&self) -> &wgpu::TextureView {
        &self.views[self.current]
    }

    /// Views of both textures, indexed by [`current_index`](Self::current_index).
    #[inline]
    pub fn views(&self) -> [&wgpu::TextureView; 2] {
        [&self.views[0], &self.views[1]]
    }

    fn swap(&mut self) {
        self.current ^= 1;
    }
}

/// Runs the flow-field compute pass over the particle state each frame.
pub struct FeedbackCompute {
    grid_size: u32,
    particle_count: u32,
    targets: StateTargets,
    #[allow(dead_code)]
    base_texture: wgpu::Texture,
    sim_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    /// `bind_groups[i]` reads texture `i` and writes texture `1 - i`.
    bind_groups: [wgpu::BindGroup; 2],
}

impl FeedbackCompute {
    /// Create the compute engine, seeding the base and state textures from
    /// the mesh. Fails fatally rather than silently skipping frames.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mesh: &SeedMesh,
    ) -> Result<Self, ComputeInitError> {
        let particle_count = mesh.len() as u32;
        if particle_count == 0 {
            return Err(ComputeInitError::EmptyParticleSet);
        }

        let grid_size = grid_size_for(particle_count);
        let limit = device.limits().max_texture_dimension_2d;
        if grid_size > limit {
            return Err(ComputeInitError::GridTooLarge {
                side: grid_size,
                limit,
            });
        }

        log::info!(
            "feedback compute: {} particles in a {}x{} state grid",
            particle_count,
            grid_size,
            grid_size
        );

        // Rest position in rgb, per-particle random seed in alpha. Texels past
        // the particle count exist but are never drawn.
        let mut rng = rand::thread_rng();
        let mut seed_data = vec![0.0f32; (grid_size * grid_size * 4) as usize];
        for (i, position) in mesh.positions().iter().enumerate() {
            let texel = &mut seed_data[i * 4..i * 4 + 4];
            texel[..3].copy_from_slice(position);
            texel[3] = rng.gen::<f32>();
        }

        let base_texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Particle Base Texture"),
                size: wgpu::Extent3d {
                    width: grid_size,
                    height: grid_size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&seed_data),
        );
        let base_view = base_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let targets = StateTargets::new(device, queue, grid_size, &seed_data);

        let sim_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SimUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Feedback Compute Layout"),
                entries: &[
                    // Previous state
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Base particles
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Next state
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba32Float,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    // Simulation uniforms
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let bind_groups = [0usize, 1].map(|read| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Feedback Compute Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.views[read]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&base_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&targets.views[1 - read]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: sim_buffer.as_entire_binding(),
                    },
                ],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flow Field Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../shaders/flow_field_compute.wgsl").into(),
            ),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Feedback Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Flow Field Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            grid_size,
            particle_count,
            targets,
            base_texture,
            sim_buffer,
            pipeline,
            bind_groups,
        })
    }

    /// Advance the particle state by one frame.
    ///
    /// Reads the current state texture, writes the other, then flips the
    /// current index so render passes recorded afterwards consume the new
    /// state. The command-stream ordering is the only synchronization needed.
    pub fn step(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        timing: &FrameTiming,
        settings: &SceneSettings,
    ) {
        let uniform = SimUniform {
            time: timing.elapsed,
            delta_time: timing.delta,
            influence: settings.flow_field_influence(),
            strength: settings.flow_field_strength(),
            frequency: settings.flow_field_frequency(),
            cycle_duration: settings.lifetime_cycle(),
            grid_size: self.grid_size,
            particle_count: self.particle_count,
        };
        queue.write_buffer(&self.sim_buffer, 0, bytemuck::cast_slice(&[uniform]));

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flow Field Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.targets.current_index()], &[]);
            let groups = (self.grid_size + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
            pass.dispatch_workgroups(groups, groups, 1);
        }

        self.targets.swap();
    }

    /// Side length of the square state grid.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of live particles (always <= grid area).
    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// The ping-pong targets.
    #[inline]
    pub fn targets(&self) -> &StateTargets {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_is_next_integer_square() {
        assert_eq!(grid_size_for(1), 1);
        assert_eq!(grid_size_for(2), 2);
        assert_eq!(grid_size_for(4), 2);
        assert_eq!(grid_size_for(5), 3);
        assert_eq!(grid_size_for(10_000), 100);
        assert_eq!(grid_size_for(10_001), 101);
    }

    #[test]
    fn grid_always_fits_particle_count() {
        for count in [1, 3, 99, 100, 101, 4095, 4096, 4097, 1_000_000] {
            let side = grid_size_for(count);
            assert!(side * side >= count);
            assert!((side - 1) * (side - 1) < count);
        }
    }

    #[test]
    fn sim_uniform_has_uniform_buffer_layout() {
        assert_eq!(std::mem::size_of::<SimUniform>(), 32);
        assert_eq!(std::mem::size_of::<SimUniform>() % 16, 0);
    }
}
