//! Particle render path.
//!
//! Positions are not in a vertex buffer: each instance carries a fixed UV
//! pointing at its texel in the state texture and the vertex stage loads the
//! position from there. wgpu has no sized point primitive, so each particle
//! is a camera-facing 4-vertex triangle strip whose corners are offset in
//! clip space by the point size.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;
use crate::config::SceneSettings;
use crate::loaders::SeedMesh;

/// Uniforms mirrored by `SwarmUniform` in the particle shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SwarmUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    resolution: [f32; 2],
    base_size: f32,
    time: f32,
    grid_size: u32,
    _pad: [u32; 3],
}

/// Fixed mapping from particle index to its texel center in the state grid.
fn build_uv_grid(count: u32, grid_size: u32) -> Vec<[f32; 2]> {
    let side = grid_size as f32;
    (0..count)
        .map(|i| {
            let x = i % grid_size;
            let y = i / grid_size;
            [(x as f32 + 0.5) / side, (y as f32 + 0.5) / side]
        })
        .collect()
}

/// Draws the particle swarm from the current state texture.
pub struct ParticleSwarm {
    particle_count: u32,
    pipeline: wgpu::RenderPipeline,
    uv_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    size_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    /// One bind group per state texture, indexed by the pair's current index.
    state_bind_groups: [wgpu::BindGroup; 2],
}

impl ParticleSwarm {
    /// Create the swarm render path.
    ///
    /// `state_views` are both ping-pong texture views in index order;
    /// `grid_size` is the state grid side. Colors come from the seed mesh,
    /// per-particle sizes are randomized once here.
    pub fn new(
        device: &wgpu::Device,
        mesh: &SeedMesh,
        grid_size: u32,
        state_views: [&wgpu::TextureView; 2],
        format: wgpu::TextureFormat,
    ) -> Self {
        let particle_count = mesh.len() as u32;

        let uvs = build_uv_grid(particle_count, grid_size);
        let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle UV Buffer"),
            contents: bytemuck::cast_slice(&uvs),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Color Buffer"),
            contents: bytemuck::cast_slice(mesh.colors()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut rng = rand::thread_rng();
        let sizes: Vec<f32> = (0..particle_count).map(|_| rng.gen::<f32>()).collect();
        let size_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Size Buffer"),
            contents: bytemuck::cast_slice(&sizes),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Swarm Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SwarmUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Swarm Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // State texture, read with textureLoad (no filtering).
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let state_bind_groups = [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Swarm State Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(state_views[i]),
                    },
                ],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Render Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/particles.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Swarm Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Additive blend, no depth write: overlapping particles accumulate
        // brightness and never occlude.
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Swarm Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 8,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 4,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![2 => Float32],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            particle_count,
            pipeline,
            uv_buffer,
            color_buffer,
            size_buffer,
            uniform_buffer,
            state_bind_groups,
        }
    }

    /// Update the per-frame uniforms.
    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        camera: &PerspectiveCamera,
        resolution: [f32; 2],
        settings: &SceneSettings,
        time: f32,
        grid_size: u32,
    ) {
        let uniform = SwarmUniform {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            resolution,
            base_size: settings.particle_base_size(),
            time,
            grid_size,
            _pad: [0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Draw the swarm, reading positions from the state texture at
    /// `current_index`. Draws exactly one quad per particle, never the padded
    /// grid remainder.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, current_index: usize) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.state_bind_groups[current_index], &[]);
        pass.set_vertex_buffer(0, self.uv_buffer.slice(..));
        pass.set_vertex_buffer(1, self.color_buffer.slice(..));
        pass.set_vertex_buffer(2, self.size_buffer.slice(..));
        pass.draw(0..4, 0..self.particle_count);
    }

    /// Number of drawn particles.
    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::grid_size_for;

    #[test]
    fn uv_grid_maps_indices_to_texel_centers() {
        let uvs = build_uv_grid(5, 3);
        assert_eq!(uvs.len(), 5);
        // First texel center of a 3x3 grid.
        assert_eq!(uvs[0], [0.5 / 3.0, 0.5 / 3.0]);
        // Index 4 -> column 1, row 1.
        assert_eq!(uvs[4], [1.5 / 3.0, 1.5 / 3.0]);
    }

    #[test]
    fn draw_range_never_exceeds_particle_count() {
        // The backing grid rounds up to a full square, the instance list
        // does not.
        for count in [1u32, 7, 100, 10_001] {
            let side = grid_size_for(count);
            let uvs = build_uv_grid(count, side);
            assert_eq!(uvs.len() as u32, count);
            assert!(side * side >= count);
        }
    }

    #[test]
    fn uvs_stay_inside_unit_square() {
        for uv in build_uv_grid(10_001, grid_size_for(10_001)) {
            assert!(uv[0] > 0.0 && uv[0] < 1.0);
            assert!(uv[1] > 0.0 && uv[1] < 1.0);
        }
    }

    #[test]
    fn swarm_uniform_has_uniform_buffer_layout() {
        assert_eq!(std::mem::size_of::<SwarmUniform>(), 160);
        assert_eq!(std::mem::size_of::<SwarmUniform>() % 16, 0);
    }
}
