//! Twinkling starfield backdrop.
//!
//! A static point cloud on a spherical shell. Each star carries a random size
//! and twinkle phase baked at generation time; the only per-frame input is
//! the elapsed time. Entirely independent of the particle compute engine.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;

/// Default number of stars.
pub const STAR_COUNT: u32 = 1200;

/// Shell radius range.
pub const MIN_RADIUS: f32 = 25.0;
/// Shell radius range.
pub const MAX_RADIUS: f32 = 75.0;

/// One star's immutable attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct StarPoint {
    /// World position on the shell.
    pub position: [f32; 3],
    /// Random size scalar in `[0, 1)`.
    pub size: f32,
    /// Random twinkle phase in `[0, 2*pi)`.
    pub phase: f32,
}

/// Generate stars uniformly distributed over a spherical shell.
pub fn generate_stars<R: Rng>(rng: &mut R, count: u32) -> Vec<StarPoint> {
    (0..count)
        .map(|_| {
            let radius = MIN_RADIUS + rng.gen::<f32>() * (MAX_RADIUS - MIN_RADIUS);
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            // acos of a uniform value in [-1, 1] avoids pole clustering.
            let phi = (rng.gen::<f32>() * 2.0 - 1.0).acos();

            StarPoint {
                position: [
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                ],
                size: rng.gen::<f32>(),
                phase: rng.gen::<f32>() * std::f32::consts::TAU,
            }
        })
        .collect()
}

/// Uniforms mirrored by `StarUniform` in the starfield shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct StarUniform {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    resolution: [f32; 2],
    time: f32,
    _pad: f32,
}

/// The starfield render pass.
pub struct Starfield {
    star_count: u32,
    pipeline: wgpu::RenderPipeline,
    star_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Starfield {
    /// Create the starfield with the default star count.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self::with_count(device, format, STAR_COUNT)
    }

    /// Create the starfield with a custom star count.
    pub fn with_count(device: &wgpu::Device, format: wgpu::TextureFormat, count: u32) -> Self {
        let mut rng = rand::thread_rng();
        let stars = generate_stars(&mut rng, count);

        let star_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Buffer"),
            contents: bytemuck::cast_slice(&stars),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Uniform Buffer"),
            contents: bytemuck::cast_slice(&[StarUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Starfield Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Starfield Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Starfield Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/starfield.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Starfield Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

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
            label: Some("Starfield Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarPoint>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32,
                    ],
                }],
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
            star_count: count,
            pipeline,
            star_buffer,
            uniform_buffer,
            bind_group,
        }
    }

    /// Update the per-frame uniforms.
    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        camera: &PerspectiveCamera,
        resolution: [f32; 2],
        time: f32,
    ) {
        let uniform = StarUniform {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            resolution,
            time,
            _pad: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Draw all stars.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.star_buffer.slice(..));
        pass.draw(0..4, 0..self.star_count);
    }

    /// Number of stars.
    #[inline]
    pub fn star_count(&self) -> u32 {
        self.star_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn all_star_radii_fall_within_the_shell() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let stars = generate_stars(&mut rng, 1200);
        assert_eq!(stars.len(), 1200);

        for star in &stars {
            let [x, y, z] = star.position;
            let radius = (x * x + y * y + z * z).sqrt();
            assert!(
                (MIN_RADIUS..=MAX_RADIUS).contains(&radius),
                "radius {radius} outside [{MIN_RADIUS}, {MAX_RADIUS}]"
            );
        }
    }

    #[test]
    fn star_attributes_are_in_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        for star in generate_stars(&mut rng, 1200) {
            assert!((0.0..1.0).contains(&star.size));
            assert!((0.0..std::f32::consts::TAU).contains(&star.phase));
        }
    }

    #[test]
    fn stars_cover_both_hemispheres() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let stars = generate_stars(&mut rng, 1200);
        let above = stars.iter().filter(|s| s.position[2] > 0.0).count();
        // Uniform-on-sphere sampling should not cluster at one pole.
        assert!(above > 400 && above < 800, "z>0 count: {above}");
    }
}
