//! Debug visualization of the raw particle state texture.
//!
//! The current state texture is blitted into a corner viewport so position
//! and lifetime data can be inspected visually. Off by default.

use super::StateTargets;

/// Blits the current state texture into a corner of the frame.
pub struct StateDebugView {
    pipeline: wgpu::RenderPipeline,
    bind_groups: [wgpu::BindGroup; 2],
}

impl StateDebugView {
    /// Viewport side length in pixels.
    pub const VIEWPORT_SIZE: f32 = 200.0;

    /// Create the debug view for the given state texture pair.
    pub fn new(device: &wgpu::Device, targets: &StateTargets, format: wgpu::TextureFormat) -> Self {
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("State Debug Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        let views = targets.views();
        let bind_groups = [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("State Debug Bind Group"),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(views[i]),
                }],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("State Debug Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/state_debug.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("State Debug Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("State Debug Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_groups,
        }
    }

    /// Draw the state texture into a corner viewport.
    /// The caller is responsible for restoring the viewport afterwards if it
    /// issues further draws in the same pass.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, current_index: usize) {
        pass.set_viewport(
            10.0,
            10.0,
            Self::VIEWPORT_SIZE,
            Self::VIEWPORT_SIZE,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[current_index], &[]);
        pass.draw(0..3, 0..1);
    }
}
