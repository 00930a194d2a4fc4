//! Gradient sky backdrop.
//!
//! A tiny 2x512 vertical gradient generated on the CPU, uploaded once as an
//! sRGB texture, and stretched over the frame by a fullscreen triangle before
//! everything else draws.

use wgpu::util::DeviceExt;

/// Gradient texture width in texels. Rows are constant, so 2 is plenty.
const GRADIENT_WIDTH: u32 = 2;
/// Gradient texture height in texels.
const GRADIENT_HEIGHT: u32 = 512;

/// One gradient color stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient in `[0, 1]`, 0 = top of the frame.
    pub offset: f32,
    /// sRGB color.
    pub color: [u8; 3],
}

impl ColorStop {
    /// Create a color stop.
    pub const fn new(offset: f32, color: [u8; 3]) -> Self {
        Self { offset, color }
    }
}

/// Default night-sky stops: deep blue fading to near-black.
pub const DEFAULT_STOPS: [ColorStop; 4] = [
    ColorStop::new(0.0, [0x0f, 0x1b, 0x3d]),
    ColorStop::new(0.3, [0x0a, 0x12, 0x28]),
    ColorStop::new(0.6, [0x08, 0x0c, 0x1a]),
    ColorStop::new(1.0, [0x06, 0x06, 0x08]),
];

/// Build RGBA8 gradient pixels, `GRADIENT_WIDTH` x `height`, top to bottom.
///
/// Stops must be sorted by offset; rows before the first stop take its color,
/// rows after the last take the last's.
pub fn build_gradient(stops: &[ColorStop], height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((GRADIENT_WIDTH * height * 4) as usize);

    for row in 0..height {
        let t = row as f32 / (height - 1).max(1) as f32;

        let color = match stops.windows(2).find(|w| t <= w[1].offset) {
            Some(window) => {
                let (a, b) = (window[0], window[1]);
                let span = (b.offset - a.offset).max(f32::EPSILON);
                let local = ((t - a.offset) / span).clamp(0.0, 1.0);
                [
                    lerp_u8(a.color[0], b.color[0], local),
                    lerp_u8(a.color[1], b.color[1], local),
                    lerp_u8(a.color[2], b.color[2], local),
                ]
            }
            None => stops.last().map(|s| s.color).unwrap_or([0, 0, 0]),
        };

        for _ in 0..GRADIENT_WIDTH {
            pixels.extend_from_slice(&[color[0], color[1], color[2], 0xff]);
        }
    }

    pixels
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Fullscreen gradient sky pass.
pub struct GradientSky {
    texture: wgpu::Texture,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl GradientSky {
    /// Create the sky pass with the default color stops.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self::with_stops(device, queue, format, &DEFAULT_STOPS)
    }

    /// Create the sky pass with custom color stops.
    pub fn with_stops(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        stops: &[ColorStop],
    ) -> Self {
        let pixels = build_gradient(stops, GRADIENT_HEIGHT);

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Gradient Sky Texture"),
                size: wgpu::Extent3d {
                    width: GRADIENT_WIDTH,
                    height: GRADIENT_HEIGHT,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Gradient Sky Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Gradient Sky Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gradient Sky Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gradient Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/gradient_sky.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gradient Sky Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Gradient Sky Pipeline"),
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
            texture,
            pipeline,
            bind_group,
        }
    }

    /// Replace the gradient colors without rebuilding the pass.
    pub fn set_stops(&self, queue: &wgpu::Queue, stops: &[ColorStop]) {
        let pixels = build_gradient(stops, GRADIENT_HEIGHT);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(GRADIENT_WIDTH * 4),
                rows_per_image: Some(GRADIENT_HEIGHT),
            },
            wgpu::Extent3d {
                width: GRADIENT_WIDTH,
                height: GRADIENT_HEIGHT,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Draw the sky across the whole render target.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_has_expected_pixel_count() {
        let pixels = build_gradient(&DEFAULT_STOPS, 512);
        assert_eq!(pixels.len(), 2 * 512 * 4);
    }

    #[test]
    fn endpoints_match_the_first_and_last_stops() {
        let pixels = build_gradient(&DEFAULT_STOPS, 512);
        assert_eq!(&pixels[0..3], &DEFAULT_STOPS[0].color);
        let last = pixels.len() - 4;
        assert_eq!(&pixels[last..last + 3], &DEFAULT_STOPS[3].color);
    }

    #[test]
    fn rows_are_horizontally_constant() {
        let pixels = build_gradient(&DEFAULT_STOPS, 64);
        for row in 0..64 {
            let base = row * 2 * 4;
            assert_eq!(pixels[base..base + 4], pixels[base + 4..base + 8]);
        }
    }

    #[test]
    fn gradient_darkens_downward_with_default_stops() {
        let pixels = build_gradient(&DEFAULT_STOPS, 512);
        let luma = |row: usize| {
            let base = row * 2 * 4;
            pixels[base] as u32 + pixels[base + 1] as u32 + pixels[base + 2] as u32
        };
        assert!(luma(0) > luma(256));
        assert!(luma(256) >= luma(511));
    }

    #[test]
    fn alpha_channel_is_opaque() {
        let pixels = build_gradient(&DEFAULT_STOPS, 8);
        for pixel in pixels.chunks_exact(4) {
            assert_eq!(pixel[3], 0xff);
        }
    }
}
