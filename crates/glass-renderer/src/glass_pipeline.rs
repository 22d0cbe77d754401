// ABOUTME: Refraction pipeline for the liquid glass effect.
// ABOUTME: Renders a viewport-sized quad sampling mask and background textures.

use bytemuck::{Pod, Zeroable};

use glass_core::GlassSettings;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct GlassUniforms {
    pub canvas_size: [f32; 2],
    pub background_size: [f32; 2],
    pub position: [f32; 2],
    pub blur_radius: f32,
    pub edge_steepness: f32,
    pub sigma_scale: f32,
    pub lightness_lift: f32,
    pub rim_blur: f32,
    pub distortion_strength: f32,
    pub ring_gain: f32,
    pub _pad: [f32; 3],
}

impl GlassUniforms {
    pub fn new(
        canvas_size: (u32, u32),
        background_size: (u32, u32),
        position: (f32, f32),
        settings: &GlassSettings,
    ) -> Self {
        Self {
            canvas_size: [canvas_size.0 as f32, canvas_size.1 as f32],
            background_size: [background_size.0 as f32, background_size.1 as f32],
            position: [position.0, position.1],
            blur_radius: settings.blur_radius,
            edge_steepness: settings.edge_steepness,
            sigma_scale: settings.sigma_scale,
            lightness_lift: settings.lightness_lift,
            rim_blur: settings.rim_blur,
            distortion_strength: settings.distortion_strength,
            ring_gain: settings.ring_gain,
            _pad: [0.0; 3],
        }
    }
}

/// Shared pipeline state for every glass instance. Instances own their
/// uniform buffers and bind groups; the compiled shader and layout are
/// created once.
pub struct GlassPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl GlassPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glass Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/glass.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glass Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glass Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Mask (coverage) texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Background texture
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Glass Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
        mask_view: &wgpu::TextureView,
        background_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glass Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(mask_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(background_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, bind_group: &wgpu::BindGroup) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle, clipped by the viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // The WGSL struct is 64 bytes; a drift here corrupts every field
        assert_eq!(std::mem::size_of::<GlassUniforms>(), 64);
    }

    #[test]
    fn uniforms_carry_settings_values() {
        let settings = GlassSettings::bold();
        let u = GlassUniforms::new((400, 240), (1200, 800), (10.0, 20.0), &settings);
        assert_eq!(u.canvas_size, [400.0, 240.0]);
        assert_eq!(u.position, [10.0, 20.0]);
        assert_eq!(u.blur_radius, settings.blur_radius);
        assert_eq!(u.distortion_strength, settings.distortion_strength);
    }

    #[test]
    fn unchanged_state_yields_identical_uniform_bytes() {
        // Drawing twice with no state change in between uploads the
        // exact same uniform payload, so the frames are identical.
        let settings = GlassSettings::default();
        let a = GlassUniforms::new((400, 240), (1200, 800), (100.0, 100.0), &settings);
        let b = GlassUniforms::new((400, 240), (1200, 800), (100.0, 100.0), &settings);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }
}
