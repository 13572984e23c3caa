//! Cinematic post-processing.
//!
//! The scene (points and lines) renders into an offscreen target; a single
//! fullscreen pass then applies chromatic aberration, bloom, and film
//! grain with scanlines before presenting. Effect parameters are fixed at
//! startup and uploaded once into a uniform buffer.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::config::Config;

/// Effect parameters as laid out for the fragment shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PostParams {
    bloom_strength: f32,
    bloom_radius: f32,
    bloom_threshold: f32,
    noise_intensity: f32,
    scanline_intensity: f32,
    scanline_count: f32,
    aberration_offset: f32,
    aberration_opacity: f32,
}

impl PostParams {
    fn from_config(config: &Config) -> Self {
        Self {
            bloom_strength: config.bloom.strength,
            bloom_radius: config.bloom.radius,
            bloom_threshold: config.bloom.threshold,
            noise_intensity: config.film.noise_intensity,
            scanline_intensity: config.film.scanline_intensity,
            scanline_count: config.film.scanline_count,
            aberration_offset: config.aberration.offset,
            aberration_opacity: config.aberration.opacity,
        }
    }
}

/// GPU resources for the post-processing chain.
pub struct PostProcessState {
    /// Offscreen render target the scene draws into.
    pub view: wgpu::TextureView,
    /// Offscreen depth buffer for the scene pass.
    pub depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    texture: wgpu::Texture,
    depth_texture: wgpu::Texture,
}

impl PostProcessState {
    pub fn new(
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
        config: &Config,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let (texture, view) = create_color_target(device, width, height, surface_format);
        let (depth_texture, depth_view) = create_depth_target(device, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Scene Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let params = PostParams::from_config(config);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post-Process Shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post-Process Bind Group Layout"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &view,
            &sampler,
            uniform_buffer,
            &params_buffer,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post-Process Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Post-Process Pipeline"),
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
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            view,
            depth_view,
            pipeline,
            bind_group,
            bind_group_layout,
            sampler,
            params_buffer,
            texture,
            depth_texture,
        }
    }

    /// Recreate the offscreen targets after a window resize.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
    ) {
        self.texture.destroy();
        self.depth_texture.destroy();
        let (texture, view) = create_color_target(device, width, height, surface_format);
        let (depth_texture, depth_view) = create_depth_target(device, width, height);
        self.texture = texture;
        self.view = view;
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;

        self.bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            &self.view,
            &self.sampler,
            uniform_buffer,
            &self.params_buffer,
        );
    }

    /// Draw the processed scene into the given surface view.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Post-Process Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

fn create_color_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    surface_format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: surface_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_depth_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
    params_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Post-Process Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    })
}

pub(crate) const POST_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    time: f32,
    delta_time: f32,
    resolution: vec2<f32>,
};

struct PostParams {
    bloom_strength: f32,
    bloom_radius: f32,
    bloom_threshold: f32,
    noise_intensity: f32,
    scanline_intensity: f32,
    scanline_count: f32,
    aberration_offset: f32,
    aberration_opacity: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var scene: texture_2d<f32>;
@group(0) @binding(1) var scene_sampler: sampler;
@group(0) @binding(2) var<uniform> uniforms: Uniforms;
@group(0) @binding(3) var<uniform> params: PostParams;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

fn luminance(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}

fn bright_pass(uv: vec2<f32>) -> vec3<f32> {
    let c = textureSample(scene, scene_sampler, uv).rgb;
    let l = luminance(c);
    return c * max(l - params.bloom_threshold, 0.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let uv = in.uv;

    // Chromatic aberration: split the red and blue samples.
    let off = vec2<f32>(params.aberration_offset, params.aberration_offset);
    let base = textureSample(scene, scene_sampler, uv).rgb;
    let split_r = textureSample(scene, scene_sampler, uv + off).r;
    let split_b = textureSample(scene, scene_sampler, uv - off).b;
    var color = mix(base, vec3<f32>(split_r, base.g, split_b), params.aberration_opacity);

    // Bloom: two rings of bright-pass taps around the pixel.
    var directions = array<vec2<f32>, 8>(
        vec2<f32>(1.0, 0.0), vec2<f32>(-1.0, 0.0),
        vec2<f32>(0.0, 1.0), vec2<f32>(0.0, -1.0),
        vec2<f32>(0.707, 0.707), vec2<f32>(-0.707, 0.707),
        vec2<f32>(0.707, -0.707), vec2<f32>(-0.707, -0.707),
    );
    let spread = params.bloom_radius * 0.02;
    var bloom = bright_pass(uv);
    for (var i = 0; i < 8; i++) {
        bloom += bright_pass(uv + directions[i] * spread);
        bloom += bright_pass(uv + directions[i] * spread * 0.5);
    }
    color += bloom / 17.0 * params.bloom_strength;

    // Film grain and scanlines.
    var x = uv.x * uv.y * uniforms.time * 1000.0;
    x = (x % 13.0) * (x % 123.0);
    let dx = x % 0.01;
    var grained = color + color * clamp(0.1 + dx * 100.0, 0.0, 1.0);
    let sc = vec2<f32>(sin(uv.y * params.scanline_count), cos(uv.y * params.scanline_count));
    grained += color * vec3<f32>(sc.x, sc.y, sc.x) * params.scanline_intensity;
    color = color + params.noise_intensity * (grained - color);

    return vec4<f32>(color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_shader_parses() {
        naga::front::wgsl::parse_str(POST_SHADER).expect("post shader must be valid WGSL");
    }
}
