//! Line rendering for particle connections.
//!
//! Segments live in a storage buffer and are expanded into screen-space
//! quads of constant pixel width in the vertex shader. The buffer follows
//! the connection graph's geometry policy: recreated on large segment-count
//! swings, overwritten in place for small ones, released when empty.

use bytemuck::Zeroable;
use glam::Vec3;
use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::connections::GeometryUpdate;

/// One connection segment as laid out for the GPU.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SegmentGpu {
    a: [f32; 4],
    b: [f32; 4],
    color: [f32; 4],
}

/// GPU resources for drawing connection lines.
pub struct LinePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    buffer: wgpu::Buffer,
    /// Segments the current buffer was allocated for.
    capacity: usize,
    /// Segments to draw this frame.
    count: usize,
    scratch: Vec<SegmentGpu>,
}

impl LinePass {
    pub fn new(
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Line Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // Start with a single zeroed segment; empty bindings are invalid.
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Line Segment Buffer"),
            contents: bytemuck::bytes_of(&SegmentGpu::zeroed()),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = create_bind_group(device, &bind_group_layout, uniform_buffer, &buffer);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
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
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            buffer,
            capacity: 1,
            count: 0,
            scratch: Vec::new(),
        }
    }

    /// Apply this frame's segment buffers according to the graph's policy.
    ///
    /// `positions` and `colors` hold two entries per segment.
    pub fn apply(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniform_buffer: &wgpu::Buffer,
        update: GeometryUpdate,
        positions: &[Vec3],
        colors: &[Vec3],
    ) {
        if update == GeometryUpdate::Clear {
            self.count = 0;
            // Release the geometry back to the single-segment placeholder.
            if self.capacity > 1 {
                self.buffer.destroy();
                self.buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Line Segment Buffer"),
                    contents: bytemuck::bytes_of(&SegmentGpu::zeroed()),
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                });
                self.bind_group =
                    create_bind_group(device, &self.bind_group_layout, uniform_buffer, &self.buffer);
                self.capacity = 1;
            }
            return;
        }

        self.scratch.clear();
        for (pair, color) in positions.chunks_exact(2).zip(colors.chunks_exact(2)) {
            self.scratch.push(SegmentGpu {
                a: [pair[0].x, pair[0].y, pair[0].z, 0.0],
                b: [pair[1].x, pair[1].y, pair[1].z, 0.0],
                color: [color[0].x, color[0].y, color[0].z, 0.95],
            });
        }
        self.count = self.scratch.len();

        // In-place counts can drift past the allocation through repeated
        // small changes, so the capacity check overrides the policy.
        if update == GeometryUpdate::Recreate || self.count > self.capacity {
            self.buffer.destroy();
            self.buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Line Segment Buffer"),
                contents: bytemuck::cast_slice(&self.scratch),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
            self.bind_group =
                create_bind_group(device, &self.bind_group_layout, uniform_buffer, &self.buffer);
            self.capacity = self.count;
        } else {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.scratch));
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..6, 0..self.count as u32);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    segment_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Line Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: segment_buffer.as_entire_binding(),
            },
        ],
    })
}

pub(crate) const LINE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    time: f32,
    delta_time: f32,
    resolution: vec2<f32>,
};

struct Segment {
    a: vec4<f32>,
    b: vec4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read> segments: array<Segment>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

const LINE_WIDTH: f32 = 3.0;

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    let seg = segments[instance_index];

    var clip_a = uniforms.view_proj * vec4<f32>(seg.a.xyz, 1.0);
    var clip_b = uniforms.view_proj * vec4<f32>(seg.b.xyz, 1.0);

    // Screen-space perpendicular for constant pixel width.
    let ndc_a = clip_a.xy / clip_a.w;
    let ndc_b = clip_b.xy / clip_b.w;
    var dir = (ndc_b - ndc_a) * uniforms.resolution;
    if length(dir) < 0.0001 {
        dir = vec2<f32>(1.0, 0.0);
    }
    dir = normalize(dir);
    let normal = vec2<f32>(-dir.y, dir.x);
    let offset = normal * LINE_WIDTH / uniforms.resolution;

    var clip: vec4<f32>;
    switch vertex_index {
        case 0u: { clip = clip_a + vec4<f32>(-offset * clip_a.w, 0.0, 0.0); }
        case 1u: { clip = clip_a + vec4<f32>( offset * clip_a.w, 0.0, 0.0); }
        case 2u: { clip = clip_b + vec4<f32>(-offset * clip_b.w, 0.0, 0.0); }
        case 3u: { clip = clip_a + vec4<f32>( offset * clip_a.w, 0.0, 0.0); }
        case 4u: { clip = clip_b + vec4<f32>(-offset * clip_b.w, 0.0, 0.0); }
        default: { clip = clip_b + vec4<f32>( offset * clip_b.w, 0.0, 0.0); }
    }

    var out: VertexOutput;
    out.clip_position = clip;
    out.color = seg.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_shader_parses() {
        naga::front::wgsl::parse_str(LINE_SHADER).expect("line shader must be valid WGSL");
    }
}
