//! GPU rendering state and per-frame orchestration.
//!
//! The scene renders in two passes: points and lines into an offscreen
//! target, then the post-processing chain into the surface.

mod camera;
mod lines;
mod points;
mod post_process;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::OrbitCamera;

use crate::config::Config;
use crate::connections::GeometryUpdate;
use crate::error::GpuError;
use lines::LinePass;
use points::PointPass;
use post_process::PostProcessState;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    time: f32,
    delta_time: f32,
    resolution: [f32; 2],
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    background: wgpu::Color,
    points: PointPass,
    lines: LinePass,
    post: PostProcessState,
    pub camera: OrbitCamera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(GpuError::DeviceCreation)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let uniforms = Uniforms {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            time: 0.0,
            delta_time: 0.0,
            resolution: [surface_config.width as f32, surface_config.height as f32],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let background = wgpu::Color {
            r: config.background.x as f64,
            g: config.background.y as f64,
            b: config.background.z as f64,
            a: 1.0,
        };

        let points = PointPass::new(
            &device,
            &uniform_buffer,
            config.particle_count as u32,
            surface_format,
        );
        let lines = LinePass::new(&device, &uniform_buffer, surface_format);
        let post = PostProcessState::new(
            &device,
            &uniform_buffer,
            config,
            surface_config.width,
            surface_config.height,
            surface_format,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            uniform_buffer,
            background,
            points,
            lines,
            post,
            camera: OrbitCamera::new(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.post.resize(
                &self.device,
                &self.uniform_buffer,
                self.config.width,
                self.config.height,
                self.config.format,
            );
        }
    }

    fn update_uniforms(&mut self, time: f32, delta_time: f32) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let uniforms = Uniforms {
            view_proj: self.camera.view_proj(aspect).to_cols_array_2d(),
            time,
            delta_time,
            resolution: [self.config.width as f32, self.config.height as f32],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw one frame: upload this frame's geometry, render the scene into
    /// the offscreen target, then run the post-processing chain.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        time: f32,
        delta_time: f32,
        positions: &[Vec3],
        line_update: GeometryUpdate,
        line_positions: &[Vec3],
        line_colors: &[Vec3],
    ) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(time, delta_time);
        self.points.upload(&self.queue, positions);
        self.lines.apply(
            &self.device,
            &self.queue,
            &self.uniform_buffer,
            line_update,
            line_positions,
            line_colors,
        );

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.post.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.post.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.points.draw(&mut render_pass);
            self.lines.draw(&mut render_pass);
        }

        self.post.draw(&mut encoder, &surface_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
