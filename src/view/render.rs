use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::controller::{FrameOutput, ObjectUniform, Shape};
use crate::model::shading::fragment_entry;
use crate::model::{Materials, Shading};
use super::gpu_init::GpuContext;
use super::mesh::{create_cube_mesh, create_subdivision_sphere, MeshBuffer, Vertex};
use super::texture::{
    create_sampler, placeholder_image, texture_bind_group_layout, upload_texture, GpuTexture, LoadState,
    TextureLoader,
};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SPHERE_SUBDIVISIONS: u32 = 4;
const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

/// Round `size` up to the next multiple of `alignment`
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_layout_entry(visibility: wgpu::ShaderStages, has_dynamic_offset: bool, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}

fn create_phong_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    shading: Shading,
) -> wgpu::RenderPipeline {
    let label = format!("phong_{shading:?}_pipeline");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry(shading)),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // the subdivided sphere is wound inward
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// egui output for one frame, drawn over the scene
pub struct EguiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// GPU side of the scene: pipelines, uniform buffers, meshes and textures
pub struct SceneRenderer {
    flat_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    object_capacity: usize,
    object_staging: Vec<u8>,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placeholder: GpuTexture,
    textures: HashMap<String, LoadState<GpuTexture>>,
    loader: TextureLoader,

    cube: MeshBuffer,
    sphere: MeshBuffer,

    depth_view: wgpu::TextureView,

    pub egui_renderer: egui_wgpu::Renderer,
}

impl SceneRenderer {
    pub fn new(gpu: &GpuContext, materials: &Materials) -> Self {
        let device = gpu.device.as_ref();
        let frame_size = std::mem::size_of::<crate::controller::FrameUniform>() as u64;
        let object_size = std::mem::size_of::<ObjectUniform>() as u64;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_layout_entry(wgpu::ShaderStages::VERTEX_FRAGMENT, false, frame_size)],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_layout_entry(wgpu::ShaderStages::VERTEX_FRAGMENT, true, object_size)],
        });
        let texture_layout = texture_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("phong_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let flat_pipeline = create_phong_pipeline(device, &pipeline_layout, &shader, gpu.format, Shading::Flat);
        let textured_pipeline =
            create_phong_pipeline(device, &pipeline_layout, &shader, gpu.format, Shading::Textured);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: frame_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
        });

        let object_stride = aligned_stride(object_size, device.limits().min_uniform_buffer_offset_alignment as u64);
        // avatar plus a full default grid
        let object_capacity = 1 + crate::model::GRID_DIMS.iter().product::<i32>().max(0) as usize;
        let (object_buffer, object_bind_group) =
            create_object_buffer(device, &object_layout, object_stride, object_capacity);

        let sampler = create_sampler(device);
        let placeholder = upload_texture(
            device,
            gpu.queue.as_ref(),
            &texture_layout,
            &sampler,
            &placeholder_image(),
            "placeholder_texture",
        );

        let loader = TextureLoader::new();
        let mut textures = HashMap::new();
        for path in materials.texture_paths() {
            tracing::info!(path, "requesting texture");
            loader.request(path);
            textures.insert(path.to_string(), LoadState::Loading);
        }

        let cube = create_cube_mesh().upload(device, "cube");
        let sphere = create_subdivision_sphere(SPHERE_SUBDIVISIONS).upload(device, "sphere");

        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);
        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            flat_pipeline,
            textured_pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_stride,
            object_capacity,
            object_staging: Vec::new(),
            texture_layout,
            sampler,
            placeholder,
            textures,
            loader,
            cube,
            sphere,
            depth_view,
            egui_renderer,
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext) {
        let (_, depth_view) = create_depth_texture(gpu.device.as_ref(), gpu.config.width, gpu.config.height);
        self.depth_view = depth_view;
    }

    /// Upload any textures that finished loading since the last frame
    pub fn poll_textures(&mut self, gpu: &GpuContext) {
        for (path, result) in self.loader.poll() {
            let slot = self.textures.entry(path.clone()).or_default();
            slot.settle(&path, result, |image| {
                upload_texture(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &self.texture_layout,
                    &self.sampler,
                    &image,
                    &path,
                )
            });
        }
    }

    pub fn texture_state(&self, path: &str) -> &'static str {
        self.textures.get(path).map(LoadState::label).unwrap_or("unknown")
    }

    fn texture_bind_group(&self, path: Option<&str>) -> &wgpu::BindGroup {
        path.and_then(|p| self.textures.get(p))
            .and_then(LoadState::ready)
            .map(|t| &t.bind_group)
            .unwrap_or(&self.placeholder.bind_group)
    }

    fn write_uniforms(&mut self, gpu: &GpuContext, output: &FrameOutput, materials: &Materials) {
        let queue = gpu.queue.as_ref();
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&output.frame));

        if output.draws.len() > self.object_capacity {
            self.object_capacity = output.draws.len().next_power_of_two();
            tracing::debug!(capacity = self.object_capacity, "growing object uniform buffer");
            let (buffer, bind_group) = create_object_buffer(
                gpu.device.as_ref(),
                &self.object_layout,
                self.object_stride,
                self.object_capacity,
            );
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }

        let stride = self.object_stride as usize;
        self.object_staging.clear();
        self.object_staging.resize(stride * output.draws.len(), 0);
        for (i, draw) in output.draws.iter().enumerate() {
            let uniform = ObjectUniform::new(&draw.model, materials.get(draw.material));
            let bytes = bytemuck::bytes_of(&uniform);
            self.object_staging[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        if !self.object_staging.is_empty() {
            queue.write_buffer(&self.object_buffer, 0, &self.object_staging);
        }
    }

    pub fn draw_frame(
        &mut self,
        gpu: &GpuContext,
        output: &FrameOutput,
        materials: &Materials,
        egui_frame: Option<EguiFrame>,
    ) {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                gpu.reconfigure();
                return;
            }
            Err(e) => {
                tracing::error!(error = ?e, "failed to acquire surface texture");
                return;
            }
        };

        self.write_uniforms(gpu, output, materials);

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(gpu.format),
            ..Default::default()
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, draw) in output.draws.iter().enumerate() {
                let material = materials.get(draw.material);
                let pipeline = match material.shading {
                    Shading::Flat => &self.flat_pipeline,
                    Shading::Textured => &self.textured_pipeline,
                };
                let mesh = match draw.shape {
                    Shape::Sphere => &self.sphere,
                    Shape::Cube => &self.cube,
                };
                let offset = (i as u64 * self.object_stride) as wgpu::DynamicOffset;

                rp.set_pipeline(pipeline);
                rp.set_bind_group(1, &self.object_bind_group, &[offset]);
                rp.set_bind_group(2, self.texture_bind_group(material.texture.as_deref()), &[]);
                rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rp.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        if let Some(ui) = egui_frame {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [gpu.config.width, gpu.config.height],
                pixels_per_point: ui.pixels_per_point,
            };

            for (id, image_delta) in &ui.textures_delta.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &ui.primitives, &screen_descriptor);

            {
                let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
            }

            for id in &ui.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("object_uniform_buffer"),
        contents: &vec![0u8; (stride * capacity as u64) as usize],
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}
