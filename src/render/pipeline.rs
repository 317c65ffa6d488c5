// src/render/pipeline.rs
// Terrain draw pipeline: position+normal vertex stream, a per-layer scalar
// stream, a 256x1 colormap LUT texture, and one uniform block.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::colormap::LUT_SIZE;
use crate::error::{DrapeError, DrapeResult};
use crate::scene::Scene;
use crate::terrain::{Indices, TerrainMesh};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Stand-in for NaN in GPU scalar streams; the fragment shader discards
/// anything below the threshold. NaN itself is not portable through WGSL.
pub const NODATA_SENTINEL: f32 = -1.0e30;
pub const NODATA_THRESHOLD: f32 = -1.0e29;

/// Uniforms shared by the viewer and the off-screen exporter (160 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// (sun_dir.xyz, exposure)
    pub sun_exposure: [f32; 4],
    /// (clim_min, clim_max, categorical flag, unused)
    pub clim_flags: [f32; 4],
}

impl TerrainUniforms {
    pub fn new(
        view: glam::Mat4,
        proj: glam::Mat4,
        sun_dir: glam::Vec3,
        clim: (f32, f32),
        categorical: bool,
    ) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            sun_exposure: [sun_dir.x, sun_dir.y, sun_dir.z, 1.0],
            clim_flags: [
                clim.0,
                clim.1,
                if categorical { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// 256x1 RGBA8 lookup-table texture.
/// Categorical tables sample nearest so codes never blend; gradients
/// sample linear.
pub struct LutTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl LutTexture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba8: &[u8],
        categorical: bool,
    ) -> DrapeResult<Self> {
        if rgba8.len() != LUT_SIZE * 4 {
            return Err(DrapeError::render(format!(
                "LUT must be {}x1 RGBA8, got {} bytes",
                LUT_SIZE,
                rgba8.len()
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("colormap-lut"),
            size: wgpu::Extent3d {
                width: LUT_SIZE as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba8,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(LUT_SIZE as u32 * 4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: LUT_SIZE as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = if categorical {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("colormap-lut-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub struct TerrainPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl TerrainPipeline {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/terrain.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("terrain-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[
                    // slot 0: interleaved position + normal
                    wgpu::VertexBufferLayout {
                        array_stride: (6 * 4) as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                shader_location: 0,
                                offset: 0,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                            wgpu::VertexAttribute {
                                shader_location: 1,
                                offset: 12,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                        ],
                    },
                    // slot 1: active layer scalar, swapped on toggle
                    wgpu::VertexBufferLayout {
                        array_stride: 4,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            shader_location: 2,
                            offset: 0,
                            format: wgpu::VertexFormat::Float32,
                        }],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // terrain sheets are viewed from either side while orbiting
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        lut: &LutTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&lut.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&lut.sampler),
                },
            ],
        })
    }
}

/// GPU-side mesh: vertex/index buffers plus one scalar buffer per layer.
pub struct GpuMesh {
    pub vbuf: wgpu::Buffer,
    pub ibuf: wgpu::Buffer,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
    scalar_bufs: HashMap<String, wgpu::Buffer>,
}

/// Map attribute values into a GPU stream, swapping NaN for the sentinel.
pub fn scalar_stream(values: &[f32]) -> Vec<f32> {
    values
        .iter()
        .map(|&v| if v.is_nan() { NODATA_SENTINEL } else { v })
        .collect()
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, scene: &Scene) -> Self {
        let mesh = &scene.mesh;
        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain-vbuf"),
            contents: bytemuck::cast_slice(&mesh.interleaved_vertices()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let (ibuf, index_format, index_count) = match mesh.indices() {
            Indices::U16(idx) => (
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("terrain-ibuf"),
                    contents: bytemuck::cast_slice(idx),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                wgpu::IndexFormat::Uint16,
                idx.len() as u32,
            ),
            Indices::U32(idx) => (
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("terrain-ibuf"),
                    contents: bytemuck::cast_slice(idx),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                wgpu::IndexFormat::Uint32,
                idx.len() as u32,
            ),
        };

        let mut scalar_bufs = HashMap::new();
        for attr in mesh.attributes() {
            let stream = scalar_stream(&attr.values);
            let buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terrain-scalar"),
                contents: bytemuck::cast_slice(&stream),
                usage: wgpu::BufferUsages::VERTEX,
            });
            scalar_bufs.insert(attr.name.clone(), buf);
        }

        Self {
            vbuf,
            ibuf,
            index_format,
            index_count,
            scalar_bufs,
        }
    }

    pub fn scalar_buffer(&self, attr_name: &str) -> Option<&wgpu::Buffer> {
        self.scalar_bufs.get(attr_name)
    }

    /// Push rescaled geometry after an exaggeration change.
    pub fn update_vertices(&self, queue: &wgpu::Queue, mesh: &TerrainMesh) {
        queue.write_buffer(
            &self.vbuf,
            0,
            bytemuck::cast_slice(&mesh.interleaved_vertices()),
        );
    }

    pub fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a TerrainPipeline,
        bind_group: &'a wgpu::BindGroup,
        attr_name: &str,
    ) {
        let Some(scalars) = self.scalar_buffer(attr_name) else {
            return;
        };
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, self.vbuf.slice(..));
        pass.set_vertex_buffer(1, scalars.slice(..));
        pass.set_index_buffer(self.ibuf.slice(..), self.index_format);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_stream_replaces_nan() {
        let s = scalar_stream(&[1.0, f32::NAN, 3.0]);
        assert_eq!(s[0], 1.0);
        assert_eq!(s[1], NODATA_SENTINEL);
        assert_eq!(s[2], 3.0);
        assert!(s[1] < NODATA_THRESHOLD);
    }

    #[test]
    fn uniforms_are_plain_160_bytes() {
        assert_eq!(std::mem::size_of::<TerrainUniforms>(), 160);
    }
}
