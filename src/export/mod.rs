// src/export/mod.rs
// Off-screen export: a PNG snapshot and a standalone interactive HTML
// document, both named by the coloring mode. Only runs on --export, after
// the interactive session, and never retroacts on it.

pub mod html;

use std::path::{Path, PathBuf};

use wgpu::util::DeviceExt;

use crate::error::{DrapeError, DrapeResult};
use crate::render::offscreen::OFFSCREEN_FORMAT;
use crate::render::{ctx, GpuMesh, LutTexture, OffscreenTarget, TerrainPipeline, TerrainUniforms};
use crate::scene::Scene;
use crate::viewer::camera::OrbitCamera;
use crate::viewer::sun_direction;

/// Render the scene off-screen and write `terrain_<mode>.png` and
/// `terrain_<mode>.html` into `out_dir`.
pub fn run_export(
    scene: &Scene,
    mode: &str,
    out_dir: &Path,
    width: u32,
    height: u32,
) -> DrapeResult<(PathBuf, PathBuf)> {
    if !out_dir.is_dir() {
        return Err(DrapeError::export(format!(
            "output directory {} does not exist",
            out_dir.display()
        )));
    }

    let png_path = out_dir.join(format!("terrain_{}.png", mode));
    let html_path = out_dir.join(format!("terrain_{}.html", mode));

    render_png(scene, &png_path, width, height)?;
    log::info!("wrote {}", png_path.display());

    html::write_html(scene, &html_path)?;
    log::info!("wrote {}", html_path.display());

    Ok((png_path, html_path))
}

fn render_png(scene: &Scene, path: &Path, width: u32, height: u32) -> DrapeResult<()> {
    let ctx = ctx()?;
    let device = &ctx.device;
    let queue = &ctx.queue;

    let pipeline = TerrainPipeline::new(device, OFFSCREEN_FORMAT);
    let target = OffscreenTarget::new(device, width, height);
    let gpu_mesh = GpuMesh::new(device, scene);

    let layer = scene.active_layer();
    let lut = LutTexture::new(
        device,
        queue,
        &layer.colormap.to_rgba8(),
        layer.colormap.is_categorical(),
    )?;

    let camera = OrbitCamera::framing(scene.mesh.bounds());
    let aspect = width as f32 / height.max(1) as f32;
    let proj = glam::Mat4::perspective_rh(
        45f32.to_radians(),
        aspect,
        (camera.distance * 0.001).max(0.1),
        camera.distance * 50.0,
    );
    let uniforms = TerrainUniforms::new(
        camera.view_matrix(),
        proj,
        sun_direction(),
        layer.range,
        layer.colormap.is_categorical(),
    );
    let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("export-ubo"),
        contents: bytemuck::bytes_of(&uniforms),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = pipeline.create_bind_group(device, &ubo, &lut);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("export-encoder"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("export-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 1.0,
                        g: 1.0,
                        b: 1.0,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        gpu_mesh.draw(
            &mut pass,
            &pipeline,
            &bind_group,
            layer.kind.attr_name(),
        );
    }
    queue.submit(Some(encoder.finish()));

    let pixels = target.read_rgba(device, queue)?;
    let img = image::RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| DrapeError::export("invalid image buffer"))?;
    img.save(path)
        .map_err(|e| DrapeError::export(format!("{}: {}", path.display(), e)))?;
    Ok(())
}
