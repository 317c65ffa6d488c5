// src/viewer/mod.rs
// Interactive windowed viewer: winit 0.29 window + event loop, orbit
// camera, HUD toggle buttons and exaggeration slider. All scene mutation
// happens on the event-loop thread in response to input.

pub mod camera;
pub mod ui;

use std::sync::Arc;

use camera::{CameraController, OrbitCamera};
use ui::UiLayout;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

use crate::error::{DrapeError, DrapeResult};
use crate::render::pipeline::DEPTH_FORMAT;
use crate::render::{
    GpuMesh, LutTexture, OverlayRenderer, TerrainPipeline, TerrainUniforms,
};
use crate::scene::Scene;

#[derive(Clone)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "drape3d".to_string(),
            vsync: true,
        }
    }
}

/// Sun direction shared by the viewer and the exporter.
pub fn sun_direction() -> glam::Vec3 {
    glam::Vec3::new(0.5, 0.6, 0.8).normalize()
}

struct Viewer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,

    pipeline: TerrainPipeline,
    gpu_mesh: GpuMesh,
    ubo: wgpu::Buffer,
    bind_groups: Vec<wgpu::BindGroup>,
    overlay: OverlayRenderer,

    ui: UiLayout,
    camera: CameraController,
    scene: Scene,

    cursor: (f32, f32),
    dragging_slider: bool,
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer-depth"),
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
    depth.create_view(&Default::default())
}

impl Viewer {
    async fn new(window: Arc<Window>, scene: Scene, config: ViewerConfig) -> DrapeResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| DrapeError::render(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| DrapeError::render("no suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("drape3d-viewer-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| DrapeError::render(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, surface_config.width, surface_config.height);

        let pipeline = TerrainPipeline::new(&device, surface_format);
        let gpu_mesh = GpuMesh::new(&device, &scene);

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain-ubo"),
            size: std::mem::size_of::<TerrainUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut bind_groups = Vec::with_capacity(scene.layers().len());
        for layer in scene.layers() {
            let lut = LutTexture::new(
                &device,
                &queue,
                &layer.colormap.to_rgba8(),
                layer.colormap.is_categorical(),
            )?;
            bind_groups.push(pipeline.create_bind_group(&device, &ubo, &lut));
        }

        let mut overlay = OverlayRenderer::new(&device, surface_format);
        overlay.set_resolution(&queue, surface_config.width, surface_config.height);

        let kinds: Vec<_> = scene.layers().iter().map(|l| l.kind).collect();
        let ui = UiLayout::new(&kinds);

        let camera = CameraController::new(OrbitCamera::framing(scene.mesh.bounds()));

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config: surface_config,
            depth_view,
            pipeline,
            gpu_mesh,
            ubo,
            bind_groups,
            overlay,
            ui,
            camera,
            scene,
            cursor: (0.0, 0.0),
            dragging_slider: false,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
            self.overlay
                .set_resolution(&self.queue, new_size.width, new_size.height);
        }
    }

    fn apply_slider(&mut self, x: f32) {
        let value = self.ui.slider_value_at(x);
        self.scene.mesh.set_exaggeration(value);
        self.gpu_mesh.update_vertices(&self.queue, &self.scene.mesh);
        self.window.request_redraw();
    }

    fn handle_input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Left {
                    let pressed = *state == ElementState::Pressed;
                    if pressed {
                        let (x, y) = self.cursor;
                        if let Some(kind) = self.ui.hit_button(x, y) {
                            if self.scene.activate(kind) {
                                log::info!("active layer: {}", kind.label());
                            }
                            self.window.request_redraw();
                            return true;
                        }
                        if self.ui.hit_slider(x, y) {
                            self.dragging_slider = true;
                            self.apply_slider(x);
                            return true;
                        }
                    } else {
                        self.dragging_slider = false;
                    }
                    self.camera.mouse_pressed = pressed;
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                if self.dragging_slider {
                    self.apply_slider(self.cursor.0);
                } else {
                    self.camera.handle_mouse_move(self.cursor.0, self.cursor.1);
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.handle_mouse_scroll(scroll);
                true
            }
            _ => false,
        }
    }

    fn update_uniforms(&self) {
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let radius = self.camera.orbit.distance;
        let proj = glam::Mat4::perspective_rh(
            45f32.to_radians(),
            aspect,
            (radius * 0.001).max(0.1),
            radius * 50.0,
        );
        let layer = self.scene.active_layer();
        let uniforms = TerrainUniforms::new(
            self.camera.view_matrix(),
            proj,
            sun_direction(),
            layer.range,
            layer.colormap.is_categorical(),
        );
        self.queue
            .write_buffer(&self.ubo, 0, bytemuck::bytes_of(&uniforms));
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.update_uniforms();
        let instances = self
            .ui
            .build_instances(&self.scene, self.scene.mesh.exaggeration());
        self.overlay.upload_instances(&self.device, &instances);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewer-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("viewer-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.93,
                            g: 0.93,
                            b: 0.93,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let bind_group = &self.bind_groups[self.scene.active_index()];
            let attr = self.scene.active_layer().kind.attr_name();
            self.gpu_mesh
                .draw(&mut pass, &self.pipeline, bind_group, attr);
            self.overlay.render(&mut pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Open the interactive window and block until it closes.
pub fn run_viewer(scene: Scene, config: ViewerConfig) -> DrapeResult<()> {
    let event_loop = EventLoop::new().map_err(|e| DrapeError::render(e.to_string()))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .build(&event_loop)
            .map_err(|e| DrapeError::render(e.to_string()))?,
    );

    println!("drape3d interactive viewer");
    println!("  Drag    - rotate camera");
    println!("  Scroll  - zoom in/out");
    println!("  Buttons - switch drape layer");
    println!("  Slider  - vertical exaggeration");
    println!("  Esc     - exit");

    let mut scene_opt = Some(scene);
    let mut viewer_opt: Option<Viewer> = None;

    event_loop
        .run(move |event, elwt| match event {
            Event::Resumed => {
                // some platforms only allow surface creation after resume
                if viewer_opt.is_none() {
                    let scene = scene_opt.take().expect("scene consumed twice");
                    match pollster::block_on(Viewer::new(
                        Arc::clone(&window),
                        scene,
                        config.clone(),
                    )) {
                        Ok(v) => viewer_opt = Some(v),
                        Err(e) => {
                            eprintln!("Failed to create viewer: {}", e);
                            elwt.exit();
                        }
                    }
                }
            }
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let Some(viewer) = viewer_opt.as_mut() else {
                    return;
                };
                if viewer.handle_input(event) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::KeyboardInput {
                        event: key_event, ..
                    } => {
                        if key_event.state == ElementState::Pressed {
                            if let PhysicalKey::Code(KeyCode::Escape) = key_event.physical_key {
                                elwt.exit();
                            }
                        }
                    }
                    WindowEvent::Resized(physical_size) => viewer.resize(*physical_size),
                    WindowEvent::RedrawRequested => match viewer.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let size = viewer.window.inner_size();
                            viewer.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            eprintln!("Out of memory!");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            eprintln!("Surface timeout!");
                        }
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| DrapeError::render(e.to_string()))?;

    Ok(())
}
