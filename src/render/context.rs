// src/render/context.rs
// Process-wide device/queue for off-screen rendering (export path).
// The interactive viewer creates its own surface-compatible device.

use once_cell::sync::OnceCell;

use crate::error::{DrapeError, DrapeResult};

static WGPU_CTX: OnceCell<WgpuContext> = OnceCell::new();

pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl WgpuContext {
    fn init() -> DrapeResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| DrapeError::render("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("drape3d-offscreen-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| DrapeError::render(e.to_string()))?;

        Ok(Self { device, queue })
    }
}

/// Shared off-screen context, created on first use.
pub fn ctx() -> DrapeResult<&'static WgpuContext> {
    WGPU_CTX.get_or_try_init(WgpuContext::init)
}
