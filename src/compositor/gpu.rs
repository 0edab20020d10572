//! GPU context and texture executor using wgpu
//!
//! Owns the device/queue/surface bootstrap and the browser view texture.
//! The texture is only ever touched from the UI thread; sub-updates never
//! recreate it, a full-surface size change does.

use std::sync::Arc;

use log::warn;
use wgpu::{
    Device, Queue, Surface, SurfaceConfiguration, SurfaceTexture, Texture, TextureFormat,
    TextureUsages, TextureView,
};
use winit::window::Window;

use crate::utils::{OsrError, Result};

use super::{BYTES_PER_PIXEL, UploadPlan};

/// Texture format of the engine's paint buffers: 32-bit BGRA, matching the
/// surface format so pixels pass through untouched.
pub const PAINT_FORMAT: TextureFormat = TextureFormat::Bgra8Unorm;

/// GPU rendering context bound to the application window.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
}

impl GpuContext {
    /// Create the instance/adapter/device chain and configure the surface
    /// for the window's current size.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|_| OsrError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("osrview device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::default(),
        }))
        .map_err(|e| OsrError::DeviceCreation(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = if caps.formats.contains(&PAINT_FORMAT) {
            PAINT_FORMAT
        } else {
            caps.formats[0]
        };

        let size = window.inner_size();
        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    /// Viewport size in physical pixels. Last resize wins.
    pub fn viewport(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface for a new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquire the next frame, reconfiguring once on a lost or outdated
    /// swapchain.
    pub fn begin_frame(&mut self) -> Result<SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| OsrError::FrameAcquire(e.to_string()))
            }
            Err(e) => Err(OsrError::FrameAcquire(e.to_string())),
        }
    }
}

/// The single GPU texture mirroring the browser's rendered surface.
///
/// Created lazily on the first full upload; recreated only when the full
/// surface size changes. Partial plans write into the existing allocation.
pub struct ViewTexture {
    texture: Option<Texture>,
    view: Option<TextureView>,
    width: u32,
    height: u32,
}

impl ViewTexture {
    pub fn new() -> Self {
        Self {
            texture: None,
            view: None,
            width: 0,
            height: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn view(&self) -> Option<&TextureView> {
        self.view.as_ref()
    }

    fn ensure(&mut self, device: &Device, width: u32, height: u32) {
        if self.texture.is_some() && self.width == width && self.height == height {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("browser view texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PAINT_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.width = width;
        self.height = height;
    }

    /// Replay an upload plan against the texture.
    pub fn apply(&mut self, device: &Device, queue: &Queue, plan: &UploadPlan, buffer: &[u8]) {
        match plan {
            UploadPlan::Full { width, height } => {
                self.ensure(device, *width, *height);
                let Some(texture) = self.texture.as_ref() else {
                    return;
                };
                queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    buffer,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(width * BYTES_PER_PIXEL),
                        rows_per_image: Some(*height),
                    },
                    wgpu::Extent3d {
                        width: *width,
                        height: *height,
                        depth_or_array_layers: 1,
                    },
                );
            }
            UploadPlan::Partial(ops) => {
                let Some(texture) = self.texture.as_ref() else {
                    // Sub-update before any full paint is an engine contract
                    // violation; there is nothing to patch yet.
                    warn!("partial upload before texture creation, dropped");
                    return;
                };
                for op in ops {
                    queue.write_texture(
                        wgpu::TexelCopyTextureInfo {
                            texture,
                            mip_level: 0,
                            origin: wgpu::Origin3d {
                                x: op.dest_x,
                                y: op.dest_y,
                                z: 0,
                            },
                            aspect: wgpu::TextureAspect::All,
                        },
                        buffer,
                        wgpu::TexelCopyBufferLayout {
                            offset: op.buffer_offset,
                            bytes_per_row: Some(op.bytes_per_row),
                            rows_per_image: None,
                        },
                        wgpu::Extent3d {
                            width: op.width,
                            height: op.height,
                            depth_or_array_layers: 1,
                        },
                    );
                }
            }
            UploadPlan::Skip => {}
        }
    }
}

impl Default for ViewTexture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_texture_starts_unallocated() {
        let tex = ViewTexture::new();
        assert_eq!(tex.size(), (0, 0));
        assert!(tex.view().is_none());
    }
}
