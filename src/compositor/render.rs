//! Textured-quad render pass
//!
//! Draws, once per display refresh: a two-color background gradient, the
//! browser view texture on a quad spun by the pointer-drag angles, and
//! optionally a one-pixel outline around the most recent dirty rectangle.

use std::borrow::Cow;

use wgpu::util::DeviceExt;
use wgpu::*;

use crate::utils::Result;

use super::gpu::{GpuContext, ViewTexture};
use super::SurfaceState;

const GRADIENT_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec4<f32>) -> VsOut {
    var out: VsOut;
    out.pos = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const QUAD_WGSL: &str = r#"
struct Spin { mvp: mat4x4<f32> };

@group(0) @binding(0) var t_view: texture_2d<f32>;
@group(0) @binding(1) var t_sampler: sampler;
@group(0) @binding(2) var<uniform> u_spin: Spin;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.pos = u_spin.mvp * vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(t_view, t_sampler, in.uv);
}
"#;

const OUTLINE_WGSL: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

/// Gradient vertex: NDC position plus color.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GradientVertex {
    position: [f32; 2],
    color: [f32; 4],
}

/// Quad vertex: NDC position plus texture coordinate. Texture coordinates
/// are flipped vertically to match the buffer's top-left origin.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SpinUniform {
    mvp: [[f32; 4]; 4],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// Red along the bottom edge fading to blue along the top.
const GRADIENT_VERTICES: [GradientVertex; 6] = [
    GradientVertex { position: [-1.0, -1.0], color: [1.0, 0.0, 0.0, 1.0] },
    GradientVertex { position: [1.0, -1.0], color: [1.0, 0.0, 0.0, 1.0] },
    GradientVertex { position: [1.0, 1.0], color: [0.0, 0.0, 1.0, 1.0] },
    GradientVertex { position: [-1.0, -1.0], color: [1.0, 0.0, 0.0, 1.0] },
    GradientVertex { position: [1.0, 1.0], color: [0.0, 0.0, 1.0, 1.0] },
    GradientVertex { position: [-1.0, 1.0], color: [0.0, 0.0, 1.0, 1.0] },
];

/// Identity-based rotation about the X axis, column-major.
pub(crate) fn rotation_x(degrees: f32) -> [[f32; 4]; 4] {
    let r = degrees.to_radians();
    let (s, c) = r.sin_cos();
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, c, s, 0.0],
        [0.0, -s, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Rotation about the Y axis, column-major.
pub(crate) fn rotation_y(degrees: f32) -> [[f32; 4]; 4] {
    let r = degrees.to_radians();
    let (s, c) = r.sin_cos();
    [
        [c, 0.0, -s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Blend state for the textured-quad draw: premultiplied alpha (ONE,
/// ONE_MINUS_SRC_ALPHA) while the surface is transparent, none otherwise.
pub(crate) fn quad_blend(transparent: bool) -> Option<BlendState> {
    transparent.then_some(BlendState::PREMULTIPLIED_ALPHA_BLENDING)
}

pub(crate) fn mat_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for (col, out_col) in out.iter_mut().enumerate() {
        for (row, value) in out_col.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

/// Draws the composited browser surface each refresh.
pub struct Renderer {
    gradient_pipeline: RenderPipeline,
    quad_pipeline: RenderPipeline,
    quad_pipeline_blend: RenderPipeline,
    outline_pipeline: RenderPipeline,
    quad_bind_layout: BindGroupLayout,
    sampler: Sampler,
    spin_buffer: Buffer,
    gradient_vertices: Buffer,
    quad_vertices: Buffer,
    quad_indices: Buffer,
    outline_vertices: Buffer,
    clear_color: Color,
    spin_x: f32,
    spin_y: f32,
}

impl Renderer {
    pub fn new(gpu: &GpuContext, background: [u8; 4]) -> Self {
        let device = &gpu.device;
        let format = gpu.surface_format();

        let transparent = background[3] == 0;
        let clear_color = if transparent {
            Color::TRANSPARENT
        } else {
            Color {
                r: f64::from(background[0]) / 255.0,
                g: f64::from(background[1]) / 255.0,
                b: f64::from(background[2]) / 255.0,
                a: 1.0,
            }
        };

        let gradient_pipeline = build_gradient_pipeline(device, format);
        let (quad_pipeline, quad_pipeline_blend, quad_bind_layout) =
            build_quad_pipelines(device, format);
        let outline_pipeline = build_outline_pipeline(device, format);

        // Pixel-exact UI content: no interpolation.
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("view sampler"),
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let spin_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("spin uniform"),
            contents: bytemuck::cast_slice(&[SpinUniform {
                mvp: rotation_x(0.0),
            }]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let gradient_vertices = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("gradient vertices"),
            contents: bytemuck::cast_slice(&GRADIENT_VERTICES),
            usage: BufferUsages::VERTEX,
        });
        let quad_vertices = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: BufferUsages::VERTEX,
        });
        let quad_indices = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: BufferUsages::INDEX,
        });
        // Five line-strip vertices, streamed per frame when the debug
        // outline is on.
        let outline_vertices = device.create_buffer(&BufferDescriptor {
            label: Some("outline vertices"),
            size: (std::mem::size_of::<[f32; 2]>() * 5) as BufferAddress,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            gradient_pipeline,
            quad_pipeline,
            quad_pipeline_blend,
            outline_pipeline,
            quad_bind_layout,
            sampler,
            spin_buffer,
            gradient_vertices,
            quad_vertices,
            quad_indices,
            outline_vertices,
            clear_color,
            spin_x: 0.0,
            spin_y: 0.0,
        }
    }

    /// Cosmetic spin from pointer drag: horizontal delta pitches, vertical
    /// delta yaws.
    pub fn add_spin(&mut self, dx: f32, dy: f32) {
        self.spin_x += dx;
        self.spin_y += dy;
    }

    /// Draw one frame. Skips entirely while no surface has been painted.
    pub fn render(
        &mut self,
        gpu: &mut GpuContext,
        texture: &ViewTexture,
        state: &SurfaceState,
    ) -> Result<()> {
        let (width, height) = state.size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        let Some(texture_view) = texture.view() else {
            return Ok(());
        };

        let mvp = mat_mul(rotation_y(-self.spin_y), rotation_x(-self.spin_x));
        gpu.queue
            .write_buffer(&self.spin_buffer, 0, bytemuck::cast_slice(&[SpinUniform { mvp }]));

        let bind_group = gpu.device.create_bind_group(&BindGroupDescriptor {
            label: Some("quad bind group"),
            layout: &self.quad_bind_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(texture_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&self.sampler),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: self.spin_buffer.as_entire_binding(),
                },
            ],
        });

        let outline = if state.show_update_rect() {
            state.last_update_rect().filter(|r| !r.is_empty()).map(|r| {
                // Pixel-space rect to NDC, top-left origin.
                let (vw, vh) = (width as f32, height as f32);
                let to_ndc = |x: u32, y: u32| {
                    [
                        (x as f32 / vw) * 2.0 - 1.0,
                        1.0 - (y as f32 / vh) * 2.0,
                    ]
                };
                let (left, top) = (r.x, r.y);
                let (right, bottom) = (r.x + r.width, r.y + r.height);
                [
                    to_ndc(left, top),
                    to_ndc(right, top),
                    to_ndc(right, bottom),
                    to_ndc(left, bottom),
                    to_ndc(left, top),
                ]
            })
        } else {
            None
        };
        if let Some(points) = &outline {
            gpu.queue
                .write_buffer(&self.outline_vertices, 0, bytemuck::cast_slice(points.as_slice()));
        }

        let frame = gpu.begin_frame()?;
        let frame_view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &frame_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Background gradient, decorative.
            pass.set_pipeline(&self.gradient_pipeline);
            pass.set_vertex_buffer(0, self.gradient_vertices.slice(..));
            pass.draw(0..GRADIENT_VERTICES.len() as u32, 0..1);

            // Textured quad. The engine premultiplies its buffer.
            if quad_blend(state.is_transparent()).is_some() {
                pass.set_pipeline(&self.quad_pipeline_blend);
            } else {
                pass.set_pipeline(&self.quad_pipeline);
            }
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_vertices.slice(..));
            pass.set_index_buffer(self.quad_indices.slice(..), IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);

            if outline.is_some() {
                pass.set_pipeline(&self.outline_pipeline);
                pass.set_vertex_buffer(0, self.outline_vertices.slice(..));
                pass.draw(0..5, 0..1);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn build_gradient_pipeline(device: &Device, format: TextureFormat) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("gradient shader"),
        source: ShaderSource::Wgsl(Cow::Borrowed(GRADIENT_WGSL)),
    });
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("gradient layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("gradient pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<GradientVertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &[
                    VertexAttribute {
                        format: VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 0,
                    },
                    VertexAttribute {
                        format: VertexFormat::Float32x4,
                        offset: 8,
                        shader_location: 1,
                    },
                ],
            }],
            compilation_options: Default::default(),
        },
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: None,
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}

fn build_quad_pipelines(
    device: &Device,
    format: TextureFormat,
) -> (RenderPipeline, RenderPipeline, BindGroupLayout) {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("quad shader"),
        source: ShaderSource::Wgsl(Cow::Borrowed(QUAD_WGSL)),
    });
    let bind_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("quad bind layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("quad layout"),
        bind_group_layouts: &[&bind_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = [VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: &[
            VertexAttribute {
                format: VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            },
            VertexAttribute {
                format: VertexFormat::Float32x2,
                offset: 8,
                shader_location: 1,
            },
        ],
    }];

    let build = |blend: Option<BlendState>, label: &'static str| {
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_layout,
                compilation_options: Default::default(),
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format,
                    blend,
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        })
    };

    let opaque = build(quad_blend(false), "quad pipeline");
    let blended = build(quad_blend(true), "quad pipeline blended");
    (opaque, blended, bind_layout)
}

fn build_outline_pipeline(device: &Device, format: TextureFormat) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("outline shader"),
        source: ShaderSource::Wgsl(Cow::Borrowed(OUTLINE_WGSL)),
    });
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("outline layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("outline pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &[VertexAttribute {
                    format: VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            }],
            compilation_options: Default::default(),
        },
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: None,
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}
