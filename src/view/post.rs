//! Selective bloom and output: the bloom-layer render is thresholded, blurred down a five
//! level mip chain and recombined, then mixed over the full scene and tone mapped onto the
//! surface.

use wgpu::util::DeviceExt;

use crate::config::{BloomParams, Settings};
use crate::view::texture::{linear_sampler, texture_layout_entries, uniform_layout_entry, GpuTexture, HDR_FORMAT};

pub const BLOOM_MIPS: usize = 5;
const KERNEL_RADII: [f32; BLOOM_MIPS] = [3.0, 5.0, 7.0, 9.0, 11.0];
const SMOOTH_WIDTH: f32 = 0.01;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurParams {
    direction: [f32; 2],
    inv_size: [f32; 2],
    radius: f32,
    threshold: f32,
    smooth_width: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeParams {
    strength: f32,
    radius: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct OutputParams {
    exposure: f32,
    encode_srgb: f32,
    _pad: [f32; 2],
}

/// Sizes of the bloom chain for a `width` x `height` frame: half resolution, then halving.
pub fn mip_sizes(width: u32, height: u32) -> [(u32, u32); BLOOM_MIPS] {
    let mut w = (width as f32 / 2.0).round().max(1.0) as u32;
    let mut h = (height as f32 / 2.0).round().max(1.0) as u32;
    let mut sizes = [(1, 1); BLOOM_MIPS];
    for size in sizes.iter_mut() {
        *size = (w, h);
        w = ((w as f32 / 2.0).round() as u32).max(1);
        h = ((h as f32 / 2.0).round() as u32).max(1);
    }
    sizes
}

struct MipLevel {
    horizontal: GpuTexture,
    vertical: GpuTexture,
    horizontal_bind: wgpu::BindGroup,
    vertical_bind: wgpu::BindGroup,
}

/// Everything that depends on the frame size.
struct BloomChain {
    bright: GpuTexture,
    threshold_bind: wgpu::BindGroup,
    mips: Vec<MipLevel>,
    composite_bind: wgpu::BindGroup,
    output_bind: wgpu::BindGroup,
}

pub struct PostProcess {
    sampler: wgpu::Sampler,
    single_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    output_layout: wgpu::BindGroupLayout,
    threshold_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    output_pipeline: wgpu::RenderPipeline,
    threshold_params: wgpu::Buffer,
    composite_params: wgpu::Buffer,
    output_params: wgpu::Buffer,
    encode_srgb: bool,
    chain: BloomChain,
}

impl PostProcess {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        scene: &GpuTexture,
        bloom_scene: &GpuTexture,
    ) -> Self {
        let sampler = linear_sampler(device, wgpu::AddressMode::ClampToEdge, "post_sampler");

        let [tex, smp] = texture_layout_entries(0);
        let single_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_single_layout"),
            entries: &[tex, smp, uniform_layout_entry(2, wgpu::ShaderStages::FRAGMENT)],
        });

        let mut composite_entries: Vec<wgpu::BindGroupLayoutEntry> =
            (0..BLOOM_MIPS as u32).map(|i| texture_layout_entries(i)[0]).collect();
        composite_entries.push(texture_layout_entries(BLOOM_MIPS as u32 - 1)[1]);
        composite_entries.push(uniform_layout_entry(BLOOM_MIPS as u32 + 1, wgpu::ShaderStages::FRAGMENT));
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_composite_layout"),
            entries: &composite_entries,
        });

        let output_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("output_layout"),
            entries: &[
                texture_layout_entries(0)[0],
                texture_layout_entries(1)[0],
                texture_layout_entries(2)[0],
                texture_layout_entries(2)[1],
                uniform_layout_entry(4, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let bloom_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });
        let output_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("output_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/output.wgsl").into()),
        });

        let threshold_pipeline =
            fullscreen_pipeline(device, "bloom_threshold", &single_layout, &bloom_shader, "fs_threshold", HDR_FORMAT);
        let blur_pipeline =
            fullscreen_pipeline(device, "bloom_blur", &single_layout, &bloom_shader, "fs_blur", HDR_FORMAT);
        let composite_pipeline = fullscreen_pipeline(
            device,
            "bloom_composite",
            &composite_layout,
            &composite_shader,
            "fs_composite",
            HDR_FORMAT,
        );
        let output_pipeline =
            fullscreen_pipeline(device, "output", &output_layout, &output_shader, "fs_output", surface_format);

        let threshold_params = uniform_buffer(device, "bloom_threshold_params", &blur_params([0.0, 0.0], (1, 1), 0.0, 0.0));
        let composite_params = uniform_buffer(
            device,
            "bloom_composite_params",
            &CompositeParams { strength: 0.0, radius: 0.0, _pad: [0.0; 2] },
        );
        let output_params = uniform_buffer(
            device,
            "output_params",
            &OutputParams { exposure: 1.0, encode_srgb: 0.0, _pad: [0.0; 2] },
        );

        let chain = BloomChain::new(
            device,
            &sampler,
            &single_layout,
            &composite_layout,
            &output_layout,
            [&threshold_params, &composite_params, &output_params],
            scene,
            bloom_scene,
        );

        Self {
            sampler,
            single_layout,
            composite_layout,
            output_layout,
            threshold_pipeline,
            blur_pipeline,
            composite_pipeline,
            output_pipeline,
            threshold_params,
            composite_params,
            output_params,
            encode_srgb: !surface_format.is_srgb(),
            chain,
        }
    }

    /// Rebuild the size-dependent targets after the scene targets were recreated.
    pub fn resize(&mut self, device: &wgpu::Device, scene: &GpuTexture, bloom_scene: &GpuTexture) {
        self.chain = BloomChain::new(
            device,
            &self.sampler,
            &self.single_layout,
            &self.composite_layout,
            &self.output_layout,
            [&self.threshold_params, &self.composite_params, &self.output_params],
            scene,
            bloom_scene,
        );
    }

    pub fn write_params(&self, queue: &wgpu::Queue, settings: &Settings) {
        let BloomParams { threshold, strength, radius } = settings.bloom;
        queue.write_buffer(
            &self.threshold_params,
            0,
            bytemuck::bytes_of(&blur_params([0.0, 0.0], (1, 1), 0.0, threshold)),
        );
        queue.write_buffer(
            &self.composite_params,
            0,
            bytemuck::bytes_of(&CompositeParams { strength, radius, _pad: [0.0; 2] }),
        );
        queue.write_buffer(
            &self.output_params,
            0,
            bytemuck::bytes_of(&OutputParams {
                exposure: settings.tone_mapping_exposure(),
                encode_srgb: if self.encode_srgb { 1.0 } else { 0.0 },
                _pad: [0.0; 2],
            }),
        );
    }

    /// Record the bloom chain and the final composite into `target`.
    pub fn run(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let chain = &self.chain;
        fullscreen_pass(encoder, "bloom_threshold", &chain.bright.view, &self.threshold_pipeline, &chain.threshold_bind);
        for mip in &chain.mips {
            fullscreen_pass(encoder, "bloom_blur_h", &mip.horizontal.view, &self.blur_pipeline, &mip.horizontal_bind);
            fullscreen_pass(encoder, "bloom_blur_v", &mip.vertical.view, &self.blur_pipeline, &mip.vertical_bind);
        }
        // the first horizontal target is free again and holds the combined glow
        fullscreen_pass(
            encoder,
            "bloom_composite",
            &chain.mips[0].horizontal.view,
            &self.composite_pipeline,
            &chain.composite_bind,
        );
        fullscreen_pass(encoder, "output", target, &self.output_pipeline, &chain.output_bind);
    }
}

impl BloomChain {
    #[allow(clippy::too_many_arguments)]
    fn new(
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        single_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        output_layout: &wgpu::BindGroupLayout,
        [threshold_params, composite_params, output_params]: [&wgpu::Buffer; 3],
        scene: &GpuTexture,
        bloom_scene: &GpuTexture,
    ) -> Self {
        let (width, height) = scene.size();
        let sizes = mip_sizes(width, height);

        let (bw, bh) = sizes[0];
        let bright = GpuTexture::render_target(device, bw, bh, "bloom_bright");
        let threshold_bind = single_bind_group(device, single_layout, &bloom_scene.view, sampler, threshold_params);

        let mut mips: Vec<MipLevel> = Vec::with_capacity(BLOOM_MIPS);
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let horizontal = GpuTexture::render_target(device, w, h, "bloom_mip_h");
            let vertical = GpuTexture::render_target(device, w, h, "bloom_mip_v");
            let radius = KERNEL_RADII[i];

            // buffers live as long as the bind groups that reference them
            let h_params = uniform_buffer(device, "bloom_blur_h_params", &blur_params([1.0, 0.0], (w, h), radius, 0.0));
            let v_params = uniform_buffer(device, "bloom_blur_v_params", &blur_params([0.0, 1.0], (w, h), radius, 0.0));

            let input = mips.last().map(|m| &m.vertical.view).unwrap_or(&bright.view);
            let horizontal_bind = single_bind_group(device, single_layout, input, sampler, &h_params);
            let vertical_bind = single_bind_group(device, single_layout, &horizontal.view, sampler, &v_params);
            mips.push(MipLevel { horizontal, vertical, horizontal_bind, vertical_bind });
        }

        let mut entries: Vec<wgpu::BindGroupEntry> = mips
            .iter()
            .enumerate()
            .map(|(i, mip)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(&mip.vertical.view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: BLOOM_MIPS as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: BLOOM_MIPS as u32 + 1,
            resource: composite_params.as_entire_binding(),
        });
        let composite_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom_composite_bind_group"),
            layout: composite_layout,
            entries: &entries,
        });

        let output_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("output_bind_group"),
            layout: output_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&scene.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&bloom_scene.view) },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&mips[0].horizontal.view),
                },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(sampler) },
                wgpu::BindGroupEntry { binding: 4, resource: output_params.as_entire_binding() },
            ],
        });

        tracing::debug!(width, height, ?sizes, "bloom chain created");
        Self { bright, threshold_bind, mips, composite_bind, output_bind }
    }
}

fn blur_params(direction: [f32; 2], (w, h): (u32, u32), radius: f32, threshold: f32) -> BlurParams {
    BlurParams {
        direction,
        inv_size: [1.0 / w.max(1) as f32, 1.0 / h.max(1) as f32],
        radius,
        threshold,
        smooth_width: SMOOTH_WIDTH,
        _pad: 0.0,
    }
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn single_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    params: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("post_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
        ],
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    rp.set_pipeline(pipeline);
    rp.set_bind_group(0, bind_group, &[]);
    rp.draw(0..3, 0..1);
}
