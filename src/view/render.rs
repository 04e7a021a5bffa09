use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::config::{self, Settings};
use crate::model::scene::{Material, ObjectId, Scene, TextureId};
use crate::model::Camera;
use crate::utils::{MeshBuffer, Vertex};
use crate::view::post::PostProcess;
use crate::view::texture::{
    linear_sampler, texture_layout_entries, uniform_layout_entry, GpuTexture, DEPTH_FORMAT, HDR_FORMAT,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light_dir: [f32; 4],
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog: [f32; 4],
    pub viewport: [f32; 4],
    pub flags: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub material: [f32; 4],
    pub extra: [f32; 4],
}

/// Which of the three scene renders a uniform is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Camera mirrored below the floor, geometry under the mirror clipped.
    Reflection,
    /// Only bloom-flagged objects keep their colour.
    BloomLayer,
    Main,
}

impl SceneUniform {
    pub fn new(camera: &Camera, settings: &Settings, width: u32, height: u32, kind: PassKind) -> Self {
        let (view_proj, eye) = match kind {
            PassKind::Reflection => (
                camera.mirrored_view_proj(config::MIRROR_HEIGHT),
                camera.mirrored_eye(config::MIRROR_HEIGHT),
            ),
            PassKind::BloomLayer | PassKind::Main => (camera.view_proj(), camera.eye),
        };
        let to_light = -config::SUN_DIRECTION.normalize();
        let [fr, fg, fb] = config::FOG_COLOR;
        let ambient = config::AMBIENT_INTENSITY;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            light_dir: to_light.extend(config::SUN_INTENSITY).to_array(),
            ambient: [ambient, ambient, ambient, 0.0],
            fog_color: [fr, fg, fb, 1.0],
            fog: [config::FOG_NEAR, config::FOG_FAR, 0.0, 0.0],
            viewport: [width as f32, height as f32, settings.mirror_blur, 0.0],
            flags: [
                if kind == PassKind::BloomLayer { 1.0 } else { 0.0 },
                if kind == PassKind::Reflection { 1.0 } else { 0.0 },
                config::MIRROR_HEIGHT,
                0.0,
            ],
        }
    }
}

const KIND_BASIC: f32 = 0.0;
const KIND_STANDARD: f32 = 1.0;
const KIND_PHYSICAL: f32 = 2.0;
const KIND_MIRROR: f32 = 3.0;

impl ObjectUniform {
    pub fn new(world: Mat4, material: &Material, bloom: bool) -> Self {
        let (color, material, clearcoat_roughness) = match *material {
            Material::Basic { color: [r, g, b], opacity, .. } => ([r, g, b, opacity], [KIND_BASIC, 1.0, 0.0, 0.0], 0.0),
            Material::Standard { color, roughness, metalness, .. } => {
                (color, [KIND_STANDARD, roughness, metalness, 0.0], 0.0)
            }
            Material::Physical { color: [r, g, b], roughness, metalness, clearcoat, clearcoat_roughness, opacity } => (
                [r, g, b, opacity],
                [KIND_PHYSICAL, roughness, metalness, clearcoat],
                clearcoat_roughness,
            ),
            Material::Mirror { tint: [r, g, b] } => ([r, g, b, 1.0], [KIND_MIRROR, 0.0, 0.0, 0.0], 0.0),
            Material::Hidden => ([0.0; 4], [KIND_BASIC, 0.0, 0.0, 0.0], 0.0),
        };
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            color,
            material,
            extra: [clearcoat_roughness, if bloom { 1.0 } else { 0.0 }, 0.0, 0.0],
        }
    }

    pub fn points(world: Mat4, color: [f32; 3], size: f32) -> Self {
        let [r, g, b] = color;
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            material: [KIND_BASIC, 0.0, 0.0, 0.0],
            extra: [0.0, 0.0, 0.0, size],
        }
    }
}

/// Objects to draw this frame, opaque first, transparent back to front.
#[derive(Debug, Default, PartialEq)]
pub struct DrawList {
    pub opaque: Vec<ObjectId>,
    pub transparent: Vec<ObjectId>,
}

impl DrawList {
    pub fn build(scene: &Scene, eye: Vec3) -> Self {
        let mut list = DrawList::default();
        let mut transparent: Vec<(f32, ObjectId)> = Vec::new();
        for (i, object) in scene.objects.iter().enumerate() {
            if !object.visible || object.material == Material::Hidden {
                continue;
            }
            let id = ObjectId(i);
            if object.material.is_transparent() {
                let centre = scene.world_matrix(id).transform_point3(Vec3::ZERO);
                transparent.push((centre.distance_squared(eye), id));
            } else {
                list.opaque.push(id);
            }
        }
        transparent.sort_by(|a, b| b.0.total_cmp(&a.0));
        list.transparent = transparent.into_iter().map(|(_, id)| id).collect();
        list
    }
}

/// The mirror and the floor above it do not show up in their own reflection.
fn appears_in_reflection(scene: &Scene, id: ObjectId) -> bool {
    scene.floor != Some(id) && !matches!(scene.object(id).material, Material::Mirror { .. })
}

struct PassUniform {
    buffer: Buffer,
    bind_group: BindGroup,
}

struct ObjectGpu {
    buffer: Buffer,
    bind_group: BindGroup,
}

struct PointsGpu {
    instances: Buffer,
    count: u32,
    object: ObjectGpu,
}

/// GPU copies of the assembled scene.
struct SceneGpu {
    meshes: Vec<MeshBuffer>,
    textures: Vec<BindGroup>,
    objects: Vec<ObjectGpu>,
    points: Option<PointsGpu>,
}

struct FrameTargets {
    scene: GpuTexture,
    bloom_scene: GpuTexture,
    mirror: GpuTexture,
    depth: GpuTexture,
}

impl FrameTargets {
    fn new(device: &Device, width: u32, height: u32) -> Self {
        Self {
            scene: GpuTexture::render_target(device, width, height, "scene_target"),
            bloom_scene: GpuTexture::render_target(device, width, height, "bloom_layer_target"),
            mirror: GpuTexture::render_target(device, width, height, "mirror_target"),
            depth: GpuTexture::depth(device, width, height),
        }
    }
}

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,

    scene_layout: BindGroupLayout,
    object_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    mesh_pipeline: RenderPipeline,
    transparent_pipeline: RenderPipeline,
    points_pipeline: RenderPipeline,
    material_sampler: Sampler,
    mirror_sampler: Sampler,

    reflection_pass: PassUniform,
    bloom_pass: PassUniform,
    main_pass: PassUniform,
    targets: FrameTargets,
    post: PostProcess,
    scene_gpu: Option<SceneGpu>,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_full_output: Option<egui::FullOutput>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(
        device: &Device,
        queue: &Queue,
        format: TextureFormat,
        alpha_mode: CompositeAlphaMode,
        width: u32,
        height: u32,
    ) -> Self {
        let scene_layout = {
            let [tex, smp] = texture_layout_entries(1);
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("scene_bind_group_layout"),
                entries: &[uniform_layout_entry(0, ShaderStages::VERTEX_FRAGMENT), tex, smp],
            })
        };
        let object_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX_FRAGMENT)],
        });
        let texture_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("material_texture_layout"),
            entries: &texture_layout_entries(0),
        });

        let mesh_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let points_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("points_shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let mesh_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let points_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("points_pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = create_scene_pipeline(
            device,
            "mesh_pipeline",
            &mesh_layout,
            &mesh_shader,
            ("vs_main", "fs_main"),
            Vertex::layout(),
            true,
        );
        let transparent_pipeline = create_scene_pipeline(
            device,
            "transparent_pipeline",
            &mesh_layout,
            &mesh_shader,
            ("vs_main", "fs_main"),
            Vertex::layout(),
            false,
        );
        let points_pipeline = create_scene_pipeline(
            device,
            "points_pipeline",
            &points_layout,
            &points_shader,
            ("vs_points", "fs_points"),
            VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as BufferAddress,
                step_mode: VertexStepMode::Instance,
                attributes: &POINT_ATTRIBUTES,
            },
            true,
        );

        let material_sampler = linear_sampler(device, AddressMode::Repeat, "material_sampler");
        let mirror_sampler = linear_sampler(device, AddressMode::ClampToEdge, "mirror_sampler");
        let blank_mirror = GpuTexture::upload(
            device,
            queue,
            &crate::assets::ImageData::solid([0, 0, 0, 255]),
            "blank_mirror",
        );

        let targets = FrameTargets::new(device, width, height);
        let reflection_pass =
            create_pass_uniform(device, &scene_layout, &blank_mirror.view, &mirror_sampler, "reflection_pass");
        let bloom_pass =
            create_pass_uniform(device, &scene_layout, &targets.mirror.view, &mirror_sampler, "bloom_pass");
        let main_pass = create_pass_uniform(device, &scene_layout, &targets.mirror.view, &mirror_sampler, "main_pass");
        let post = PostProcess::new(device, format, &targets.scene, &targets.bloom_scene);

        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            format,
            alpha_mode,
            width,
            height,
            scene_layout,
            object_layout,
            texture_layout,
            mesh_pipeline,
            transparent_pipeline,
            points_pipeline,
            material_sampler,
            mirror_sampler,
            reflection_pass,
            bloom_pass,
            main_pass,
            targets,
            post,
            scene_gpu: None,
            egui_renderer,
            egui_primitives: None,
            egui_full_output: None,
            egui_dpr: 1.0,
        }
    }

    pub fn surface_config(&self) -> SurfaceConfiguration {
        SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: self.width,
            height: self.height,
            present_mode: PresentMode::Fifo,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    /// Reconfigure the surface and recreate every size-dependent target.
    pub fn resize(&mut self, device: &Device, surface: &Surface, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        surface.configure(device, &self.surface_config());

        self.targets = FrameTargets::new(device, width, height);
        let mirror = &self.targets.mirror.view;
        self.bloom_pass = create_pass_uniform(device, &self.scene_layout, mirror, &self.mirror_sampler, "bloom_pass");
        self.main_pass = create_pass_uniform(device, &self.scene_layout, mirror, &self.mirror_sampler, "main_pass");
        self.post.resize(device, &self.targets.scene, &self.targets.bloom_scene);
        tracing::debug!(width, height, "render targets resized");
    }

    /// Upload meshes, textures and per-object buffers of a freshly assembled scene.
    pub fn upload_scene(&mut self, device: &Device, queue: &Queue, scene: &Scene) {
        let meshes: Vec<MeshBuffer> = scene.meshes.iter().map(|(_, mesh)| mesh.upload(device)).collect();

        let textures: Vec<BindGroup> = scene
            .textures
            .iter()
            .map(|(id, image)| {
                let texture = GpuTexture::upload(device, queue, image, "material_texture");
                device.create_bind_group(&BindGroupDescriptor {
                    label: Some(&format!("material_texture_{}", id.0)),
                    layout: &self.texture_layout,
                    entries: &[
                        BindGroupEntry { binding: 0, resource: BindingResource::TextureView(&texture.view) },
                        BindGroupEntry { binding: 1, resource: BindingResource::Sampler(&self.material_sampler) },
                    ],
                })
            })
            .collect();

        let objects: Vec<ObjectGpu> = scene
            .objects
            .iter()
            .enumerate()
            .map(|(i, object)| {
                let uniform = ObjectUniform::new(scene.world_matrix(ObjectId(i)), &object.material, object.bloom);
                self.create_object_gpu(device, &uniform)
            })
            .collect();

        let points = scene.hologram.as_ref().filter(|rig| !rig.cloud.is_empty()).map(|rig| {
            let positions: Vec<[f32; 3]> = rig.cloud.current.iter().map(|p| p.to_array()).collect();
            let instances = device.create_buffer_init(&util::BufferInitDescriptor {
                label: Some("hologram_points"),
                contents: bytemuck::cast_slice(&positions),
                usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            });
            let uniform = ObjectUniform::points(scene.group_matrix(rig.group), rig.color, rig.point_size);
            PointsGpu { instances, count: positions.len() as u32, object: self.create_object_gpu(device, &uniform) }
        });

        tracing::info!(
            meshes = meshes.len(),
            textures = textures.len(),
            objects = objects.len(),
            points = points.as_ref().map_or(0, |p| p.count),
            "scene uploaded"
        );
        self.scene_gpu = Some(SceneGpu { meshes, textures, objects, points });
    }

    fn create_object_gpu(&self, device: &Device, uniform: &ObjectUniform) -> ObjectGpu {
        let buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("object_uniform"),
            contents: bytemuck::bytes_of(uniform),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: &self.object_layout,
            entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
        });
        ObjectGpu { buffer, bind_group }
    }

    /// Push moved hologram points to the instance buffer.
    pub fn write_points(&self, queue: &Queue, points: &[Vec3]) {
        let Some(gpu) = self.scene_gpu.as_ref().and_then(|g| g.points.as_ref()) else {
            return;
        };
        let positions: Vec<[f32; 3]> = points.iter().take(gpu.count as usize).map(|p| p.to_array()).collect();
        queue.write_buffer(&gpu.instances, 0, bytemuck::cast_slice(&positions));
    }

    fn write_uniforms(&self, queue: &Queue, scene: Option<&Scene>, camera: &Camera, settings: &Settings) {
        for (pass, kind) in [
            (&self.reflection_pass, PassKind::Reflection),
            (&self.bloom_pass, PassKind::BloomLayer),
            (&self.main_pass, PassKind::Main),
        ] {
            let uniform = SceneUniform::new(camera, settings, self.width, self.height, kind);
            queue.write_buffer(&pass.buffer, 0, bytemuck::bytes_of(&uniform));
        }
        self.post.write_params(queue, settings);

        let (Some(scene), Some(gpu)) = (scene, self.scene_gpu.as_ref()) else {
            return;
        };
        for (i, (object, object_gpu)) in scene.objects.iter().zip(&gpu.objects).enumerate() {
            let uniform = ObjectUniform::new(scene.world_matrix(ObjectId(i)), &object.material, object.bloom);
            queue.write_buffer(&object_gpu.buffer, 0, bytemuck::bytes_of(&uniform));
        }
        if let (Some(rig), Some(points)) = (scene.hologram.as_ref(), gpu.points.as_ref()) {
            let uniform = ObjectUniform::points(scene.group_matrix(rig.group), rig.color, rig.point_size);
            queue.write_buffer(&points.object.buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    fn scene_pass(
        &self,
        encoder: &mut CommandEncoder,
        kind: PassKind,
        scene: Option<&Scene>,
        list: &DrawList,
    ) {
        let (label, target, pass) = match kind {
            PassKind::Reflection => ("reflection_pass", &self.targets.mirror.view, &self.reflection_pass),
            PassKind::BloomLayer => ("bloom_layer_pass", &self.targets.bloom_scene.view, &self.bloom_pass),
            PassKind::Main => ("main_pass", &self.targets.scene.view, &self.main_pass),
        };
        let [r, g, b] = config::FOG_COLOR;

        let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color { r: r as f64, g: g as f64, b: b as f64, a: 1.0 }),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.targets.depth.view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let (Some(scene), Some(gpu)) = (scene, self.scene_gpu.as_ref()) else {
            return;
        };
        rp.set_bind_group(0, &pass.bind_group, &[]);

        let visible = |id: &&ObjectId| kind != PassKind::Reflection || appears_in_reflection(scene, **id);

        rp.set_pipeline(&self.mesh_pipeline);
        for id in list.opaque.iter().filter(visible) {
            draw_object(&mut rp, scene, gpu, *id);
        }

        if let Some(points) = gpu.points.as_ref() {
            rp.set_pipeline(&self.points_pipeline);
            rp.set_bind_group(1, &points.object.bind_group, &[]);
            rp.set_vertex_buffer(0, points.instances.slice(..));
            rp.draw(0..6, 0..points.count);
        }

        rp.set_pipeline(&self.transparent_pipeline);
        for id in list.transparent.iter().filter(visible) {
            draw_object(&mut rp, scene, gpu, *id);
        }
    }

    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        scene: Option<&Scene>,
        camera: &Camera,
        settings: &Settings,
    ) -> Result<(), SurfaceError> {
        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        self.write_uniforms(queue, scene, camera, settings);
        let list = scene.map(|s| DrawList::build(s, camera.eye)).unwrap_or_default();

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });
        self.scene_pass(&mut encoder, PassKind::Reflection, scene, &list);
        self.scene_pass(&mut encoder, PassKind::BloomLayer, scene, &list);
        self.scene_pass(&mut encoder, PassKind::Main, scene, &list);
        self.post.run(&mut encoder, &view);

        if let (Some(egui_primitives), Some(egui_full_output)) =
            (self.egui_primitives.take(), self.egui_full_output.take())
        {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.width, self.height],
                pixels_per_point: self.egui_dpr,
            };

            // Upload egui textures
            for (id, image_delta) in &egui_full_output.textures_delta.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &egui_primitives, &screen_descriptor);

            // Render egui overlay
            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &egui_primitives, &screen_descriptor);
            }

            for id in &egui_full_output.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

const POINT_ATTRIBUTES: [VertexAttribute; 1] = vertex_attr_array![0 => Float32x3];

fn draw_object(rp: &mut RenderPass<'_>, scene: &Scene, gpu: &SceneGpu, id: ObjectId) {
    let object = scene.object(id);
    let mesh = &gpu.meshes[object.mesh.0];
    if mesh.index_count == 0 {
        return;
    }
    let texture = object.material.texture().unwrap_or(TextureId::WHITE);
    rp.set_bind_group(1, &gpu.objects[id.0].bind_group, &[]);
    rp.set_bind_group(2, &gpu.textures[texture.0], &[]);
    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
    rp.draw_indexed(0..mesh.index_count, 0, 0..1);
}

fn create_pass_uniform(
    device: &Device,
    layout: &BindGroupLayout,
    mirror: &TextureView,
    sampler: &Sampler,
    label: &str,
) -> PassUniform {
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<SceneUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: BindingResource::TextureView(mirror) },
            BindGroupEntry { binding: 2, resource: BindingResource::Sampler(sampler) },
        ],
    });
    PassUniform { buffer, bind_group }
}

fn create_scene_pipeline(
    device: &Device,
    label: &str,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    (vs_entry, fs_entry): (&str, &str),
    vertex_layout: VertexBufferLayout<'static>,
    depth_write: bool,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // model materials are double sided and the reflection flips winding
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scene::SceneObject;
    use crate::utils::Mesh;

    fn object(scene: &mut Scene, name: &str, z: f32, material: Material) -> ObjectId {
        let mesh = scene.meshes.add(Mesh::plane(1.0, 1.0));
        scene.add_object(SceneObject::new(name, mesh, Mat4::from_translation(Vec3::new(0.0, 0.0, z)), material))
    }

    fn glass(opacity: f32) -> Material {
        Material::Basic { color: [1.0; 3], texture: None, opacity }
    }

    #[test]
    fn transparent_objects_sort_back_to_front() {
        let mut scene = Scene::new();
        let solid = object(&mut scene, "solid", 0.0, glass(1.0));
        let near = object(&mut scene, "near", 5.0, glass(0.5));
        let far = object(&mut scene, "far", -5.0, glass(0.5));
        let list = DrawList::build(&scene, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(list.opaque, vec![solid]);
        assert_eq!(list.transparent, vec![far, near]);
    }

    #[test]
    fn hidden_and_invisible_objects_are_skipped() {
        let mut scene = Scene::new();
        object(&mut scene, "pick_only", 0.0, Material::Hidden);
        let off = object(&mut scene, "off", 0.0, glass(1.0));
        scene.object_mut(off).visible = false;
        assert_eq!(DrawList::build(&scene, Vec3::Z), DrawList::default());
    }

    #[test]
    fn mirror_and_floor_stay_out_of_the_reflection() {
        let mut scene = Scene::new();
        let mirror = object(&mut scene, "mirror", 0.0, Material::Mirror { tint: [0.5; 3] });
        let floor = object(&mut scene, "floor", 0.0, glass(0.8));
        let ramen = object(&mut scene, "ramen", 0.0, glass(1.0));
        scene.floor = Some(floor);
        assert!(!appears_in_reflection(&scene, mirror));
        assert!(!appears_in_reflection(&scene, floor));
        assert!(appears_in_reflection(&scene, ramen));
    }

    #[test]
    fn uniforms_match_shader_layout() {
        assert_eq!(std::mem::size_of::<SceneUniform>(), 176);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
    }

    #[test]
    fn bloom_pass_darkens_and_reflection_clips() {
        let camera = Camera::new(800, 600);
        let settings = Settings::default();
        let bloom = SceneUniform::new(&camera, &settings, 800, 600, PassKind::BloomLayer);
        assert_eq!(bloom.flags[0], 1.0);
        assert_eq!(bloom.flags[1], 0.0);
        let reflection = SceneUniform::new(&camera, &settings, 800, 600, PassKind::Reflection);
        assert_eq!(reflection.flags[1], 1.0);
        assert!(reflection.eye[1] < config::MIRROR_HEIGHT);
    }

    #[test]
    fn object_uniform_encodes_material_kind_and_bloom() {
        let physical = Material::Physical {
            color: [0.1; 3],
            roughness: 0.3,
            metalness: 0.8,
            clearcoat: 0.6,
            clearcoat_roughness: 0.07,
            opacity: 0.8,
        };
        let u = ObjectUniform::new(Mat4::IDENTITY, &physical, true);
        assert_eq!(u.material, [KIND_PHYSICAL, 0.3, 0.8, 0.6]);
        assert_eq!(u.color[3], 0.8);
        assert_eq!(u.extra[0], 0.07);
        assert_eq!(u.extra[1], 1.0);
    }
}
