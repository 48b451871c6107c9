//! Decoded model resident on the GPU

use crate::pipeline::{MaterialUniforms, RenderPipelines};
use crate::primitives::Mesh;
use crate::texture::GpuTexture;
use glview_import::{AlphaMode, ImportResult, ImportedMaterial, MeshBounds, ModelStats};
use wgpu::util::DeviceExt;

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub material: usize,
}

pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
    _uniforms: wgpu::Buffer,
}

/// Buffers, textures and material bind groups for one model. The last
/// material is a default used by meshes without one.
pub struct GpuModel {
    pub meshes: Vec<GpuMesh>,
    pub materials: Vec<GpuMaterial>,
    pub bounds: Option<MeshBounds>,
    pub stats: ModelStats,
    _textures: Vec<Option<GpuTexture>>,
}

impl GpuModel {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        result: &ImportResult,
        pipelines: &RenderPipelines,
        white: &GpuTexture,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let textures: Vec<Option<GpuTexture>> = result
            .textures
            .iter()
            .map(|t| GpuTexture::from_imported(device, queue, t))
            .collect();

        let default_material = ImportedMaterial::default();
        let materials: Vec<GpuMaterial> = result
            .materials
            .iter()
            .chain(std::iter::once(&default_material))
            .map(|material| {
                let view = material
                    .base_color_texture
                    .and_then(|i| textures.get(i))
                    .and_then(Option::as_ref)
                    .map(|t| &t.view)
                    .unwrap_or(&white.view);
                create_material(device, pipelines, material, view, sampler)
            })
            .collect();
        let fallback = materials.len() - 1;

        let meshes = result
            .meshes
            .iter()
            .filter(|m| !m.indices.is_empty())
            .map(|imported| {
                let mesh = Mesh::from_imported(imported);
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertices", imported.name)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Indices", imported.name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    material: imported
                        .material_index
                        .filter(|&i| i < fallback)
                        .unwrap_or(fallback),
                }
            })
            .collect();

        let stats = result.stats();
        log::info!(
            "Uploaded model: {} meshes, {} triangles, {} textures",
            stats.meshes,
            stats.triangles,
            stats.textures
        );

        Self {
            meshes,
            materials,
            bounds: result.bounds(),
            stats,
            _textures: textures,
        }
    }

    /// Meshes in draw order: opaque and masked first, blended last
    pub fn draw_order(&self) -> impl Iterator<Item = (&GpuMesh, &GpuMaterial)> + '_ {
        let opaque = self
            .meshes
            .iter()
            .map(move |mesh| (mesh, &self.materials[mesh.material]))
            .filter(|(_, m)| m.alpha_mode != AlphaMode::Blend);
        let blended = self
            .meshes
            .iter()
            .map(move |mesh| (mesh, &self.materials[mesh.material]))
            .filter(|(_, m)| m.alpha_mode == AlphaMode::Blend);
        opaque.chain(blended)
    }

    /// Issue indexed draws for every mesh with whatever pipeline is bound
    pub fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_material(
    device: &wgpu::Device,
    pipelines: &RenderPipelines,
    material: &ImportedMaterial,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> GpuMaterial {
    let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Material Uniforms", material.name)),
        contents: bytemuck::cast_slice(&[MaterialUniforms::from_imported(material)]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Material Bind Group", material.name)),
        layout: &pipelines.material_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuMaterial {
        bind_group,
        alpha_mode: material.alpha_mode,
        double_sided: material.double_sided,
        _uniforms: uniforms,
    }
}
