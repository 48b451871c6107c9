//! GLB decoding

use crate::types::{AlphaMode, ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture};
use glam::{Mat3, Mat4, Vec3};
use glview_core::{Result, ViewerError};
use std::collections::HashSet;

/// Decode the bytes of a `.glb` file.
///
/// Only self-contained files decode: a glTF that points at external buffer or
/// image URIs fails because there is no directory to resolve them against.
pub fn decode_glb(bytes: &[u8]) -> Result<ImportResult> {
    let (document, buffers, images) = gltf::import_slice(bytes)
        .map_err(|e| ViewerError::DecodeFailed(format!("not a valid glTF binary: {}", e)))?;

    let mut result = ImportResult {
        materials: document.materials().map(convert_material).collect(),
        textures: images
            .iter()
            .zip(document.images())
            .map(|(data, image)| convert_image(data, image.name(), image.index()))
            .collect(),
        meshes: Vec::new(),
    };

    // Roots of the default scene; files without scenes fall back to every
    // node that is nobody's child.
    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => {
            let children: HashSet<usize> = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()))
                .collect();
            document
                .nodes()
                .filter(|n| !children.contains(&n.index()))
                .collect()
        }
    };

    // Depth-first; `path` holds the ancestors of the node being visited, so a
    // node that reappears among its own ancestors closes a cycle.
    let mut path: Vec<usize> = Vec::new();
    let mut stack: Vec<(gltf::Node, Mat4, usize)> =
        roots.into_iter().rev().map(|n| (n, Mat4::IDENTITY, 0)).collect();
    while let Some((node, parent, depth)) = stack.pop() {
        path.truncate(depth);
        if path.contains(&node.index()) {
            return Err(ViewerError::DecodeFailed(
                "node hierarchy contains a cycle".to_string(),
            ));
        }
        path.push(node.index());

        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            extract_mesh(&mesh, &world, &buffers, &mut result.meshes);
        }
        for child in node.children() {
            stack.push((child, world, depth + 1));
        }
    }

    if result.meshes.is_empty() {
        return Err(ViewerError::DecodeFailed(
            "the file contains no triangle meshes".to_string(),
        ));
    }

    let stats = result.stats();
    log::debug!(
        "Decoded GLB: {} meshes, {} vertices, {} triangles, {} materials, {} textures",
        stats.meshes,
        stats.vertices,
        stats.triangles,
        stats.materials,
        stats.textures
    );
    Ok(result)
}

fn extract_mesh(
    mesh: &gltf::Mesh,
    world: &Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) {
    let mesh_name = mesh
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
    let normal_matrix = Mat3::from_mat4(*world).inverse().transpose();
    let mirrored = world.determinant() < 0.0;

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let Some(positions) = reader.read_positions() else {
            log::debug!("Skipping primitive without positions in '{}'", mesh_name);
            continue;
        };
        let positions: Vec<[f32; 3]> = positions
            .map(|p| world.transform_point3(Vec3::from_array(p)).to_array())
            .collect();

        let raw_indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let mut indices = match triangulate(primitive.mode(), &raw_indices) {
            Some(indices) => indices,
            None => {
                log::debug!(
                    "Skipping {:?} primitive in '{}': only triangles are rendered",
                    primitive.mode(),
                    mesh_name
                );
                continue;
            }
        };
        if indices.iter().any(|&i| i as usize >= positions.len()) {
            log::warn!("Skipping primitive in '{}' with out-of-range indices", mesh_name);
            continue;
        }
        if mirrored {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }

        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(iter) => iter
                .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero().to_array())
                .collect(),
            None => smooth_normals(&positions, &indices),
        };

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();

        let colors: Vec<[f32; 4]> = reader
            .read_colors(0)
            .map(|iter| iter.into_rgba_f32().collect())
            .unwrap_or_default();

        out.push(ImportedMesh {
            name: mesh_name.clone(),
            positions,
            normals,
            uvs,
            colors,
            indices,
            material_index: primitive.material().index(),
        });
    }
}

/// Convert strip and fan index streams to a plain triangle list.
fn triangulate(mode: gltf::mesh::Mode, indices: &[u32]) -> Option<Vec<u32>> {
    use gltf::mesh::Mode;
    match mode {
        Mode::Triangles => Some(indices[..indices.len() - indices.len() % 3].to_vec()),
        Mode::TriangleStrip => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            for i in 2..indices.len() {
                if i % 2 == 0 {
                    out.extend_from_slice(&[indices[i - 2], indices[i - 1], indices[i]]);
                } else {
                    out.extend_from_slice(&[indices[i - 1], indices[i - 2], indices[i]]);
                }
            }
            Some(out)
        }
        Mode::TriangleFan => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            for i in 2..indices.len() {
                out.extend_from_slice(&[indices[0], indices[i - 1], indices[i]]);
            }
            Some(out)
        }
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => None,
    }
}

/// Area-weighted vertex normals for primitives that ship without NORMAL.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from_array(positions[a]);
        let face = (Vec3::from_array(positions[b]) - pa).cross(Vec3::from_array(positions[c]) - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO {
                [0.0, 1.0, 0.0]
            } else {
                n.to_array()
            }
        })
        .collect()
}

fn convert_material(material: gltf::Material) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    ImportedMaterial {
        name: material
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
        alpha_cutoff: material.alpha_cutoff().unwrap_or(0.5),
        double_sided: material.double_sided(),
    }
}

fn convert_image(data: &gltf::image::Data, name: Option<&str>, index: usize) -> ImportedTexture {
    ImportedTexture {
        name: name
            .map(String::from)
            .unwrap_or_else(|| format!("texture_{}", index)),
        width: data.width,
        height: data.height,
        rgba: ensure_rgba(&data.pixels, data.format),
    }
}

/// Expand any decoded glTF image layout to tightly packed RGBA8.
fn ensure_rgba(pixels: &[u8], format: gltf::image::Format) -> Vec<u8> {
    use gltf::image::Format;

    // 16-bit channels are little-endian; keep the high byte.
    let u16_hi = |chunk: &[u8], i: usize| chunk[i * 2 + 1];
    let f32_to_u8 = |chunk: &[u8], i: usize| {
        let v = f32::from_le_bytes([chunk[i * 4], chunk[i * 4 + 1], chunk[i * 4 + 2], chunk[i * 4 + 3]]);
        (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    };

    match format {
        Format::R8G8B8A8 => pixels.to_vec(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[0], c[0], c[1]])
            .collect(),
        Format::R8 => pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        Format::R16 => pixels
            .chunks_exact(2)
            .flat_map(|c| {
                let v = u16_hi(c, 0);
                [v, v, v, 255]
            })
            .collect(),
        Format::R16G16 => pixels
            .chunks_exact(4)
            .flat_map(|c| {
                let v = u16_hi(c, 0);
                [v, v, v, u16_hi(c, 1)]
            })
            .collect(),
        Format::R16G16B16 => pixels
            .chunks_exact(6)
            .flat_map(|c| [u16_hi(c, 0), u16_hi(c, 1), u16_hi(c, 2), 255])
            .collect(),
        Format::R16G16B16A16 => pixels
            .chunks_exact(8)
            .flat_map(|c| [u16_hi(c, 0), u16_hi(c, 1), u16_hi(c, 2), u16_hi(c, 3)])
            .collect(),
        Format::R32G32B32FLOAT => pixels
            .chunks_exact(12)
            .flat_map(|c| [f32_to_u8(c, 0), f32_to_u8(c, 1), f32_to_u8(c, 2), 255])
            .collect(),
        Format::R32G32B32A32FLOAT => pixels
            .chunks_exact(16)
            .flat_map(|c| [f32_to_u8(c, 0), f32_to_u8(c, 1), f32_to_u8(c, 2), f32_to_u8(c, 3)])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_decode_triangle() {
        let result = decode_glb(&fixtures::triangle_glb()).unwrap();
        assert_eq!(result.meshes.len(), 1);
        let mesh = &result.meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.material_index, Some(0));

        let mat = &result.materials[0];
        assert_eq!(mat.name, "red");
        assert_eq!(mat.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mat.metallic, 0.0);
    }

    #[test]
    fn test_node_translation_is_baked() {
        let result = decode_glb(&fixtures::triangle_glb()).unwrap();
        // Fixture node is translated +2 on X
        let b = result.bounds().unwrap();
        assert_eq!(b.min, [2.0, 0.0, 0.0]);
        assert_eq!(b.max, [3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_instanced_mesh_under_scaled_parent() {
        let result = decode_glb(&fixtures::two_instance_glb()).unwrap();
        assert_eq!(result.meshes.len(), 2);
        let b = result.bounds().unwrap();
        // Parent scale 2, children at x = +1 and x = -1
        assert_eq!(b.min[0], -2.0);
        assert_eq!(b.max[0], 4.0);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let result = decode_glb(&fixtures::triangle_glb()).unwrap();
        // Triangle lies in the XY plane with CCW winding seen from +Z
        for n in &result.meshes[0].normals {
            assert!((n[2] - 1.0).abs() < 1e-5, "normal {:?}", n);
        }
    }

    #[test]
    fn test_garbage_is_decode_failed() {
        let err = decode_glb(b"definitely not a model").unwrap_err();
        assert!(matches!(err, ViewerError::DecodeFailed(_)));
    }

    #[test]
    fn test_scene_without_meshes_is_decode_failed() {
        let err = decode_glb(&fixtures::empty_scene_glb()).unwrap_err();
        assert!(err.to_string().contains("no triangle meshes"));
    }

    #[test]
    fn test_cyclic_node_hierarchy_is_decode_failed() {
        let err = decode_glb(&fixtures::cyclic_nodes_glb()).unwrap_err();
        assert!(matches!(err, ViewerError::DecodeFailed(_)));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_self_parented_node_is_decode_failed() {
        let err = decode_glb(&fixtures::self_parented_glb()).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_sibling_instances_are_not_a_cycle() {
        // Two siblings sharing a mesh revisit no ancestor
        assert!(decode_glb(&fixtures::two_instance_glb()).is_ok());
    }

    #[test]
    fn test_truncated_file_is_decode_failed() {
        let bytes = fixtures::triangle_glb();
        let err = decode_glb(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ViewerError::DecodeFailed(_)));
    }

    #[test]
    fn test_strip_and_fan() {
        use gltf::mesh::Mode;
        assert_eq!(
            triangulate(Mode::TriangleStrip, &[0, 1, 2, 3]).unwrap(),
            vec![0, 1, 2, 2, 1, 3]
        );
        assert_eq!(
            triangulate(Mode::TriangleFan, &[0, 1, 2, 3]).unwrap(),
            vec![0, 1, 2, 0, 2, 3]
        );
        assert_eq!(triangulate(Mode::Triangles, &[0, 1, 2, 3]).unwrap(), vec![0, 1, 2]);
        assert!(triangulate(Mode::Lines, &[0, 1]).is_none());
    }

    #[test]
    fn test_rgba_expansion() {
        use gltf::image::Format;
        assert_eq!(ensure_rgba(&[10, 20, 30], Format::R8G8B8), vec![10, 20, 30, 255]);
        assert_eq!(ensure_rgba(&[7], Format::R8), vec![7, 7, 7, 255]);
        assert_eq!(ensure_rgba(&[0x34, 0x12], Format::R16), vec![0x12, 0x12, 0x12, 255]);
        let one = 1.0f32.to_le_bytes();
        let half = 0.5f32.to_le_bytes();
        let zero = 0.0f32.to_le_bytes();
        let px: Vec<u8> = [one, half, zero].concat();
        assert_eq!(ensure_rgba(&px, Format::R32G32B32FLOAT), vec![255, 128, 0, 255]);
    }
}
