//! Decoded model types

use serde::Serialize;

/// Everything the renderer needs from one `.glb` file
#[derive(Debug, Default)]
pub struct ImportResult {
    /// One entry per triangle primitive, positions in model root space
    pub meshes: Vec<ImportedMesh>,
    /// Indexed by glTF material index
    pub materials: Vec<ImportedMaterial>,
    /// Indexed by glTF image index, already converted to RGBA8
    pub textures: Vec<ImportedTexture>,
}

impl ImportResult {
    /// Compute the combined bounding box across all meshes
    pub fn bounds(&self) -> Option<MeshBounds> {
        self.meshes
            .iter()
            .filter_map(|m| m.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            meshes: self.meshes.len(),
            vertices: self.meshes.iter().map(|m| m.positions.len()).sum(),
            triangles: self.meshes.iter().map(|m| m.indices.len() / 3).sum(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }

    /// Centre the model on the origin and scale it uniformly so its bounding
    /// sphere has the given radius. Returns the applied scale factor.
    pub fn fit_to_radius(&mut self, radius: f32) -> f32 {
        let Some(bounds) = self.bounds() else {
            return 1.0;
        };
        let center = bounds.center();
        let current = bounds.radius();
        let scale = if current > f32::EPSILON {
            radius / current
        } else {
            1.0
        };

        for mesh in &mut self.meshes {
            for p in &mut mesh.positions {
                for i in 0..3 {
                    p[i] = (p[i] - center[i]) * scale;
                }
            }
        }
        scale
    }
}

/// Counts shown in the model info panel and by `glview inspect`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub materials: usize,
    pub textures: usize,
}

/// A triangle list with per-vertex attributes
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Empty when the primitive has no TEXCOORD_0
    pub uvs: Vec<[f32; 2]>,
    /// Empty when the primitive has no COLOR_0
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub material_index: Option<usize>,
}

impl ImportedMesh {
    pub fn bounds(&self) -> Option<MeshBounds> {
        MeshBounds::from_positions(&self.positions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// PBR metallic-roughness material factors
#[derive(Debug, Clone)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Index into [`ImportResult::textures`]
    pub base_color_texture: Option<usize>,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}

impl Default for ImportedMaterial {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            base_color_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

/// An image decoded to tightly packed RGBA8
#[derive(Debug, Clone)]
pub struct ImportedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Axis-aligned bounding box computed from vertex positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl MeshBounds {
    /// Compute bounds from a set of vertex positions
    pub fn from_positions(positions: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some(Self { min, max })
    }

    /// Size along each axis
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Half the diagonal: radius of the enclosing sphere around `center()`
    pub fn radius(&self) -> f32 {
        let s = self.size();
        (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt() * 0.5
    }

    /// Merge with another bounds to get the union
    pub fn union(&self, other: &MeshBounds) -> MeshBounds {
        MeshBounds {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

impl std::fmt::Display for MeshBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(
            f,
            "{:.2} x {:.2} x {:.2} (min [{:.2}, {:.2}, {:.2}], max [{:.2}, {:.2}, {:.2}])",
            s[0], s[1], s[2],
            self.min[0], self.min[1], self.min[2],
            self.max[0], self.max[1], self.max[2],
        )
    }
}
