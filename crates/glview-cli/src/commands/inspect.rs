//! Model statistics command

use super::read_model;
use anyhow::{bail, Context, Result};
use glview_core::{format_size, ContentHash};
use glview_import::{decode_glb, ImportResult, MeshBounds, ModelStats};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct InspectReport {
    name: String,
    size: u64,
    hash: String,
    #[serde(flatten)]
    stats: ModelStats,
    bounds: Option<MeshBounds>,
}

impl InspectReport {
    fn new(name: String, bytes: &[u8], model: &ImportResult) -> Self {
        Self {
            name,
            size: bytes.len() as u64,
            hash: ContentHash::from_bytes(bytes).to_prefixed_hex(),
            stats: model.stats(),
            bounds: model.bounds(),
        }
    }

    fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Name:      {}\n", self.name));
        out.push_str(&format!("Size:      {}\n", format_size(self.size)));
        out.push_str(&format!("Hash:      {}\n", self.hash));
        out.push_str(&format!("Meshes:    {}\n", self.stats.meshes));
        out.push_str(&format!("Vertices:  {}\n", self.stats.vertices));
        out.push_str(&format!("Triangles: {}\n", self.stats.triangles));
        out.push_str(&format!("Materials: {}\n", self.stats.materials));
        out.push_str(&format!("Textures:  {}\n", self.stats.textures));
        match &self.bounds {
            Some(bounds) => out.push_str(&format!("Bounds:    {}\n", bounds)),
            None => out.push_str("Bounds:    (empty)\n"),
        }
        out
    }
}

pub fn run(file: &Path, format: &str) -> Result<()> {
    let (name, bytes) = read_model(file)?;
    let model = decode_glb(&bytes).with_context(|| format!("Failed to decode {}", name))?;
    let report = InspectReport::new(name, &bytes, &model);

    let output = match format {
        "json" => serde_json::to_string_pretty(&report)?,
        "text" => report.to_text(),
        other => bail!("Unknown format '{}'. Use 'text' or 'json'.", other),
    };
    println!("{}", output.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glview_import::fixtures::triangle_glb;

    fn report() -> InspectReport {
        let bytes = triangle_glb();
        let model = decode_glb(&bytes).unwrap();
        InspectReport::new("triangle.glb".to_string(), &bytes, &model)
    }

    #[test]
    fn test_text_report_lists_counts() {
        let text = report().to_text();
        assert!(text.contains("Name:      triangle.glb"));
        assert!(text.contains("Triangles: 1"));
        assert!(text.contains("Vertices:  3"));
        assert!(text.contains("Hash:      sha256:"));
    }

    #[test]
    fn test_json_report_is_flat() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(value["name"], "triangle.glb");
        assert_eq!(value["triangles"], 1);
        assert_eq!(value["meshes"], 1);
        assert!(value["bounds"]["min"].is_array());
    }
}
