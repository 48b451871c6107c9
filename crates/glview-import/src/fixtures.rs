//! Minimal in-memory GLB files for tests.

/// Wrap a JSON document and a binary buffer in a GLB container.
pub fn glb_container(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.as_bytes().to_vec();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin.to_vec();
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_bytes);

    out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin_bytes);
    out
}

/// Binary buffer shared by the fixtures: a unit right triangle in the XY
/// plane (36 bytes of f32 positions) followed by u16 indices 0, 1, 2.
fn triangle_buffer() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bin: Vec<u8> = positions.iter().flat_map(|v| v.to_le_bytes()).collect();
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin
}

fn triangle_document(scenes_and_nodes: &str) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  {scenes_and_nodes},
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}],
  "materials": [{{ "name": "red", "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.0, "roughnessFactor": 0.8 }} }}],
  "buffers": [{{ "byteLength": 42 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
    )
}

/// One red triangle on a node translated +2 along X.
pub fn triangle_glb() -> Vec<u8> {
    let json = triangle_document(
        r#""scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0, "translation": [2.0, 0.0, 0.0] }]"#,
    );
    glb_container(&json, &triangle_buffer())
}

/// The triangle instanced twice under a parent scaled by 2.
pub fn two_instance_glb() -> Vec<u8> {
    let json = triangle_document(
        r#""scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "children": [1, 2], "scale": [2.0, 2.0, 2.0] },
    { "mesh": 0, "translation": [1.0, 0.0, 0.0] },
    { "mesh": 0, "translation": [-1.0, 0.0, 0.0] }
  ]"#,
    );
    glb_container(&json, &triangle_buffer())
}

/// A valid container whose scene has no meshes.
pub fn empty_scene_glb() -> Vec<u8> {
    let json = r#"{ "asset": { "version": "2.0" }, "scene": 0, "scenes": [{ "nodes": [0] }], "nodes": [{ "name": "empty" }] }"#;
    let mut out = glb_container(json, &[]);
    // Drop the empty BIN chunk header; a GLB without buffers carries no BIN chunk.
    out.truncate(out.len() - 8);
    let total = out.len() as u32;
    out[8..12].copy_from_slice(&total.to_le_bytes());
    out
}

/// Two nodes that list each other as children.
pub fn cyclic_nodes_glb() -> Vec<u8> {
    let json = triangle_document(
        r#""scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "mesh": 0, "children": [1] },
    { "children": [0] }
  ]"#,
    );
    glb_container(&json, &triangle_buffer())
}

/// A node that lists itself as its own child.
pub fn self_parented_glb() -> Vec<u8> {
    let json = triangle_document(
        r#""scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0, "children": [0] }]"#,
    );
    glb_container(&json, &triangle_buffer())
}
