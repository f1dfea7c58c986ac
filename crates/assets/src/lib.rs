//! Model templates: content-addressed glTF metadata that streamed entities clone.
//!
//! The simulation never touches geometry or materials. It needs to know that a
//! template exists (rescue targets do not spawn before one is loaded) and how
//! long its animation clip runs so new clones can start at a random phase.
//!
//! # Layout
//! Templates are keyed by a content hash of the source file. Loading the same
//! path twice returns the cached template without touching the disk again.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A;

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Opaque model template. Presentation resolves `id` to real geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTemplate {
    pub id: AssetId,
    pub name: String,
    pub mesh_count: u32,
    /// Length of the first animation clip in seconds, if the model is animated.
    pub clip_duration: Option<f32>,
}

impl ModelTemplate {
    /// An in-memory template, for hosts that load geometry themselves.
    pub fn placeholder(name: &str, clip_duration: Option<f32>) -> Self {
        Self {
            id: content_hash(name.as_bytes()),
            name: name.to_string(),
            mesh_count: 1,
            clip_duration,
        }
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0:?}")]
    NotFound(AssetId),
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),
}

/// Loads model templates ahead of gameplay. Failures propagate; no retries.
pub trait TemplateLoader {
    fn load_template(&mut self, path: &Path) -> Result<ModelTemplate, AssetError>;
}

/// Template registry with a per-path cache.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    templates: BTreeMap<AssetId, ModelTemplate>,
    by_path: BTreeMap<PathBuf, AssetId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a template by ID.
    pub fn get(&self, id: AssetId) -> Result<&ModelTemplate, AssetError> {
        self.templates.get(&id).ok_or(AssetError::NotFound(id))
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Register a template built elsewhere.
    pub fn register(&mut self, template: ModelTemplate) -> AssetId {
        let id = template.id;
        self.templates.insert(id, template);
        id
    }

    /// Load several templates in order, e.g. the asteroid variants.
    pub fn load_all<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<Vec<ModelTemplate>, AssetError> {
        paths
            .iter()
            .map(|p| self.load_template(p.as_ref()))
            .collect()
    }

    /// Parse a `.gltf` (JSON) or `.glb` (binary container) file.
    ///
    /// Only metadata is read: mesh count and the first clip's duration.
    pub fn import_gltf(&mut self, path: impl AsRef<Path>) -> Result<ModelTemplate, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        let json_bytes = match path.extension().and_then(|e| e.to_str()) {
            Some("gltf") => bytes.as_slice(),
            Some("glb") => glb_json_chunk(&bytes)?,
            other => {
                return Err(AssetError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ));
            }
        };

        let template = parse_gltf_json(&name, json_bytes, content_hash(&bytes))?;
        tracing::debug!(
            name = %template.name,
            meshes = template.mesh_count,
            clip = ?template.clip_duration,
            "imported model template"
        );
        self.register(template.clone());
        Ok(template)
    }
}

impl TemplateLoader for AssetStore {
    fn load_template(&mut self, path: &Path) -> Result<ModelTemplate, AssetError> {
        if let Some(id) = self.by_path.get(path) {
            return self.get(*id).cloned();
        }
        let template = self.import_gltf(path)?;
        self.by_path.insert(path.to_path_buf(), template.id);
        Ok(template)
    }
}

fn parse_gltf_json(name: &str, data: &[u8], id: AssetId) -> Result<ModelTemplate, AssetError> {
    let json: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| AssetError::GltfParse(e.to_string()))?;

    if json.get("asset").is_none() {
        return Err(AssetError::GltfParse("missing `asset` object".into()));
    }

    let mesh_count = json
        .get("meshes")
        .and_then(|m| m.as_array())
        .map_or(0, |m| m.len() as u32);

    Ok(ModelTemplate {
        id,
        name: name.to_string(),
        mesh_count,
        clip_duration: first_clip_duration(&json),
    })
}

/// A clip lasts as long as its latest keyframe: the largest `max` among the
/// input accessors of its samplers.
fn first_clip_duration(json: &serde_json::Value) -> Option<f32> {
    let clip = json.get("animations")?.as_array()?.first()?;
    let accessors = json.get("accessors")?.as_array()?;

    clip.get("samplers")?
        .as_array()?
        .iter()
        .filter_map(|sampler| sampler.get("input")?.as_u64())
        .filter_map(|input| accessors.get(input as usize))
        .filter_map(|accessor| accessor.get("max")?.as_array()?.first()?.as_f64())
        .map(|t| t as f32)
        .reduce(f32::max)
}

fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], AssetError> {
    let read_u32 = |offset: usize| -> Result<u32, AssetError> {
        bytes
            .get(offset..offset + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| AssetError::GltfParse("truncated GLB header".into()))
    };

    if bytes.get(0..4) != Some(GLB_MAGIC.as_slice()) {
        return Err(AssetError::GltfParse("bad GLB magic".into()));
    }
    let chunk_len = read_u32(12)? as usize;
    if read_u32(16)? != GLB_JSON_CHUNK {
        return Err(AssetError::GltfParse("first GLB chunk is not JSON".into()));
    }
    bytes
        .get(20..20 + chunk_len)
        .ok_or_else(|| AssetError::GltfParse("truncated GLB JSON chunk".into()))
}

fn content_hash(data: &[u8]) -> AssetId {
    let result = Sha256::digest(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

pub fn crate_info() -> &'static str {
    "driftfield-assets v0.1.0"
}
