//! Mesh import from scene files.
//!
//! Implements the import collaborator behind [`crate::mesh::Mesh::from_stl_file`]:
//! read a file, hand back raw positions/normals/indices, and distinguish a
//! hard failure (unreadable or unparseable file) from the soft "file is fine
//! but holds no geometry" outcome. Only STL is supported; the format carries
//! per-face normals and no texture coordinates, so every imported vertex gets
//! UV (0, 0) and normals are taken as authored, never recomputed.

use std::path::Path;

use crate::mesh::MeshVertex;

/// Hard import failures. A scene that parses but contains no mesh is *not*
/// an error; see [`StlImport::Empty`].
#[derive(Debug)]
pub enum ImportError {
    /// File could not be read.
    Io(std::io::Error),
    /// File contents could not be parsed as STL.
    Parse(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "IO error: {}", e),
            ImportError::Parse(msg) => write!(f, "STL parse error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(e) => Some(e),
            ImportError::Parse(_) => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

/// Successful import outcome.
#[derive(Debug)]
pub enum StlImport {
    /// Geometry was found: vertices with trusted normals, plus triangle
    /// indices (sequential — STL duplicates vertices per facet).
    Geometry {
        vertices: Vec<MeshVertex>,
        indices: Vec<u32>,
    },
    /// The file parsed but contained no triangles.
    Empty,
}

/// Reads the first (and only) mesh from an STL file.
pub fn load_stl_file(path: impl AsRef<Path>) -> Result<StlImport, ImportError> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = std::io::BufReader::new(file);
    parse_stl(&mut reader)
}

/// Parses STL from in-memory bytes. Useful for embedded assets and tests.
pub fn load_stl_bytes(bytes: &[u8]) -> Result<StlImport, ImportError> {
    let mut cursor = std::io::Cursor::new(bytes);
    parse_stl(&mut cursor)
}

fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<StlImport, ImportError> {
    let stl = stl_io::read_stl(reader).map_err(|e| ImportError::Parse(e.to_string()))?;

    if stl.faces.is_empty() {
        log::warn!("STL file contains no triangles");
        return Ok(StlImport::Empty);
    }

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);

    for (i, face) in stl.faces.iter().enumerate() {
        let normal: [f32; 3] = face.normal.into();

        for &vertex_idx in &face.vertices {
            let position: [f32; 3] = stl.vertices[vertex_idx].into();
            vertices.push(MeshVertex {
                position,
                normal,
                uv: [0.0, 0.0],
            });
        }

        let base = (i * 3) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    Ok(StlImport::Geometry { vertices, indices })
}
