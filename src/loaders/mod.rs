//! Seed mesh loading.
//!
//! The simulation only needs two things from a model: vertex positions (the
//! particles' rest shape) and per-vertex colors. This module reads exactly
//! that from a GLB/GLTF blob and nothing else.

use thiserror::Error;

/// Errors raised while loading a seed mesh. All are fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The GLB/GLTF data could not be parsed.
    #[error("Failed to parse GLTF: {0}")]
    Parse(String),

    /// The file contains no mesh primitive.
    #[error("Model contains no mesh primitive")]
    NoPrimitives,

    /// The primitive has no vertex positions.
    #[error("Mesh primitive has no vertex positions")]
    MissingPositions,

    /// The mesh has zero vertices.
    #[error("Mesh has zero vertices")]
    Empty,

    /// Color and position counts differ.
    #[error("Color count {colors} does not match vertex count {vertices}")]
    ColorCountMismatch {
        /// Number of colors supplied.
        colors: usize,
        /// Number of vertex positions supplied.
        vertices: usize,
    },
}

/// Vertex positions and colors that seed the particle swarm.
///
/// Immutable after creation; one particle is spawned per vertex.
pub struct SeedMesh {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl SeedMesh {
    /// Create a seed mesh from parallel position and color arrays.
    pub fn new(positions: Vec<[f32; 3]>, colors: Vec<[f32; 3]>) -> Result<Self, LoadError> {
        if positions.is_empty() {
            return Err(LoadError::Empty);
        }
        if colors.len() != positions.len() {
            return Err(LoadError::ColorCountMismatch {
                colors: colors.len(),
                vertices: positions.len(),
            });
        }
        Ok(Self { positions, colors })
    }

    /// Load the first mesh primitive from GLB/GLTF bytes.
    pub fn from_glb_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let (document, buffers, _images) =
            gltf::import_slice(data).map_err(|e| LoadError::Parse(e.to_string()))?;

        let primitive = document
            .meshes()
            .flat_map(|mesh| mesh.primitives())
            .next()
            .ok_or(LoadError::NoPrimitives)?;

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(LoadError::MissingPositions)?
            .collect();

        let colors: Vec<[f32; 3]> = match reader.read_colors(0) {
            Some(colors) => colors.into_rgb_f32().collect(),
            None => {
                log::warn!("seed mesh has no COLOR_0 attribute, defaulting to white");
                vec![[1.0, 1.0, 1.0]; positions.len()]
            }
        };

        log::info!("loaded seed mesh with {} vertices", positions.len());
        Self::new(positions, colors)
    }

    /// Number of vertices (= particle count).
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the mesh is empty. Construction forbids this.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Per-vertex colors, parallel to [`positions`](Self::positions).
    #[inline]
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mesh_is_fatal() {
        assert!(matches!(
            SeedMesh::new(vec![], vec![]),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn mismatched_colors_are_fatal() {
        let result = SeedMesh::new(vec![[0.0; 3], [1.0; 3]], vec![[1.0; 3]]);
        assert!(matches!(
            result,
            Err(LoadError::ColorCountMismatch { colors: 1, vertices: 2 })
        ));
    }

    #[test]
    fn parallel_arrays_are_accepted() {
        let mesh = SeedMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )
        .unwrap();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.positions()[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(matches!(
            SeedMesh::from_glb_bytes(&[0u8; 16]),
            Err(LoadError::Parse(_))
        ));
    }
}
