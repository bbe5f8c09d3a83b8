//! Parsed model types handed to the mesh builder

use serde::{Deserialize, Serialize};

/// Flat, face-expanded vertex buffers for one object.
///
/// Every three entries of `positions` (and `normals`) and every two entries of
/// `uvs` belong to one emitted vertex. There is no index buffer; vertices
/// shared between faces are duplicated.
///
/// Normals and UVs are appended only for faces that reference them, so an
/// object mixing `f 1//1 ...` and `f 1 2 3` faces ends up with `normals`
/// shorter than `positions`. Consumers should compare lengths before
/// pairing attributes per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub positions: Vec<f32>,
    /// Empty when no face of this object referenced a normal
    pub normals: Vec<f32>,
    /// Empty when no face of this object referenced a texture coordinate
    pub uvs: Vec<f32>,
}

impl Geometry {
    /// Number of emitted vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Axis-aligned bounds of the positions, `None` for empty geometry
    pub fn bounds(&self) -> Option<Bounds> {
        let mut chunks = self.positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut bounds = Bounds {
            min: [first[0], first[1], first[2]],
            max: [first[0], first[1], first[2]],
        };
        for p in chunks {
            bounds.include([p[0], p[1], p[2]]);
        }
        Some(bounds)
    }

    pub(crate) fn push_position(&mut self, p: [f32; 3]) {
        self.positions.extend_from_slice(&p);
    }

    pub(crate) fn push_normal(&mut self, n: [f32; 3]) {
        self.normals.extend_from_slice(&n);
    }

    pub(crate) fn push_uv(&mut self, uv: [f32; 2]) {
        self.uvs.extend_from_slice(&uv);
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn include(&mut self, p: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn union(mut self, other: Bounds) -> Bounds {
        self.include(other.min);
        self.include(other.max);
        self
    }

    /// Largest extent along any axis
    pub fn size(&self) -> f32 {
        (0..3)
            .map(|axis| self.max[axis] - self.min[axis])
            .fold(0.0, f32::max)
    }
}

/// One named sub-object of a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedObject {
    /// Empty when the source declares no `o` name
    pub name: String,
    pub geometry: Geometry,
    /// Last `usemtl` seen while this object was open, empty if none
    pub material_name: String,
}

impl ParsedObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::default(),
            material_name: String::new(),
        }
    }
}

/// Totals over a parsed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub objects: usize,
    pub triangles: usize,
    pub bounds: Option<Bounds>,
}

impl ModelSummary {
    pub fn of(objects: &[ParsedObject]) -> Self {
        Self {
            objects: objects.len(),
            triangles: objects.iter().map(|o| o.geometry.triangle_count()).sum(),
            bounds: objects
                .iter()
                .filter_map(|o| o.geometry.bounds())
                .reduce(Bounds::union),
        }
    }
}
