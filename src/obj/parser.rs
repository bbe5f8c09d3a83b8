//! OBJ text to [`ParsedObject`] conversion

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::error::ObjError;
use super::lexer::{classify, Face, FaceVertex, Line};
use super::model::ParsedObject;
use crate::util::time::Timer;

/// How faces with more than three vertices are split into triangles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonMode {
    /// Up to four vertices per face; quads become (1,2,3) and (2,3,4),
    /// vertices past the fourth are ignored
    #[default]
    Quad,
    /// Any polygon becomes the fan (1,i,i+1)
    Fan,
}

impl FromStr for PolygonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quad" => Ok(Self::Quad),
            "fan" => Ok(Self::Fan),
            other => Err(format!("unknown polygon mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub polygon_mode: PolygonMode,
}

/// Vertex data declared so far. Indices in face lines refer to these,
/// across object boundaries.
#[derive(Debug, Default)]
struct VertexPool {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
}

/// Parse OBJ text with default options.
pub fn parse(text: &str) -> Result<Vec<ParsedObject>, ObjError> {
    parse_with(text, &ParseOptions::default())
}

/// Parse OBJ text into its objects, in declaration order.
///
/// Unrecognized lines are skipped. Fails only on a face index outside the
/// pool declared so far or on a vertex component that is not a number.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Vec<ParsedObject>, ObjError> {
    let timer = Timer::new();

    let mut pool = VertexPool::default();
    let mut objects: Vec<ParsedObject> = Vec::new();

    let has_object_lines = text
        .lines()
        .any(|line| matches!(classify(line), Line::Object(_)));
    if !has_object_lines {
        objects.push(ParsedObject::new(""));
    }

    for (index, raw) in text.split('\n').enumerate() {
        let line_no = index + 1;

        match classify(raw) {
            Line::Blank | Line::Comment => {}
            Line::Vertex(tokens) => pool.positions.push(parse_floats(tokens, line_no)?),
            Line::Normal(tokens) => pool.normals.push(parse_floats(tokens, line_no)?),
            Line::TexCoord(tokens) => pool.uvs.push(parse_floats(tokens, line_no)?),
            Line::Face(face) => {
                let object = current(&mut objects);
                add_face(object, &pool, &face, options.polygon_mode, line_no)?;
            }
            Line::Object(name) => objects.push(ParsedObject::new(name)),
            Line::UseMaterial(name) => current(&mut objects).material_name = name.to_string(),
            Line::Group | Line::MaterialLibrary | Line::Smoothing => {}
            Line::Unknown => trace!(line = line_no, "Skipping unhandled OBJ line"),
        }
    }

    debug!(
        objects = objects.len(),
        triangles = objects.iter().map(|o| o.geometry.triangle_count()).sum::<usize>(),
        elapsed_us = timer.elapsed_micros(),
        "Parsed OBJ"
    );

    Ok(objects)
}

/// The open object, creating an unnamed one for geometry that precedes the first `o`
fn current(objects: &mut Vec<ParsedObject>) -> &mut ParsedObject {
    if objects.is_empty() {
        objects.push(ParsedObject::new(""));
    }
    let last = objects.len() - 1;
    &mut objects[last]
}

fn parse_floats<const N: usize>(tokens: [&str; N], line: usize) -> Result<[f32; N], ObjError> {
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = parse_decimal(token).ok_or_else(|| ObjError::MalformedNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

/// A finite `f32` written as `[+-]digits[.digits][(e|E)[+-]digits]`.
///
/// `str::parse` alone would also take `nan`, `inf` and overflow to infinity.
fn parse_decimal(token: &str) -> Option<f32> {
    let bytes = token.as_bytes();
    let mut i = 0;

    let skip_digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };

    if matches!(bytes.first().copied(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut mantissa_digits = skip_digits(&mut i);
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        mantissa_digits += skip_digits(&mut i);
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(i).copied(), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i).copied(), Some(b'+' | b'-')) {
            i += 1;
        }
        if skip_digits(&mut i) == 0 {
            return None;
        }
    }
    if i != bytes.len() {
        return None;
    }

    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Resolve a 1-based or negative (relative) index against `len` declared entries
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, ObjError> {
    let malformed = || ObjError::MalformedIndex {
        line,
        index: token.to_string(),
        len,
    };

    let raw: i64 = token.parse().map_err(|_| malformed())?;
    let len_i = i64::try_from(len).map_err(|_| malformed())?;
    let resolved = if raw >= 0 { raw - 1 } else { len_i + raw };

    if resolved < 0 || resolved >= len_i {
        return Err(malformed());
    }
    Ok(resolved as usize)
}

/// Corner triples for a face of `n` vertices
fn triangles(n: usize, mode: PolygonMode) -> Vec<[usize; 3]> {
    match mode {
        PolygonMode::Quad if n >= 4 => vec![[0, 1, 2], [1, 2, 3]],
        PolygonMode::Quad => vec![[0, 1, 2]],
        PolygonMode::Fan => (1..n - 1).map(|i| [0, i, i + 1]).collect(),
    }
}

fn add_face(
    object: &mut ParsedObject,
    pool: &VertexPool,
    face: &Face<'_>,
    mode: PolygonMode,
    line: usize,
) -> Result<(), ObjError> {
    let corners: &[FaceVertex<'_>] = match mode {
        PolygonMode::Quad => &face.vertices[..face.vertices.len().min(4)],
        PolygonMode::Fan => &face.vertices,
    };

    let positions = corners
        .iter()
        .map(|v| resolve_index(v.position, pool.positions.len(), line).map(|i| pool.positions[i]))
        .collect::<Result<Vec<_>, _>>()?;
    let uvs = corners
        .iter()
        .filter_map(|v| v.uv)
        .map(|t| resolve_index(t, pool.uvs.len(), line).map(|i| pool.uvs[i]))
        .collect::<Result<Vec<_>, _>>()?;
    let normals = corners
        .iter()
        .filter_map(|v| v.normal)
        .map(|n| resolve_index(n, pool.normals.len(), line).map(|i| pool.normals[i]))
        .collect::<Result<Vec<_>, _>>()?;

    let geometry = &mut object.geometry;
    let uv_mismatch = geometry.has_uvs() == uvs.is_empty();
    let normal_mismatch = geometry.has_normals() == normals.is_empty();
    if !geometry.is_empty() && (uv_mismatch || normal_mismatch) {
        debug!(
            line,
            object = %object.name,
            "Face attribute slots differ from earlier faces in this object"
        );
    }
    for [a, b, c] in triangles(corners.len(), mode) {
        for corner in [a, b, c] {
            geometry.push_position(positions[corner]);
            if !uvs.is_empty() {
                geometry.push_uv(uvs[corner]);
            }
            if !normals.is_empty() {
                geometry.push_normal(normals[corner]);
            }
        }
    }

    Ok(())
}
