//! Line classifier for the OBJ subset
//!
//! Works on one trimmed line at a time and only decides what a line *is*.
//! Numbers stay as `&str` slices here; the parser converts them so that
//! errors carry the line they came from.

/// What a single OBJ line declares
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Comment,
    Vertex([&'a str; 3]),
    Normal([&'a str; 3]),
    TexCoord([&'a str; 2]),
    Face(Face<'a>),
    Object(&'a str),
    UseMaterial(&'a str),
    Group,
    MaterialLibrary,
    Smoothing,
    Unknown,
}

/// Which slots a face vertex token fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    /// `f 1 2 3`
    Position,
    /// `f 1/1 2/2 3/3`
    PositionUv,
    /// `f 1/1/1 2/2/2 3/3/3`
    PositionUvNormal,
    /// `f 1//1 2//2 3//3`
    PositionNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex<'a> {
    pub position: &'a str,
    pub uv: Option<&'a str>,
    pub normal: Option<&'a str>,
}

/// A face line: the leading run of vertex tokens sharing the first token's shape.
/// Always holds at least three vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Face<'a> {
    pub kind: FaceKind,
    pub vertices: Vec<FaceVertex<'a>>,
}

/// Classify one line. The line is trimmed here, callers may pass it raw.
pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim();

    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with('#') {
        return Line::Comment;
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    match keyword {
        "v" => take::<3>(rest).map(Line::Vertex).unwrap_or(Line::Unknown),
        "vn" => take::<3>(rest).map(Line::Normal).unwrap_or(Line::Unknown),
        "vt" => take::<2>(rest).map(Line::TexCoord).unwrap_or(Line::Unknown),
        "f" => lex_face(rest).map(Line::Face).unwrap_or(Line::Unknown),
        "o" if !rest.is_empty() => Line::Object(rest),
        "usemtl" if !rest.is_empty() => Line::UseMaterial(rest),
        "g" if !rest.is_empty() => Line::Group,
        "mtllib" if !rest.is_empty() => Line::MaterialLibrary,
        "s" if !rest.is_empty() => Line::Smoothing,
        _ => Line::Unknown,
    }
}

/// First `N` whitespace separated tokens, extra tokens ignored
fn take<const N: usize>(rest: &str) -> Option<[&str; N]> {
    let mut tokens = rest.split_whitespace();
    let mut out = [""; N];
    for slot in out.iter_mut() {
        *slot = tokens.next()?;
    }
    Some(out)
}

fn lex_face(rest: &str) -> Option<Face<'_>> {
    let mut tokens = rest.split_whitespace().map(lex_face_vertex);

    let (kind, first) = tokens.next()??;
    let mut vertices = vec![first];

    for token in tokens {
        match token {
            Some((k, vertex)) if k == kind => vertices.push(vertex),
            _ => break,
        }
    }

    if vertices.len() < 3 {
        return None;
    }

    Some(Face { kind, vertices })
}

fn lex_face_vertex(token: &str) -> Option<(FaceKind, FaceVertex<'_>)> {
    let mut segments = token.split('/');
    let position = segments.next().filter(|s| is_index(s))?;
    let uv = segments.next();
    let normal = segments.next();

    if segments.next().is_some() {
        return None;
    }

    let (kind, uv, normal) = match (uv, normal) {
        (None, None) => (FaceKind::Position, None, None),
        (Some(uv), None) if is_index(uv) => (FaceKind::PositionUv, Some(uv), None),
        (Some(""), Some(n)) if is_index(n) => (FaceKind::PositionNormal, None, Some(n)),
        (Some(uv), Some(n)) if is_index(uv) && is_index(n) => {
            (FaceKind::PositionUvNormal, Some(uv), Some(n))
        }
        _ => return None,
    };

    Some((kind, FaceVertex { position, uv, normal }))
}

/// Optional `-` followed by at least one ASCII digit
fn is_index(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
