//! Wavefront OBJ loading
//!
//! Reads `v`, `vt`, `vn` and `f` records into a [`Mesh`]. Every index in the
//! returned mesh is checked against its array, so the draw path can index
//! without bounds concerns.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::rasterizer::{face_normal, Mesh, Triangle, Vec2, Vec3};

#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {kind} index {index} out of range (have {len})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        len: usize,
    },
}

/// Load an OBJ file from disk
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let mesh = parse_obj(&source)?;
    log::info!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.positions.len(),
        mesh.triangles.len()
    );
    Ok(mesh)
}

/// One face corner as written in the file, already resolved to 0-based
#[derive(Debug, Clone, Copy)]
struct Corner {
    v: usize,
    uv: Option<usize>,
    n: Option<usize>,
}

/// Parse OBJ text. Polygons are fan-triangulated around their first vertex.
pub fn parse_obj(source: &str) -> Result<Mesh, ObjError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut triangles = Vec::new();
    let mut default_uv = None;

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = raw.split_whitespace().collect();
        match parts[0] {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..], line, "vertex")?;
                positions.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..], line, "normal")?;
                normals.push(Vec3::new(x, y, z).normalize());
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&parts[1..], line, "texture coordinate")?;
                uvs.push(Vec2::new(u, v));
            }
            "f" => {
                if parts.len() < 4 {
                    return Err(ObjError::Parse {
                        line,
                        message: format!("face needs at least 3 vertices, got {}", parts.len() - 1),
                    });
                }
                let corners = parts[1..]
                    .iter()
                    .map(|c| parse_corner(c, line, positions.len(), uvs.len(), normals.len()))
                    .collect::<Result<Vec<_>, _>>()?;

                for k in 1..corners.len() - 1 {
                    let fan = [corners[0], corners[k], corners[k + 1]];

                    let uv = if fan.iter().all(|c| c.uv.is_some()) {
                        fan.map(|c| c.uv.unwrap_or(0))
                    } else {
                        let idx = *default_uv.get_or_insert_with(|| {
                            uvs.push(Vec2::ZERO);
                            uvs.len() - 1
                        });
                        [idx; 3]
                    };

                    let n = if fan.iter().all(|c| c.n.is_some()) {
                        fan.map(|c| c.n.unwrap_or(0))
                    } else {
                        let [a, b, c] = fan.map(|c| positions[c.v]);
                        normals.push(face_normal(a, b, c));
                        [normals.len() - 1; 3]
                    };

                    triangles.push(Triangle::new(fan.map(|c| c.v), uv, n));
                }
            }
            // Groups, materials, smoothing and the rest carry nothing we draw
            _ => {}
        }
    }

    if triangles.is_empty() {
        log::warn!("OBJ source has no faces");
    }
    log::debug!(
        "parsed OBJ: {} positions, {} uvs, {} normals, {} triangles",
        positions.len(),
        uvs.len(),
        normals.len(),
        triangles.len()
    );

    Ok(Mesh::new(positions, normals, uvs, triangles))
}

fn parse_floats<const N: usize>(fields: &[&str], line: usize, what: &str) -> Result<[f32; N], ObjError> {
    if fields.len() < N {
        return Err(ObjError::Parse {
            line,
            message: format!("{what} needs {N} components, got {}", fields.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse().map_err(|_| ObjError::Parse {
            line,
            message: format!("invalid {what} component '{field}'"),
        })?;
    }
    Ok(out)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_corner(field: &str, line: usize, n_pos: usize, n_uv: usize, n_norm: usize) -> Result<Corner, ObjError> {
    let mut refs = field.split('/');
    let v = resolve(refs.next().unwrap_or(""), n_pos, "vertex", line)?;
    let uv = match refs.next() {
        Some(s) if !s.is_empty() => Some(resolve(s, n_uv, "texture coordinate", line)?),
        _ => None,
    };
    let n = match refs.next() {
        Some(s) if !s.is_empty() => Some(resolve(s, n_norm, "normal", line)?),
        _ => None,
    };
    Ok(Corner { v, uv, n })
}

/// 1-based index, or negative index counting back from the newest entry
fn resolve(field: &str, len: usize, kind: &'static str, line: usize) -> Result<usize, ObjError> {
    let index: i64 = field.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid {kind} index '{field}'"),
    })?;
    let resolved = if index > 0 { index - 1 } else { len as i64 + index };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(ObjError::IndexOutOfRange { line, kind, index, len });
    }
    Ok(resolved as usize)
}
