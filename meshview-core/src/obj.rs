/// Wavefront OBJ reader (positions and faces only)
use log::trace;
use nom::{
    bytes::complete::take_till,
    character::complete::{char, i64 as integer, space0, space1},
    combinator::opt,
    multi::many1,
    number::complete::float,
    sequence::preceded,
    IResult,
};

use crate::error::{RenderError, Result};
use crate::geometry::{Face, Mesh, Vertex};

/// Parse OBJ text into a mesh.
///
/// Only `v` and `f` statements are used. Face corners may carry texture and
/// normal references (`1/2/3`, `1//3`), which are ignored. Polygons are
/// fan-triangulated. Face indices are not checked against the vertex count
/// here; the renderer rejects out-of-range faces.
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for (n, raw) in input.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        let (keyword, rest) = line.split_once(|c: char| c.is_whitespace()).unwrap_or((line, ""));

        match keyword {
            "" => {}
            "v" => {
                let (x, y, z) = complete(parse_vertex(rest), line_no)?;
                mesh.add_vertex(Vertex::new(x, y, z));
            }
            "f" => {
                let corners = complete(parse_face(rest), line_no)?;
                if corners.len() < 3 {
                    return Err(RenderError::MeshParse {
                        line: line_no,
                        message: format!("face has {} corners, need at least 3", corners.len()),
                    });
                }
                let indices = corners
                    .iter()
                    .map(|&c| resolve_index(c, mesh.vertices.len(), line_no))
                    .collect::<Result<Vec<_>>>()?;
                for i in 1..indices.len() - 1 {
                    mesh.add_face(Face::new(indices[0], indices[i], indices[i + 1]));
                }
            }
            other => trace!("Skipping OBJ statement '{}' on line {}", other, line_no),
        }
    }

    Ok(mesh)
}

/// OBJ indices are 1-based; negative indices count back from the latest vertex
fn resolve_index(index: i64, vertex_count: usize, line: usize) -> Result<usize> {
    let resolved = match index {
        i if i > 0 => Some(i as usize - 1),
        i if i < 0 => vertex_count.checked_sub(i.unsigned_abs() as usize),
        _ => None,
    };
    resolved.ok_or_else(|| RenderError::MeshParse {
        line,
        message: format!("invalid vertex reference {}", index),
    })
}

fn complete<T>(result: IResult<&str, T>, line: usize) -> Result<T> {
    match result {
        Ok(("", value)) => Ok(value),
        Ok((rest, _)) => Err(RenderError::MeshParse {
            line,
            message: format!("unexpected trailing input '{}'", rest),
        }),
        Err(e) => Err(RenderError::MeshParse {
            line,
            message: format!("{:?}", e),
        }),
    }
}

fn parse_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, x) = preceded(space0, float)(input)?;
    let (input, y) = preceded(space1, float)(input)?;
    let (input, z) = preceded(space1, float)(input)?;
    // Optional weight
    let (input, _) = opt(preceded(space1, float))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, (x, y, z)))
}

fn parse_corner(input: &str) -> IResult<&str, i64> {
    let (input, index) = integer(input)?;
    let (input, _) = opt(preceded(char('/'), take_till(|c: char| c.is_whitespace())))(input)?;
    Ok((input, index))
}

fn parse_face(input: &str) -> IResult<&str, Vec<i64>> {
    let (input, corners) = many1(preceded(space0, parse_corner))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, corners))
}
