//! Wavefront OBJ export.
//!
//! Vertex colors are written as the non-standard but widely read
//! `v x y z r g b` extension. Texture coordinates share the vertex indices.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::Mesh;

/// Write `mesh` as OBJ text.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<()> {
    for (i, v) in mesh.vertices.iter().enumerate() {
        match mesh.colors.get(i) {
            Some(c) => writeln!(writer, "v {} {} {} {} {} {}", v.x, v.y, v.z, c.r, c.g, c.b)?,
            None => writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?,
        }
    }

    let has_texcoords = !mesh.texcoords().is_empty();
    for [u, v] in mesh.texcoords() {
        writeln!(writer, "vt {} {}", u, v)?;
    }

    // OBJ indices are 1-based.
    for [a, b, c] in mesh.triangles().iter().map(|t| t.map(|i| i + 1)) {
        if has_texcoords {
            writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else {
            writeln!(writer, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}

/// Write `mesh` to an OBJ file.
pub fn save_obj<P: AsRef<Path>>(path: P, mesh: &Mesh) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, mesh)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point3, Rgb, Topology};
    use std::sync::Arc;

    fn triangle_mesh(colors: Vec<Rgb>, texcoords: Vec<[f32; 2]>) -> Mesh {
        let topology = Topology::new(vec![[0, 1, 2]]).with_texcoords(texcoords);
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.5, 0.0),
            ],
            colors,
            Arc::new(topology),
        )
    }

    fn to_string(mesh: &Mesh) -> String {
        let mut out = Vec::new();
        write_obj(&mut out, mesh).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_mesh() {
        let text = to_string(&triangle_mesh(Vec::new(), Vec::new()));
        assert_eq!(text, "v 0 0 0\nv 1 0 0\nv 0 1.5 0\nf 1 2 3\n");
    }

    #[test]
    fn colored_textured_mesh() {
        let colors = vec![Rgb::new(1.0, 0.5, 0.25); 3];
        let texcoords = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let text = to_string(&triangle_mesh(colors, texcoords));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "v 0 0 0 1 0.5 0.25");
        assert_eq!(lines[3], "vt 0 0");
        assert_eq!(lines[6], "f 1/1 2/2 3/3");
        assert_eq!(lines.len(), 7);
    }
}
