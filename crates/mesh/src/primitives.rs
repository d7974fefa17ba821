use crate::Mesh;

/// Textured box centred at the origin with faces wound counter-clockwise when
/// viewed from outside. Each face has its own four vertices so texcoords span
/// the full texture per face: 24 vertices, 12 triangles.
pub fn cube(half_extent: f32) -> Mesh {
    let e = half_extent;
    let mut mesh = Mesh::new();

    #[rustfmt::skip]
    let faces: [[[f32; 3]; 4]; 6] = [
        [[-e, -e,  e], [ e, -e,  e], [ e,  e,  e], [-e,  e,  e]], // +Z
        [[ e, -e,  e], [ e, -e, -e], [ e,  e, -e], [ e,  e,  e]], // +X
        [[ e, -e, -e], [-e, -e, -e], [-e,  e, -e], [ e,  e, -e]], // -Z
        [[-e, -e, -e], [-e, -e,  e], [-e,  e,  e], [-e,  e, -e]], // -X
        [[-e,  e,  e], [ e,  e,  e], [ e,  e, -e], [-e,  e, -e]], // +Y
        [[ e, -e,  e], [-e, -e,  e], [-e, -e, -e], [ e, -e, -e]], // -Y
    ];
    const UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for face in faces {
        let base = mesh.n_vertices() as u32;
        for (p, uv) in face.iter().zip(UV) {
            mesh.vertex(p[0], p[1], p[2], uv[0], uv[1]);
        }
        mesh.triangle(base, base + 1, base + 2);
        mesh.triangle(base + 2, base + 3, base);
    }

    mesh
}
