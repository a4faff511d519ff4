use crate::utils::nn_trait::DistanceField;
use anyhow::{bail, Context, Result};
use glam::Vec3;
use std::fs;

fn dot2(v: Vec3) -> f32 {
    v.dot(v)
}

fn sgn(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
}

impl Triangle {
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Triangle { v1, v2, v3 }
    }

    // exact unsigned distance: face-plane distance when the projection falls
    // inside all three edges, otherwise the nearest clamped edge segment
    pub fn distance(&self, p: Vec3) -> f32 {
        let v21 = self.v2 - self.v1;
        let p1 = p - self.v1;
        let v32 = self.v3 - self.v2;
        let p2 = p - self.v2;
        let v13 = self.v1 - self.v3;
        let p3 = p - self.v3;
        let nor = v21.cross(v13);

        let inside = sgn(v21.cross(nor).dot(p1))
            + sgn(v32.cross(nor).dot(p2))
            + sgn(v13.cross(nor).dot(p3));

        let sq = if inside < 2.0 {
            let d1 = dot2(v21 * (v21.dot(p1) / dot2(v21)).clamp(0.0, 1.0) - p1);
            let d2 = dot2(v32 * (v32.dot(p2) / dot2(v32)).clamp(0.0, 1.0) - p2);
            let d3 = dot2(v13 * (v13.dot(p3) / dot2(v13)).clamp(0.0, 1.0) - p3);
            d1.min(d2).min(d3)
        } else {
            nor.dot(p1) * nor.dot(p1) / dot2(nor)
        };
        sq.sqrt()
    }

    // which side of the face plane the point falls on; not folded into the
    // returned distance, which stays unsigned
    pub fn is_inside(&self, p: Vec3) -> bool {
        let nor = (self.v2 - self.v1).cross(self.v3 - self.v1).normalize();
        let projected = p - (p - self.v1).dot(nor) * nor;
        nor.dot(projected - p) <= 0.0
    }
}

#[derive(Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn from_obj(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("cannot open mesh file {}", path))?;

        let mut vertices: Vec<Vec3> = Vec::new();
        let mut faces: Vec<[usize; 3]> = Vec::new();
        for line in contents.lines() {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let coords: Vec<f32> = tokens
                        .take(3)
                        .map(|t| t.parse())
                        .collect::<Result<_, _>>()
                        .with_context(|| format!("bad vertex line: {}", line))?;
                    if coords.len() != 3 {
                        bail!("bad vertex line: {}", line);
                    }
                    vertices.push(Vec3::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    let ids: Vec<usize> = tokens
                        .take(3)
                        .map(|t| t.split('/').next().unwrap_or("").parse())
                        .collect::<Result<_, _>>()
                        .with_context(|| format!("bad face line: {}", line))?;
                    if ids.len() != 3 {
                        bail!("bad face line: {}", line);
                    }
                    faces.push([ids[0], ids[1], ids[2]]);
                }
                _ => {}
            }
        }

        let mut mesh = Mesh::default();
        for [i1, i2, i3] in faces {
            // face indices are 1-based
            let fetch = |i: usize| -> Result<Vec3> {
                if i == 0 || i > vertices.len() {
                    bail!("face index {} out of range in {}", i, path);
                }
                Ok(vertices[i - 1])
            };
            mesh.add_triangle(Triangle::new(fetch(i1)?, fetch(i2)?, fetch(i3)?));
        }
        Ok(mesh)
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn distance(&self, point: Vec3) -> f32 {
        self.triangles
            .iter()
            .map(|t| t.distance(point))
            .fold(f32::MAX, f32::min)
    }
}

impl DistanceField for Mesh {
    fn distance(&self, point: Vec3) -> f32 {
        Mesh::distance(self, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::env;

    fn right_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn perpendicular_point_hits_the_face() {
        let d = right_triangle().distance(Vec3::new(0.0, 0.0, 1.0));
        assert!((d - 1.0).abs() < 1e-6);
        let d = right_triangle().distance(Vec3::new(0.25, 0.25, 0.5));
        assert!((d - 0.5).abs() < 1e-6);
    }

    #[test]
    fn far_point_clamps_to_the_nearest_vertex() {
        let d = right_triangle().distance(Vec3::new(2.0, 0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn side_classification_follows_the_face_normal() {
        let tri = right_triangle();
        // the face normal points toward +z; that side classifies as inside
        assert!(tri.is_inside(Vec3::new(0.2, 0.2, 1.0)));
        assert!(!tri.is_inside(Vec3::new(0.2, 0.2, -1.0)));
    }

    #[test]
    fn mesh_distance_is_the_per_triangle_minimum() {
        let mut mesh = Mesh::default();
        mesh.add_triangle(right_triangle());
        mesh.add_triangle(Triangle::new(
            Vec3::new(0.0, 0.0, 0.8),
            Vec3::new(0.5, 0.0, 0.8),
            Vec3::new(0.0, 0.5, 0.8),
        ));

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            let p = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            let brute = mesh
                .triangles
                .iter()
                .map(|t| t.distance(p))
                .fold(f32::MAX, f32::min);
            assert_eq!(mesh.distance(p), brute);
        }
    }

    #[test]
    fn empty_mesh_answers_max_distance() {
        let mesh = Mesh::default();
        assert_eq!(mesh.distance(Vec3::ZERO), f32::MAX);
    }

    #[test]
    fn obj_loader_reads_vertices_and_one_based_faces() {
        let path = env::temp_dir().join("nsdf_mesh_test.obj");
        fs::write(
            &path,
            "# comment\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/2/2 3/3/3\n",
        )
        .unwrap();
        let mesh = Mesh::from_obj(path.to_str().unwrap()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        let d = mesh.distance(Vec3::new(0.0, 0.0, 1.0));
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn obj_loader_rejects_out_of_range_faces() {
        let path = env::temp_dir().join("nsdf_mesh_bad.obj");
        fs::write(&path, "v 0 0 0\nf 1/1/1 2/2/2 3/3/3\n").unwrap();
        assert!(Mesh::from_obj(path.to_str().unwrap()).is_err());
    }
}
