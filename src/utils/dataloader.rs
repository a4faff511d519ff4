use crate::utils::mat::Matrix;
use crate::utils::mesh::Mesh;
use crate::utils::misc::{read_f32, read_i32};
use crate::utils::network::Siren;
use anyhow::{Context, Result};
use glam::Vec3;
use rand::Rng;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;

pub struct Data {
    pub x: Matrix,
    pub y: Matrix,
}

pub fn sample_data(mesh: &Mesh, num_samples: usize, rng: &mut impl Rng) -> Data {
    let points: Vec<Vec3> = (0..num_samples)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
        })
        .collect();

    // the mesh scan dominates; each point writes its own row
    let distances: Vec<f32> = points.par_iter().map(|p| mesh.distance(*p)).collect();

    let negatives = distances.iter().filter(|d| **d < 0.0).count();
    println!("Num negatives: {}", negatives);

    let mut x = Matrix::new(num_samples, 3);
    let mut y = Matrix::new(num_samples, 1);
    for (i, (p, d)) in points.iter().zip(distances.iter()).enumerate() {
        x.set(i, 0, p.x);
        x.set(i, 1, p.y);
        x.set(i, 2, p.z);
        y.set(i, 0, *d);
    }
    Data { x, y }
}

pub fn get_batch(data: &Data, batch_size: usize, rng: &mut impl Rng) -> (Matrix, Matrix) {
    let n = data.x.rows;
    let mut batch_x = Matrix::new(batch_size, data.x.cols);
    let mut batch_y = Matrix::new(batch_size, data.y.cols);
    for i in 0..batch_size {
        let idx = rng.gen_range(0..n);
        for j in 0..data.x.cols {
            batch_x.set(i, j, data.x.at(idx, j));
        }
        for j in 0..data.y.cols {
            batch_y.set(i, j, data.y.at(idx, j));
        }
    }
    (batch_x, batch_y)
}

pub fn load_data(path: &str) -> Result<Data> {
    let file = File::open(path).with_context(|| format!("cannot open data file {}", path))?;
    let mut reader = BufReader::new(file);
    let n = read_i32(&mut reader).with_context(|| format!("truncated data file {}", path))? as usize;

    let mut x = Matrix::new(n, 3);
    for val in x.data.iter_mut() {
        *val = read_f32(&mut reader).with_context(|| format!("truncated data file {}", path))?;
    }
    let mut y = Matrix::new(n, 1);
    for val in y.data.iter_mut() {
        *val = read_f32(&mut reader).with_context(|| format!("truncated data file {}", path))?;
    }
    Ok(Data { x, y })
}

pub fn max_abs_error(model: &Siren, data: &Data) -> f32 {
    model.infer(&data.x).sub(&data.y).abs().max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mesh::Triangle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::env;
    use std::fs;

    #[test]
    fn sampling_pairs_points_with_mesh_distances() {
        let mut mesh = Mesh::default();
        mesh.add_triangle(Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ));
        let mut rng = StdRng::seed_from_u64(3);
        let data = sample_data(&mesh, 16, &mut rng);
        assert_eq!(data.x.rows, 16);
        assert_eq!(data.x.cols, 3);
        assert_eq!(data.y.cols, 1);
        for i in 0..16 {
            let p = Vec3::new(data.x.at(i, 0), data.x.at(i, 1), data.x.at(i, 2));
            assert_eq!(data.y.at(i, 0), mesh.distance(p));
        }
    }

    #[test]
    fn sampling_an_empty_mesh_poisons_every_target() {
        // a failed mesh load leaves an empty mesh; the dataset it produces
        // is unusable and callers see that through the targets
        let mesh = Mesh::default();
        let mut rng = StdRng::seed_from_u64(5);
        let data = sample_data(&mesh, 8, &mut rng);
        for i in 0..8 {
            assert_eq!(data.y.at(i, 0), f32::MAX);
        }
    }

    #[test]
    fn batches_draw_rows_with_replacement_from_the_dataset() {
        let mut x = Matrix::new(4, 3);
        let mut y = Matrix::new(4, 1);
        for i in 0..4 {
            for j in 0..3 {
                x.set(i, j, (i * 3 + j) as f32);
            }
            y.set(i, 0, i as f32);
        }
        let data = Data { x, y };
        let mut rng = StdRng::seed_from_u64(9);
        let (batch_x, batch_y) = get_batch(&data, 32, &mut rng);
        assert_eq!(batch_x.rows, 32);
        for i in 0..32 {
            let row = batch_y.at(i, 0) as usize;
            assert!(row < 4);
            for j in 0..3 {
                assert_eq!(batch_x.at(i, j), data.x.at(row, j));
            }
        }
    }

    #[test]
    fn data_file_layout_is_count_then_inputs_then_targets() {
        let path = env::temp_dir().join("nsdf_data_test.bin");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_le_bytes());
        for v in [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.7f32, 0.8] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        fs::write(&path, bytes).unwrap();

        let data = load_data(path.to_str().unwrap()).unwrap();
        assert_eq!(data.x.rows, 2);
        assert_eq!(data.x.at(1, 2), 0.6);
        assert_eq!(data.y.at(0, 0), 0.7);
        assert_eq!(data.y.at(1, 0), 0.8);
    }

    #[test]
    fn max_abs_error_reduces_over_the_whole_set() {
        use crate::utils::linear::DenseLayer;
        let model = Siren::new(vec![Box::new(DenseLayer::new(3, 1))]);
        let mut x = Matrix::new(2, 3);
        x.set(0, 0, 0.5);
        let mut y = Matrix::new(2, 1);
        y.set(0, 0, 0.25);
        y.set(1, 0, -0.75);
        let data = Data { x, y };
        // a zero network predicts 0 everywhere
        assert_eq!(max_abs_error(&model, &data), 0.75);
    }
}
