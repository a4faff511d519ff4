use crate::utils::nn_trait::DistanceField;
use crate::utils::scene::Scene;
use anyhow::{Context, Result};
use glam::Vec3;
use rayon::prelude::*;
use std::time::Instant;

const MAX_STEPS: usize = 100;
const MAX_DEPTH: f32 = 100.0;
const NORMAL_EPS: f32 = 1e-4;
const AMBIENT: f32 = 0.08;

// the field is only trained inside the unit cube; outside it, march by the
// analytic distance to the cube boundary instead of querying the provider
fn field_distance(field: &dyn DistanceField, point: Vec3) -> f32 {
    if point.x < -1.0
        || point.x > 1.0
        || point.y < -1.0
        || point.y > 1.0
        || point.z < -1.0
        || point.z > 1.0
    {
        (point.abs() - Vec3::ONE).max(Vec3::splat(0.01)).length()
    } else {
        field.distance(point)
    }
}

pub fn estimate_normal(field: &dyn DistanceField, p: Vec3) -> Vec3 {
    let dx = field_distance(field, p + Vec3::X * NORMAL_EPS)
        - field_distance(field, p - Vec3::X * NORMAL_EPS);
    let dy = field_distance(field, p + Vec3::Y * NORMAL_EPS)
        - field_distance(field, p - Vec3::Y * NORMAL_EPS);
    let dz = field_distance(field, p + Vec3::Z * NORMAL_EPS)
        - field_distance(field, p - Vec3::Z * NORMAL_EPS);
    Vec3::new(dx, dy, dz).normalize()
}

pub fn trace_ray(
    field: &dyn DistanceField,
    light_dir: Vec3,
    origin: Vec3,
    ray_dir: Vec3,
    hit_eps: f32,
) -> Vec3 {
    let mut t = 0.0f32;
    for _ in 0..MAX_STEPS {
        let point = origin + ray_dir * t;
        let distance = field_distance(field, point);

        if distance < hit_eps {
            let normal = estimate_normal(field, point);
            let diffuse = normal.dot(light_dir).max(AMBIENT);
            return Vec3::splat(diffuse);
        }
        t += distance;
        if t >= MAX_DEPTH {
            break;
        }
    }
    Vec3::ZERO
}

pub fn render(
    field: &dyn DistanceField,
    scene: &Scene,
    width: usize,
    height: usize,
    hit_eps: f32,
) -> Vec<f32> {
    let pos = scene.camera.pos;
    let view = (Vec3::ZERO - pos).normalize();
    let right = view.cross(Vec3::Y).normalize();
    let up = right.cross(view);

    let aspect_ratio = width as f32 / height as f32;
    let scale = (scene.camera.fov_rad / 2.0).tan();
    let light_dir = scene.light.dir;

    let start = Instant::now();
    let pixels: Vec<Vec3> = (0..width * height)
        .into_par_iter()
        .map(|idx| {
            let i = idx % width;
            let j = idx / width;
            let x = (2.0 * (i as f32 + 0.5) / width as f32 - 1.0) * aspect_ratio * scale;
            let y = (2.0 * (j as f32 + 0.5) / height as f32 - 1.0) * scale;
            let ray_dir = (view + right * x + up * y).normalize();
            trace_ray(field, light_dir, pos, ray_dir, hit_eps)
        })
        .collect();
    println!(
        "Time taken for render: {:.3} s",
        start.elapsed().as_secs_f64()
    );

    let mut output = Vec::with_capacity(width * height * 3);
    for color in &pixels {
        output.extend_from_slice(&[color.x, color.y, color.z]);
    }
    output
}

pub fn save_png(path: &str, width: u32, height: u32, pixels: &[f32]) -> Result<()> {
    let bytes: Vec<u8> = pixels.iter().map(|v| (255.0 * v) as u8).collect();
    let img = image::RgbImage::from_raw(width, height, bytes)
        .context("pixel buffer does not match image dimensions")?;
    img.save(path)
        .with_context(|| format!("failed to write image {}", path))?;
    println!("Image saved as {}", path);
    Ok(())
}

pub fn render_to_file(
    field: &dyn DistanceField,
    scene: &Scene,
    path: &str,
    width: usize,
    height: usize,
    hit_eps: f32,
) -> Result<()> {
    let pixels = render(field, scene, width, height, hit_eps);
    save_png(path, width as u32, height as u32, &pixels)
}
