use anyhow::{bail, Context, Result};
use glam::Vec3;
use std::fs;

pub struct Camera {
    pub pos: Vec3,
    pub fov_rad: f32,
}

pub struct DirectedLight {
    pub dir: Vec3,
}

pub struct Scene {
    pub camera: Camera,
    pub light: DirectedLight,
}

fn read_floats(path: &str) -> Result<Vec<f32>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("cannot open scene file {}", path))?;
    contents
        .split_whitespace()
        .map(|t| {
            t.parse::<f32>()
                .with_context(|| format!("bad value {:?} in scene file {}", t, path))
        })
        .collect()
}

impl Camera {
    pub fn from_file(path: &str) -> Result<Self> {
        let values = read_floats(path)?;
        if values.len() < 4 {
            bail!("camera file {} needs pos_x pos_y pos_z fov_rad", path);
        }
        Ok(Camera {
            pos: Vec3::new(values[0], values[1], values[2]),
            fov_rad: values[3],
        })
    }
}

impl DirectedLight {
    pub fn from_file(path: &str) -> Result<Self> {
        let values = read_floats(path)?;
        if values.len() < 3 {
            bail!("light file {} needs dir_x dir_y dir_z", path);
        }
        Ok(DirectedLight {
            dir: Vec3::new(values[0], values[1], values[2]),
        })
    }
}

impl Scene {
    pub fn load(camera_path: &str, light_path: &str) -> Result<Self> {
        Ok(Scene {
            camera: Camera::from_file(camera_path)?,
            light: DirectedLight::from_file(light_path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn scene_files_are_whitespace_separated_floats() {
        let cam_path = env::temp_dir().join("nsdf_cam_test.txt");
        let light_path = env::temp_dir().join("nsdf_light_test.txt");
        fs::write(&cam_path, "0.0 0.0 -2.0\n0.7854\n").unwrap();
        fs::write(&light_path, "0 0 -1").unwrap();

        let scene = Scene::load(cam_path.to_str().unwrap(), light_path.to_str().unwrap()).unwrap();
        assert_eq!(scene.camera.pos, Vec3::new(0.0, 0.0, -2.0));
        assert!((scene.camera.fov_rad - 0.7854).abs() < 1e-6);
        assert_eq!(scene.light.dir, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn truncated_camera_file_is_an_error() {
        let path = env::temp_dir().join("nsdf_cam_short.txt");
        fs::write(&path, "1.0 2.0\n").unwrap();
        assert!(Camera::from_file(path.to_str().unwrap()).is_err());
    }
}
