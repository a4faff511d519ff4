use crate::utils::mat::Matrix;
use glam::Vec3;
use std::io::{Read, Write};

pub trait Layer: Send + Sync {
    fn forward(&mut self, input: Matrix) -> Matrix;
    // backward is not pure: parameterized layers apply their optimizer step
    // inside this call, so invoking it twice performs two updates
    fn backward(&mut self, grad: Matrix) -> Matrix;
    fn infer(&self, input: &Matrix) -> Matrix;
    fn load_weights(&mut self, reader: &mut dyn Read) -> std::io::Result<()>;
    fn save_weights(&self, writer: &mut dyn Write) -> std::io::Result<()>;
    fn set_learning_rate(&mut self, learning_rate: f32);
}

pub trait DistanceField: Sync {
    fn distance(&self, point: Vec3) -> f32;
}
