use crate::utils::linear::DenseLayer;
use crate::utils::mat::Matrix;
use crate::utils::nn_trait::{DistanceField, Layer};
use crate::utils::sine::{SineLayer, DEFAULT_W0};
use anyhow::{bail, Context, Result};
use glam::Vec3;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

pub struct Siren {
    layers: Vec<Box<dyn Layer>>,
}

impl Siren {
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Self {
        Siren { layers }
    }

    pub fn from_arch_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot open architecture file {}", path))?;
        let mut layers: Vec<Box<dyn Layer>> = Vec::new();
        let mut prev_output: Option<usize> = None;
        for line in contents.lines() {
            match line.split_whitespace().next() {
                Some("Dense") => {
                    let dims: Vec<usize> = line
                        .split(|c: char| !c.is_ascii_digit())
                        .filter(|s| !s.is_empty())
                        .map(str::parse)
                        .collect::<Result<_, _>>()
                        .with_context(|| format!("malformed layer spec: {}", line))?;
                    if dims.len() < 2 {
                        bail!("malformed layer spec: {}", line);
                    }
                    let (input_size, output_size) = (dims[0], dims[1]);
                    if let Some(expected) = prev_output {
                        if input_size != expected {
                            bail!(
                                "layer input size {} does not match previous output size {}",
                                input_size,
                                expected
                            );
                        }
                    }
                    prev_output = Some(output_size);
                    layers.push(Box::new(DenseLayer::new(input_size, output_size)));
                }
                Some("Sin") => layers.push(Box::new(SineLayer::new(DEFAULT_W0))),
                _ => {}
            }
        }
        Ok(Siren::new(layers))
    }

    pub fn forward(&mut self, input: Matrix) -> Matrix {
        let mut output = input;
        for layer in self.layers.iter_mut() {
            output = layer.forward(output);
        }
        output
    }

    pub fn backward(&mut self, grad: Matrix) -> Matrix {
        let mut grad = grad;
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(grad);
        }
        grad
    }

    pub fn infer(&self, input: &Matrix) -> Matrix {
        let mut output = input.clone();
        for layer in self.layers.iter() {
            output = layer.infer(&output);
        }
        output
    }

    pub fn load_weights(&mut self, path: &str) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("cannot open weights file {}", path))?;
        let mut reader = BufReader::new(file);
        for layer in self.layers.iter_mut() {
            layer
                .load_weights(&mut reader)
                .with_context(|| format!("truncated weights file {}", path))?;
        }
        Ok(())
    }

    pub fn save_weights(&self, path: &str) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("cannot create weights file {}", path))?;
        let mut writer = BufWriter::new(file);
        for layer in self.layers.iter() {
            layer
                .save_weights(&mut writer)
                .with_context(|| format!("failed to write weights file {}", path))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write weights file {}", path))?;
        Ok(())
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        for layer in self.layers.iter_mut() {
            layer.set_learning_rate(learning_rate);
        }
    }
}

impl DistanceField for Siren {
    fn distance(&self, point: Vec3) -> f32 {
        self.infer(&Matrix::from_vec3(point)).at(0, 0)
    }
}
