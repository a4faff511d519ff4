use crate::utils::dataloader::{get_batch, Data};
use crate::utils::head::Mse;
use crate::utils::network::Siren;
use crate::utils::scene::Scene;
use crate::utils::trace::render_to_file;
use anyhow::{Context, Result};
use rand::Rng;
use std::fs;
use std::str::FromStr;

pub struct TrainParams {
    pub batch_size: usize,
    pub num_steps: usize,
    pub log_iter: usize,
    pub checkpoint_iter: usize,
    pub render_iter: usize,
    pub learning_rate: f32,
    pub seed: Option<u64>,
}

impl Default for TrainParams {
    fn default() -> Self {
        TrainParams {
            batch_size: 512,
            num_steps: 10000,
            log_iter: 100,
            checkpoint_iter: 100,
            render_iter: 1000,
            learning_rate: 0.00005,
            seed: None,
        }
    }
}

fn parse_value<T: FromStr>(target: &mut T, value: Option<&str>, key: &str) {
    match value.and_then(|v| v.parse().ok()) {
        Some(v) => *target = v,
        None => eprintln!("bad value for parameter {}", key),
    }
}

impl TrainParams {
    pub fn from_file(path: &str) -> Self {
        let mut params = TrainParams::default();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("cannot open parameter file {}: {}", path, err);
                return params;
            }
        };
        for line in contents.lines() {
            let mut tokens = line.split_whitespace();
            let key = match tokens.next() {
                Some(key) => key,
                None => continue,
            };
            let value = tokens.next();
            match key {
                "batch_size" => parse_value(&mut params.batch_size, value, key),
                "num_steps" => parse_value(&mut params.num_steps, value, key),
                "log_iter" => parse_value(&mut params.log_iter, value, key),
                "checkpoint_iter" => parse_value(&mut params.checkpoint_iter, value, key),
                "render_iter" => parse_value(&mut params.render_iter, value, key),
                "learning_rate" => parse_value(&mut params.learning_rate, value, key),
                "seed" => {
                    let mut seed = 0u64;
                    parse_value(&mut seed, value, key);
                    params.seed = Some(seed);
                }
                _ => eprintln!("unknown parameter: {}", key),
            }
        }
        params
    }
}

pub fn train(
    model: &mut Siren,
    data: &Data,
    params: &TrainParams,
    scene: &Scene,
    rng: &mut impl Rng,
) -> Result<()> {
    let mut mse = Mse::new();
    let mut running_loss = 0.0f32;
    model.set_learning_rate(params.learning_rate);

    fs::create_dir_all("weights").context("cannot create weights directory")?;
    fs::create_dir_all("renders").context("cannot create renders directory")?;

    for i in 0..params.num_steps {
        let (batch_x, batch_y) = get_batch(data, params.batch_size, rng);

        let output = model.forward(batch_x);
        let loss = mse.forward(&output, &batch_y);
        let grad = mse.backward();
        model.backward(grad);

        running_loss = if i == 0 {
            loss.at(0, 0)
        } else {
            running_loss * 0.9 + loss.at(0, 0) * 0.1
        };

        if (i + 1) % params.log_iter == 0 {
            println!(
                "Iter: {}, Loss: {}, Prediction: {}",
                i + 1,
                loss.at(0, 0),
                output.at(0, 0)
            );
        }

        if (i + 1) % params.checkpoint_iter == 0 {
            let ckpt_path = format!("weights/ckpt{}.bin", i + 1);
            model.save_weights(&ckpt_path)?;
            println!("Saved checkpoint to {}", ckpt_path);
        }

        if (i + 1) % params.render_iter == 0 {
            let render_path = format!("renders/step{}.png", i + 1);
            render_to_file(&*model, scene, &render_path, 64, 64, 1e-3)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::linear::DenseLayer;
    use crate::utils::mat::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::env;

    #[test]
    fn params_file_overrides_defaults_and_reports_unknown_keys() {
        let path = env::temp_dir().join("nsdf_params_test.txt");
        fs::write(
            &path,
            "batch_size 64\nnum_steps 200\nlearning_rate 0.001\nseed 7\nwarmup 5\n",
        )
        .unwrap();
        let params = TrainParams::from_file(path.to_str().unwrap());
        assert_eq!(params.batch_size, 64);
        assert_eq!(params.num_steps, 200);
        assert!((params.learning_rate - 0.001).abs() < 1e-9);
        assert_eq!(params.seed, Some(7));
        // unknown keys leave everything else at defaults
        assert_eq!(params.log_iter, 100);
        assert_eq!(params.render_iter, 1000);
    }

    #[test]
    fn missing_params_file_falls_back_to_defaults() {
        let params = TrainParams::from_file("/nonexistent/params.txt");
        assert_eq!(params.batch_size, 512);
        assert_eq!(params.num_steps, 10000);
        assert!(params.seed.is_none());
    }

    #[test]
    fn constant_target_converges_within_a_thousand_steps() {
        let mut model = Siren::new(vec![Box::new(DenseLayer::new(3, 1))]);
        let mut rng = StdRng::seed_from_u64(17);

        let n = 64;
        let mut x = Matrix::new(n, 3);
        for val in x.data.iter_mut() {
            *val = rng.gen_range(-1.0..1.0);
        }
        let mut y = Matrix::new(n, 1);
        for val in y.data.iter_mut() {
            *val = 0.1;
        }
        let data = Data { x, y };

        let mut mse = Mse::new();
        let mut last_loss = f32::MAX;
        for _ in 0..1000 {
            let (batch_x, batch_y) = get_batch(&data, 16, &mut rng);
            let output = model.forward(batch_x);
            last_loss = mse.forward(&output, &batch_y).at(0, 0);
            let grad = mse.backward();
            model.backward(grad);
        }
        // starts at 0.01 with zero weights; the bias learns the constant
        assert!(last_loss < 1e-4, "loss did not converge: {}", last_loss);
    }
}
