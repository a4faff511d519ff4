use crate::utils::dataloader::{load_data, max_abs_error, sample_data};
use crate::utils::mesh::Mesh;
use crate::utils::network::Siren;
use crate::utils::scene::Scene;
use crate::utils::trace::render_to_file;
use crate::utils::train::{train, TrainParams};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::process;

pub mod utils;

const NUM_SAMPLES: usize = 50000;

fn configure_threads(arg: &str) -> Result<()> {
    let threads: usize = arg
        .parse()
        .with_context(|| format!("bad thread count {}", arg))?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("failed to configure thread pool")?;
    Ok(())
}

fn run_train(args: &[String]) -> Result<()> {
    let (arch, mesh_path, params_path, cam, light, threads) =
        (&args[0], &args[1], &args[2], &args[3], &args[4], &args[5]);
    configure_threads(threads)?;

    let mut model = Siren::from_arch_file(arch)?;
    println!("Built model");

    let params = TrainParams::from_file(params_path);
    let scene = Scene::load(cam, light)?;

    // an unreadable mesh is reported but not fatal; training then fits the
    // empty field
    let mesh = Mesh::from_obj(mesh_path).unwrap_or_else(|err| {
        eprintln!("{:#}", err);
        Mesh::default()
    });

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let data = sample_data(&mesh, NUM_SAMPLES, &mut rng);
    println!("Sampled {} training pairs", NUM_SAMPLES);

    train(&mut model, &data, &params, &scene, &mut rng)?;

    model.save_weights("weights/final.bin")?;
    println!("Saved weights to weights/final.bin");
    Ok(())
}

fn run_render(args: &[String]) -> Result<()> {
    let (arch, weights, cam, light, threads) =
        (&args[0], &args[1], &args[2], &args[3], &args[4]);
    configure_threads(threads)?;

    let mut model = Siren::from_arch_file(arch)?;
    println!("Built model");
    model.load_weights(weights)?;
    println!("Loaded weights");

    if let Some(data_path) = args.get(5) {
        let data = load_data(data_path)?;
        let error = max_abs_error(&model, &data);
        if error < 1e-5 {
            println!("Test passed successfully. Maximum error: {}", error);
        } else {
            println!("Test failed. Maximum error: {}", error);
        }
    }

    let scene = Scene::load(cam, light)?;
    render_to_file(&model, &scene, "render.png", 512, 512, 1e-5)
}

fn usage() -> ! {
    eprintln!("usage: nsdf train <arch> <mesh> <train_params> <camera> <light> <threads>");
    eprintln!("       nsdf render <arch> <weights> <camera> <light> <threads> [test_data]");
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("train") if args.len() == 8 => run_train(&args[2..]),
        Some("render") if args.len() == 7 || args.len() == 8 => run_render(&args[2..]),
        _ => usage(),
    };
    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}
