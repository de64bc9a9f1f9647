//! kdtrace CLI - render scenes and exercise the kd-tree
//!
//! Renders TOML scenes, prints tree statistics and cross-checks the kd-tree
//! against a brute-force scan on random sphere clouds.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kdtrace_math::Interval;
use kdtrace_raytrace::random::{random_rays, random_spheres};
use kdtrace_raytrace::{render, Camera, Hittable, Image, KdTreeSettings};
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod scene;

use scene::SceneFile;

const FORWARD: Interval = Interval::new(0.001, f64::INFINITY);

#[derive(Parser)]
#[command(name = "kdtrace")]
#[command(about = "SAH kd-tree ray tracer", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene to an image
    Render {
        /// Scene file (.toml)
        scene: PathBuf,
        /// Output image (format determined by extension: .png, .ppm)
        #[arg(short, long, default_value = "out.png")]
        output: PathBuf,
        /// Skip the kd-tree and scan every primitive per ray
        #[arg(long)]
        brute_force: bool,
        /// Seed for sample jitter
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Build the kd-tree for a scene and print its statistics
    Stats {
        /// Scene file (.toml)
        scene: PathBuf,
    },
    /// Time the kd-tree against brute force on random unit spheres
    Bench {
        /// Number of spheres
        #[arg(long, default_value_t = 1000)]
        spheres: usize,
        /// Number of random rays
        #[arg(long, default_value_t = 10_000)]
        rays: usize,
        /// Seed for the scene and the rays
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Half-width of the cube sphere centers are drawn from
        #[arg(long, default_value_t = 30.0)]
        extent: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            scene,
            output,
            brute_force,
            seed,
        } => render_scene(&scene, &output, brute_force, seed)?,
        Commands::Stats { scene } => show_stats(&scene)?,
        Commands::Bench {
            spheres,
            rays,
            seed,
            extent,
        } => bench(spheres, rays, seed, extent)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render_scene(path: &Path, output: &Path, brute_force: bool, seed: u64) -> Result<()> {
    let scene = SceneFile::load(path)?;
    let world = scene.world();
    let camera = Camera::new(&scene.camera)?;
    info!(
        primitives = world.len(),
        width = camera.image_width(),
        height = camera.image_height(),
        "rendering {}",
        path.display()
    );

    let start = Instant::now();
    let image = if brute_force {
        render(&camera, &world, seed)?
    } else {
        let tree = world.build_kdtree(&scene.tree)?;
        debug!("build took {:?}", start.elapsed());
        render(&camera, &tree, seed)?
    };
    info!("rendered in {:?}", start.elapsed());

    save_image(&image, output)?;
    println!("Wrote {}x{} image to {}", image.width, image.height, output.display());
    Ok(())
}

fn save_image(rendered: &Image, output: &Path) -> Result<()> {
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = match ext.to_lowercase().as_str() {
        "png" => image::ImageFormat::Png,
        "ppm" => image::ImageFormat::Pnm,
        _ => bail!("Unknown output format: {}", ext),
    };

    let buffer = image::RgbImage::from_raw(rendered.width, rendered.height, rendered.to_rgb8())
        .context("pixel buffer does not match image dimensions")?;
    buffer
        .save_with_format(output, format)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

fn show_stats(path: &Path) -> Result<()> {
    let scene = SceneFile::load(path)?;
    let world = scene.world();

    let start = Instant::now();
    let tree = world.build_kdtree(&scene.tree)?;
    let elapsed = start.elapsed();

    println!("Scene: {}", path.display());
    println!("Primitives: {}", world.len());
    println!("Build time: {:?}", elapsed);
    println!();
    println!("{}", tree.stats());
    Ok(())
}

fn bench(spheres: usize, rays: usize, seed: u64, extent: f64) -> Result<()> {
    if !(extent > 0.0) || !extent.is_finite() {
        bail!("extent must be positive and finite, got {extent}");
    }

    let world = random_spheres(spheres, extent, seed);
    let rays = random_rays(rays, extent + 5.0, seed.wrapping_add(1));

    let start = Instant::now();
    let tree = world.build_kdtree(&KdTreeSettings::default())?;
    let build_time = start.elapsed();

    let start = Instant::now();
    let tree_hits: Vec<_> = rays.par_iter().map(|r| tree.intersect(r, FORWARD)).collect();
    let tree_time = start.elapsed();

    let start = Instant::now();
    let brute_hits: Vec<_> = rays.par_iter().map(|r| world.hit(r, FORWARD)).collect();
    let brute_time = start.elapsed();

    let mut mismatches = 0usize;
    for (i, (a, b)) in tree_hits.iter().zip(&brute_hits).enumerate() {
        let same = match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.primitive == b.primitive && (a.t - b.t).abs() < 1e-9,
            _ => false,
        };
        if !same {
            mismatches += 1;
            debug!(ray = i, ?a, ?b, "mismatch");
        }
    }
    let hits = brute_hits.iter().filter(|h| h.is_some()).count();

    println!("Spheres:     {}", spheres);
    println!("Rays:        {} ({} hit)", rays.len(), hits);
    println!("Build:       {:?}", build_time);
    println!("kd-tree:     {:?}", tree_time);
    println!("Brute force: {:?}", brute_time);
    println!();
    println!("{}", tree.stats());

    if mismatches > 0 {
        bail!("{mismatches} of {} rays disagree with brute force", rays.len());
    }
    println!();
    println!("All rays match brute force");
    Ok(())
}
