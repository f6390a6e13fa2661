use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use lux_core::{load_settings, RenderSettings};
use lux_renderer::{build_scene, render_tiles, RenderOptions};

/// Offline multithreaded path tracer
#[derive(Parser, Debug)]
#[command(name = "lux")]
#[command(version)]
#[command(about = "Render a scene described by a JSON settings file to a PPM image")]
struct Cli {
    /// Render settings file (JSON)
    config: PathBuf,

    /// Worker thread count
    #[arg(short, long)]
    threads: Option<usize>,

    /// Number of row bands the image is split into
    #[arg(short = 'n', long)]
    sub_images: Option<usize>,

    /// Output directory for the image and its sub-images
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Seed for scene generation and sampling
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Apply command-line values on top of the loaded settings.
    fn apply(&self, settings: &mut RenderSettings) {
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(sub_images) = self.sub_images {
            settings.sub_images = sub_images;
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
    }
}

/// Format a duration as `Xh Ym Zs`.
fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!(
        "{}h {}m {}s",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid command-line override")?;

    log::info!(
        "Running {} threads, with {} sub-images to be rendered",
        settings.threads,
        settings.sub_images
    );

    let scene = build_scene(&settings).context("Failed to build scene")?;
    let options = RenderOptions::from_settings(&settings);

    let start = Instant::now();
    let image = render_tiles(&scene.camera, scene.world.as_ref(), &options)
        .context("Render failed")?;
    log::info!("Rendering time: {}", format_elapsed(start.elapsed()));

    let path = settings.output_path();
    image
        .write_ppm(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_elapsed(Duration::from_millis(59_900)), "0h 0m 59s");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "3h 25m 7s");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "lux",
            "scene.json",
            "--threads",
            "6",
            "-n",
            "12",
            "--output",
            "out",
            "--seed",
            "9",
        ])
        .unwrap();

        let mut settings = RenderSettings::default();
        cli.apply(&mut settings);

        assert_eq!(cli.config, PathBuf::from("scene.json"));
        assert_eq!(settings.threads, 6);
        assert_eq!(settings.sub_images, 12);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.seed, 9);
    }

    #[test]
    fn test_cli_requires_config() {
        assert!(Cli::try_parse_from(["lux"]).is_err());
    }
}
