//! Tile-based concurrent rendering.
//!
//! The image is split into horizontal row bands ("sub-images"). A fixed
//! pool of workers pulls bands from a shared pending list, renders each one
//! into a private buffer or a PPM file, and pushes the result onto a shared
//! completed list. Once every worker has finished, the bands are sorted by
//! their first row and stitched into the final image.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{RenderError, RenderResult};
use crate::hittable::Hittable;
use crate::ppm::Image;
use crate::renderer::{color_to_rgb8, render_pixel};
use crate::Camera;
use lux_core::{RenderSettings, TileStorageKind};

/// A contiguous band of image rows, `first_row..=last_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Position of this band in top-to-bottom order
    pub index: usize,
    pub first_row: u32,
    pub last_row: u32,
}

impl Tile {
    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }
}

/// Split `height` rows into `count` bands of `height / count` rows.
///
/// The remainder rows go to the last band. `count` is clamped to
/// `[1, height]`; a zero-height image has no bands.
pub fn partition_rows(height: u32, count: usize) -> Vec<Tile> {
    if height == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, height as usize) as u32;
    let rows_per_tile = height / count;

    (0..count)
        .map(|i| {
            let first_row = i * rows_per_tile;
            let last_row = if i + 1 == count {
                height - 1
            } else {
                first_row + rows_per_tile - 1
            };
            Tile {
                index: i as usize,
                first_row,
                last_row,
            }
        })
        .collect()
}

/// Pixels of a finished band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileData {
    /// Row-major pixels of the band
    Memory(Vec<[u8; 3]>),
    /// PPM sub-image holding the band
    Disk(PathBuf),
}

/// A band and its rendered pixels.
#[derive(Debug, Clone)]
pub struct RenderedTile {
    pub tile: Tile,
    pub data: TileData,
}

/// Where finished bands are kept until assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileStorage {
    Memory,
    /// Sub-images named `<name><first>-<last>.ppm` inside `dir`; the files
    /// and the directory are removed after assembly.
    Disk { dir: PathBuf, name: String },
}

impl TileStorage {
    fn tile_path(dir: &Path, name: &str, tile: &Tile) -> PathBuf {
        dir.join(format!("{}{}-{}.ppm", name, tile.first_row, tile.last_row))
    }
}

/// Parameters of a tiled render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Worker thread count
    pub threads: usize,
    /// Requested number of bands
    pub sub_images: usize,
    /// Seeds band shuffling and per-band sampling
    pub seed: u64,
    pub storage: TileStorage,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            sub_images: 1,
            seed: 0,
            storage: TileStorage::Memory,
        }
    }
}

impl RenderOptions {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let storage = match settings.tile_storage {
            TileStorageKind::Memory => TileStorage::Memory,
            TileStorageKind::Disk => TileStorage::Disk {
                dir: settings.sub_images_dir(),
                name: settings.image_name.clone(),
            },
        };
        Self {
            threads: settings.threads,
            sub_images: settings.sub_images,
            seed: settings.seed,
            storage,
        }
    }
}

/// Seed of the sampler for a band starting at `first_row`.
///
/// Depends only on the render seed and the band, never on which worker
/// renders it.
fn tile_seed(seed: u64, first_row: u32) -> u64 {
    seed ^ (first_row as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Render every pixel of a band, left to right, top to bottom.
pub fn render_tile(camera: &Camera, world: &dyn Hittable, tile: &Tile, seed: u64) -> Vec<[u8; 3]> {
    let mut rng = StdRng::seed_from_u64(tile_seed(seed, tile.first_row));
    let mut pixels = Vec::with_capacity(camera.image_width as usize * tile.row_count() as usize);

    for j in tile.first_row..=tile.last_row {
        for i in 0..camera.image_width {
            let color = render_pixel(camera, world, i, j, &mut rng);
            pixels.push(color_to_rgb8(color));
        }
    }

    pixels
}

/// State shared by the workers of one render.
struct WorkQueue {
    pending: Mutex<Vec<Tile>>,
    completed: Mutex<Vec<RenderedTile>>,
    total: usize,
    finished: AtomicUsize,
    aborted: AtomicBool,
    first_error: Mutex<Option<RenderError>>,
}

impl WorkQueue {
    fn new(mut tiles: Vec<Tile>, seed: u64) -> Self {
        // Spread expensive regions of the image across workers
        tiles.shuffle(&mut StdRng::seed_from_u64(seed));
        Self {
            total: tiles.len(),
            pending: Mutex::new(tiles),
            completed: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
        }
    }

    fn next_tile(&self) -> Option<Tile> {
        if self.aborted.load(Ordering::Relaxed) {
            return None;
        }
        self.pending.lock().pop()
    }

    fn complete(&self, rendered: RenderedTile) {
        self.completed.lock().push(rendered);
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failure; only the first one is kept.
    fn fail(&self, err: RenderError) {
        self.aborted.store(true, Ordering::Relaxed);
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

/// Render the scene with a pool of `options.threads` workers.
///
/// The result is independent of the thread count and of scheduling: every
/// band uses its own seeded sampler and bands are assembled in row order.
pub fn render_tiles(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
) -> RenderResult<Image> {
    let tiles = partition_rows(camera.image_height, options.sub_images);
    let threads = options.threads.max(1);

    if let TileStorage::Disk { dir, .. } = &options.storage {
        std::fs::create_dir_all(dir).map_err(RenderError::io(dir))?;
    }

    log::info!(
        "Rendering {}x{} with {} threads, {} sub-images",
        camera.image_width,
        camera.image_height,
        threads,
        tiles.len()
    );

    let queue = WorkQueue::new(tiles, options.seed);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("lux-worker-{i}"))
        .build()?;

    pool.scope(|s| {
        for worker in 0..threads {
            let queue = &queue;
            s.spawn(move |_| worker_loop(worker, camera, world, options, queue));
        }
    });

    if let Some(err) = queue.first_error.into_inner() {
        return Err(err);
    }

    let completed = queue.completed.into_inner();
    assemble(camera.image_width, camera.image_height, completed, &options.storage)
}

fn worker_loop(
    worker: usize,
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
    queue: &WorkQueue,
) {
    while let Some(tile) = queue.next_tile() {
        if worker == 0 {
            let done = queue.finished.load(Ordering::Relaxed);
            log::info!(
                "Progress: {}/{} sub-images ({:.0}%)",
                done,
                queue.total,
                100.0 * done as f32 / queue.total as f32
            );
        }
        log::debug!(
            "Worker {} rendering rows {}-{}",
            worker,
            tile.first_row,
            tile.last_row
        );

        let pixels = render_tile(camera, world, &tile, options.seed);
        let data = match &options.storage {
            TileStorage::Memory => TileData::Memory(pixels),
            TileStorage::Disk { dir, name } => {
                let path = TileStorage::tile_path(dir, name, &tile);
                let band = Image {
                    width: camera.image_width,
                    height: tile.row_count(),
                    pixels,
                };
                if let Err(err) = band.write_ppm(&path) {
                    queue.fail(err);
                    return;
                }
                TileData::Disk(path)
            }
        };

        queue.complete(RenderedTile { tile, data });
    }
}

/// Concatenate bands, sorted by first row, into the final image.
///
/// Bands may arrive in any order. Sub-image files are read back and
/// deleted, followed by their directory.
pub fn assemble(
    width: u32,
    height: u32,
    mut tiles: Vec<RenderedTile>,
    storage: &TileStorage,
) -> RenderResult<Image> {
    tiles.sort_by_key(|rendered| rendered.tile.first_row);
    let mut pixels = Vec::with_capacity(width as usize * height as usize);

    for RenderedTile { tile, data } in tiles {
        match data {
            TileData::Memory(band) => pixels.extend(band),
            TileData::Disk(path) => {
                let band = Image::read_ppm(&path)?;
                let expected = (width, tile.row_count());
                if (band.width, band.height) != expected {
                    return Err(RenderError::TileSize {
                        path,
                        expected,
                        found: (band.width, band.height),
                    });
                }
                pixels.extend(band.pixels);
                std::fs::remove_file(&path).map_err(RenderError::io(&path))?;
            }
        }
    }

    if let TileStorage::Disk { dir, .. } = storage {
        if let Err(e) = std::fs::remove_dir(dir) {
            log::warn!("Could not remove sub-image directory {}: {}", dir.display(), e);
        }
    }

    Image::from_pixels(width, height, pixels).ok_or_else(|| RenderError::MalformedPpm {
        path: PathBuf::new(),
        reason: "assembled sub-images do not cover the image".to_string(),
    })
}
