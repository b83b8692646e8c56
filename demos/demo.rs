use std::path::PathBuf;

use aerio::{Colormap, FiducialLocator, FilterParams};
use clap::{Parser, ValueEnum};
use glob::glob;
use image::ImageReader;
use log::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Cmap {
    Gray,
    Hot,
    Jet,
}

impl From<Cmap> for Colormap {
    fn from(c: Cmap) -> Self {
        match c {
            Cmap::Gray => Colormap::Gray,
            Cmap::Hot => Colormap::Hot,
            Cmap::Jet => Colormap::Jet,
        }
    }
}

/// Locate the fiducial corner in every image crop matching a glob pattern
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// e.g. "data/fiducials/*.png"
    pattern: String,

    /// directory for the preview images
    #[arg(short, long, default_value = "previews")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 3)]
    kernel_size: u32,

    #[arg(short, long, default_value_t = 1)]
    iterations: u32,

    /// adaptive threshold block size, odd and > 1
    #[arg(short, long)]
    block_size: Option<u32>,

    #[arg(long, value_enum, default_value_t = Cmap::Gray)]
    colormap: Cmap,

    /// preview width and height in pixels
    #[arg(long, num_args = 2)]
    size: Option<Vec<u32>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut params = FilterParams::new(args.kernel_size, args.iterations);
    if let Some(block_size) = args.block_size {
        params = params.with_threshold(block_size);
    }
    let size = args.size.as_ref().map(|s| (s[0], s[1]));
    std::fs::create_dir_all(&args.output)?;

    for path in glob(&args.pattern)? {
        let path = path?;
        let img = ImageReader::open(&path)?.decode()?.to_luma32f();
        let mut locator = FiducialLocator::new(&img);
        match locator.compute_coordinates(&params) {
            Ok((x, y)) => info!("{}: corner at ({}, {})", path.display(), x, y),
            Err(e) => warn!("{}: {}", path.display(), e),
        }
        let preview = locator.preview(size, args.colormap.into(), true);
        let name = path.file_name().ok_or("path has no file name")?;
        let out = args.output.join(name).with_extension("png");
        preview.save(&out)?;
        println!("{}", out.display());
    }

    Ok(())
}
