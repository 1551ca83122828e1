//! geometry_watch - render watched geometries from a debugger snapshot
//!
//! # Usage
//!
//! ```bash
//! geometry_watch frame.json poly ring --settings watch.json --out poly.png
//! geometry_watch frame.json track --width 1024 --height 512 --fill
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use geometry_watch::convert::Snapshot;
use geometry_watch::{logging, render, ItemStatus, Settings};

#[derive(Parser)]
#[command(name = "geometry_watch")]
#[command(author, version, about = "Render geometries decoded from a debugger snapshot")]
struct Args {
    /// Snapshot JSON with expressions and memory blocks
    snapshot: PathBuf,

    /// Expressions to draw
    #[arg(required = true)]
    expressions: Vec<String>,

    /// Settings JSON (image size, colors, user types)
    #[arg(long, short = 's')]
    settings: Option<PathBuf>,

    /// Output PNG file
    #[arg(long, short = 'o', default_value = "watch.png")]
    out: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Stretch the data to the image instead of keeping its aspect ratio
    #[arg(long)]
    fill: bool,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.apply_env();
    if let Some(w) = args.width {
        settings.image_width = w;
    }
    if let Some(h) = args.height {
        settings.image_height = h;
    }
    settings.fill |= args.fill;

    let snapshot = Snapshot::from_file(&args.snapshot)?;
    let output = render(&args.expressions, &snapshot, &snapshot, &settings);

    for (name, status) in &output.items {
        match status {
            ItemStatus::Drawn { kind, triangles } => println!("{}: {} ({} triangles)", name, kind, triangles),
            ItemStatus::Empty { kind } => println!("{}: empty {}", name, kind),
            ItemStatus::Failed(message) => println!("{}: error: {}", name, message),
        }
    }
    if let Some(extent) = &output.extent {
        println!(
            "extent: [{}, {}] x [{}, {}]",
            extent.min[0], extent.max[0], extent.min[1], extent.max[1]
        );
    }

    output
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}
