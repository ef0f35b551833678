//! Images to PDF CLI
//!
//! Command-line interface for assembling JPEG/PNG images into a single PDF.

use clap::Parser;
use images_to_pdf::{file_ops::images_to_pdf_file, PageGeometry};
use std::path::PathBuf;

/// Convert JPEG/PNG images into a single paginated PDF, one page per image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image files to convert, in page order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, default_value = "ImagesToPDF.pdf")]
    output: PathBuf,

    /// Page width in points
    #[arg(long, default_value = "595.28")]
    page_width: f32,

    /// Page height in points
    #[arg(long, default_value = "841.89")]
    page_height: f32,

    /// Margin around each image in points
    #[arg(long, default_value = "20")]
    margin: f32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let geometry = PageGeometry {
        width: args.page_width,
        height: args.page_height,
        margin: args.margin,
    };

    println!("Images to PDF");
    println!("=============");

    let result = images_to_pdf_file(&args.images, &args.output, &geometry)?;

    if args.verbose {
        for (path, placed) in args.images.iter().zip(result.placements.iter()) {
            println!(
                "  {:?}: {:.2}x{:.2} pt at ({:.2}, {:.2})",
                path, placed.width, placed.height, placed.x, placed.y
            );
        }
    }

    println!(
        "\nDone! {} pages written to {:?}",
        result.page_count, args.output
    );

    Ok(())
}
