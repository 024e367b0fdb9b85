//! Generate a default analysis configuration file
//!
//! Creates a JSON config with every threshold at its default value

use skinquant::AnalysisConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} configs/default.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = AnalysisConfig::default();

    match config.to_json_file(output_path) {
        Ok(_) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!(
                "  Segmentation: margin {} px, regions {}-{} px",
                config.segmentation.border_margin,
                config.segmentation.min_region_pixels,
                config.segmentation.max_region_pixels
            );
            eprintln!(
                "  Hybrid: confidence ≥ {:.2}, {} regions per box, timeout {} ms",
                config.hybrid.min_confidence,
                config.hybrid.max_regions_per_box,
                config.hybrid.detector_timeout_ms
            );
            eprintln!(
                "  Wrinkles: edge threshold {:.0}",
                config.wrinkles.edge_threshold
            );
            eprintln!(
                "  False positives: keep at most {}",
                config.false_positive.max_kept
            );
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}
