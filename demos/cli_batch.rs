//! Batch CLI for skinquant
//!
//! Analyses every photo in a directory and writes one JSON result per image

use skinquant::{image_loader, AnalysisConfig, AnalysisInput, SkinAnalyzer};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        print_help(&args[0]);
        process::exit(1);
    }

    let input_path = Path::new(&args[1]);
    let output_path = Path::new(&args[2]);

    let config = match args.get(3) {
        Some(path) => match AnalysisConfig::from_json_file(Path::new(path)) {
            Ok(cfg) => {
                eprintln!("Loaded configuration from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("Error loading config file: {}", e);
                process::exit(1);
            }
        },
        None => AnalysisConfig::default(),
    };
    let analyzer = match SkinAnalyzer::try_new(config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = fs::create_dir_all(output_path) {
        eprintln!("Error creating output directory: {}", e);
        process::exit(1);
    }

    let image_files = match find_image_files(input_path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error finding image files: {}", e);
            process::exit(1);
        }
    };

    if image_files.is_empty() {
        eprintln!("No image files found in {}", input_path.display());
        process::exit(1);
    }

    eprintln!("Found {} image files to process", image_files.len());
    eprintln!();

    let mut success_count = 0;
    let mut error_count = 0;

    for (i, image_path) in image_files.iter().enumerate() {
        let filename = image_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        eprint!("[{}/{}] Processing {}... ", i + 1, image_files.len(), filename);

        let outcome = image_loader::load_pixels(image_path)
            .and_then(|pixels| analyzer.analyze(&AnalysisInput::new(pixels)));

        match outcome {
            Ok(result) => {
                let base_name = image_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                let json_path = output_path.join(format!("{}.json", base_name));

                if let Err(e) = write_json(&result, &json_path) {
                    eprintln!("✗ {}", e);
                    error_count += 1;
                    continue;
                }

                eprintln!("✓");
                success_count += 1;

                if env::var("VERBOSE").is_ok() {
                    if let Some(acne) = &result.acne {
                        eprintln!(
                            "  → Acne: {} lesions ({}), mode {:?}",
                            acne.metrics.total_count, acne.metrics.severity, acne.detection_mode
                        );
                    }
                    if let Some(pig) = &result.pigmentation {
                        eprintln!(
                            "  → Pigmentation: {:.1}% ({})",
                            pig.metrics.pigmented_percent, pig.metrics.severity
                        );
                    }
                    if let Some(wr) = &result.wrinkles {
                        eprintln!(
                            "  → Wrinkles: {} lines ({})",
                            wr.metrics.count, wr.metrics.severity
                        );
                    }
                }
            }
            Err(error) => {
                eprintln!("✗ {}", error);
                error_count += 1;
            }
        }
    }

    eprintln!();
    eprintln!("Batch processing complete:");
    eprintln!("  Success: {}", success_count);
    eprintln!("  Errors: {}", error_count);
    eprintln!("  Results saved to: {}", output_path.display());

    if error_count > 0 {
        process::exit(1);
    }
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} <input> <output_dir> [config.json]", program_name);
    eprintln!();
    eprintln!("Batch analyse facial photos and write one JSON result per image.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  input          Image file or directory of images");
    eprintln!("  output_dir     Directory receiving <image>.json results");
    eprintln!("  config.json    Optional analysis configuration");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VERBOSE=1      Print a summary for each image");
    eprintln!("  RUST_LOG       Pipeline log filter, e.g. skinquant=debug");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} photos/ results/", program_name);
    eprintln!("  VERBOSE=1 {} photos/ results/ thresholds.json", program_name);
}

fn write_json(result: &skinquant::AnalysisResult, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json)?;
    Ok(())
}

fn find_image_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();

    if dir.is_file() {
        files.push(dir.to_path_buf());
        return Ok(files);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(image_loader::is_supported_extension);
        if supported {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
