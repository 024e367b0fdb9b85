//! Command-line interface for skinquant
//!
//! Analyses one facial photo and prints the result as JSON

use skinquant::{
    image_loader, AnalysisConfig, AnalysisInput, AnalysisKind, CalibrationInput, ReferenceKind,
    SkinAnalyzer,
};
use std::{env, path::Path, process};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path = None;
    let mut kind = AnalysisKind::Full;
    let mut reference: Option<(ReferenceKind, f64)> = None;
    let mut compact = false;
    let mut image_path_arg = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(next_value(&args, &mut i, "--config").to_string());
            }
            "--kind" => {
                kind = match next_value(&args, &mut i, "--kind") {
                    "acne" => AnalysisKind::Acne,
                    "pigmentation" => AnalysisKind::Pigmentation,
                    "wrinkles" => AnalysisKind::Wrinkles,
                    "full" => AnalysisKind::Full,
                    other => {
                        eprintln!("Error: Unknown analysis kind '{}'", other);
                        process::exit(1);
                    }
                };
            }
            "--coin-pixels" => {
                reference = Some((ReferenceKind::Coin, parse_pixels(&args, &mut i, "--coin-pixels")));
            }
            "--finger-pixels" => {
                reference = Some((
                    ReferenceKind::Finger,
                    parse_pixels(&args, &mut i, "--finger-pixels"),
                ));
            }
            "--compact" => compact = true,
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") => {
                if image_path_arg.is_none() {
                    image_path_arg = Some(arg.to_string());
                } else {
                    eprintln!("Error: Multiple image paths provided");
                    process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    let image_path_str = match image_path_arg {
        Some(path) => path,
        None => {
            print_help(&args[0]);
            process::exit(1);
        }
    };
    let image_path = Path::new(&image_path_str);
    if !image_path.exists() {
        eprintln!("Error: File '{}' does not exist", image_path.display());
        process::exit(1);
    }

    let config = match config_path {
        Some(path) => match AnalysisConfig::from_json_file(Path::new(&path)) {
            Ok(cfg) => cfg,
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

    let pixels = match image_loader::load_pixels(image_path) {
        Ok(pixels) => pixels,
        Err(error) => {
            eprintln!("Analysis failed: {}", error);
            eprintln!("Suggestion: {}", error.user_message());
            process::exit(1);
        }
    };

    let mut input = AnalysisInput::new(pixels).with_kind(kind);
    if let Some((reference_kind, pixels)) = reference {
        let size_mm = reference_kind.default_size_mm().unwrap_or_default();
        input = input.with_calibration(CalibrationInput::with_reference(
            reference_kind,
            size_mm,
            pixels,
        ));
    }

    match analyzer.analyze(&input) {
        Ok(result) => {
            let json = if compact {
                serde_json::to_string(&result)
            } else {
                serde_json::to_string_pretty(&result)
            };
            match json {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing result: {}", e);
                    process::exit(1);
                }
            }
        }
        Err(error) => {
            eprintln!("Analysis failed: {}", error);
            if error.is_recoverable() {
                eprintln!("Suggestion: {}", error.user_message());
            }
            process::exit(1);
        }
    }
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> &'a str {
    if *i + 1 >= args.len() {
        eprintln!("Error: {} requires a value", flag);
        process::exit(1);
    }
    *i += 1;
    &args[*i]
}

fn parse_pixels(args: &[String], i: &mut usize, flag: &str) -> f64 {
    let value = next_value(args, i, flag);
    match value.parse::<f64>() {
        Ok(px) => px,
        Err(_) => {
            eprintln!("Error: {} expects a number, got '{}'", flag, value);
            process::exit(1);
        }
    }
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <image_path>", program_name);
    eprintln!();
    eprintln!("Measure acne, hyperpigmentation and wrinkles in a facial photo.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE          Load analysis thresholds from a JSON file");
    eprintln!("  --kind KIND            acne, pigmentation, wrinkles or full (default)");
    eprintln!("  --coin-pixels PX       Coin reference (25 mm) measured at PX pixels");
    eprintln!("  --finger-pixels PX     Finger reference (20 mm) measured at PX pixels");
    eprintln!("  --compact              Print JSON on one line");
    eprintln!("  --help, -h             Show this help message");
    eprintln!();
    eprintln!("Set RUST_LOG=skinquant=debug for pipeline logs on stderr.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} face.jpg", program_name);
    eprintln!("  {} --kind acne --coin-pixels 97 face.png", program_name);
}
