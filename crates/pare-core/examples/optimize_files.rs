//! Optimize SVG files in place.
//!
//!     RUST_LOG=debug cargo run -p pare-core --example optimize_files -- a.svg b.svg
//!
//! With no arguments, every `.svg` under `crates/pare-core/tests/fixtures`
//! is optimized into a sibling `.min.svg` instead.

use pare_core::{OptimizeConfig, optimize_text};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_targets() -> Vec<(PathBuf, PathBuf)> {
    let dir = Path::new("crates/pare-core/tests/fixtures");
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|e| e == "svg")
                && !path.to_string_lossy().ends_with(".min.svg")
        })
        .map(|path| {
            let out = path.with_extension("min.svg");
            (path, out)
        })
        .collect()
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let targets: Vec<(PathBuf, PathBuf)> = if args.is_empty() {
        fixture_targets()
    } else {
        args.iter()
            .map(|a| (PathBuf::from(a), PathBuf::from(a)))
            .collect()
    };

    let config = OptimizeConfig::default();
    let mut optimized = 0;
    let mut skipped = 0;

    for (input_path, output_path) in &targets {
        let input = match fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("SKIP {}: {}", input_path.display(), e);
                skipped += 1;
                continue;
            }
        };

        match optimize_text(&input, &config) {
            Ok(output) => {
                if let Err(e) = fs::write(output_path, &output) {
                    eprintln!("ERROR writing {}: {}", output_path.display(), e);
                    skipped += 1;
                } else {
                    optimized += 1;
                    println!(
                        "✓ {} ({} → {} bytes)",
                        output_path.display(),
                        input.len(),
                        output.len()
                    );
                }
            }
            Err(e) => {
                eprintln!("MALFORMED {}: {}", input_path.display(), e);
                skipped += 1;
            }
        }
    }

    println!("\nOptimized: {optimized}, Skipped: {skipped}");
}
