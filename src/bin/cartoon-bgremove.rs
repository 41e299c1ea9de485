use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cartoon_bg_removal::{
    default_output_path, BackgroundRemover, ProcessResult, RemovalConfig, Settings,
};

#[derive(Parser)]
#[command(
    name = "cartoon-bgremove",
    about = "Make the near-white background of cartoon portraits transparent",
    version,
    after_help = "Simple usage: cartoon-bgremove <image>  (writes {name}_transparent.png)\n\n\
                  Defaults are read from BACKGROUND_REMOVAL_TOLERANCE and\n\
                  BACKGROUND_REMOVAL_EDGE_SMOOTHING; flags override them."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_transparent.png)
    #[arg(short, long)]
    output: Option<String>,

    /// How far below pure white a channel may be and still count as background (0-255)
    #[arg(short, long)]
    tolerance: Option<u8>,

    /// Disable mask smoothing (erosion then dilation)
    #[arg(long)]
    no_smoothing: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    init_tracing(cli.verbose || settings.debug, cli.quiet);

    let config = RemovalConfig {
        tolerance: cli.tolerance.unwrap_or(settings.removal.tolerance),
        edge_smoothing: settings.removal.edge_smoothing && !cli.no_smoothing,
    };
    let remover = BackgroundRemover::new(config);

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !cli.quiet {
        eprintln!(
            "Tolerance: {} (white threshold {}), smoothing: {}",
            config.tolerance,
            config.white_threshold(),
            if config.edge_smoothing { "on" } else { "off" }
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = cli.output.as_deref().map(PathBuf::from) else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: cartoon-bgremove <input_dir> -o <output_dir>");
            process::exit(1);
        };
        remover.process_directory(input_path, &output_dir)
    } else {
        let output_path = cli
            .output
            .as_deref()
            .map_or_else(|| default_output_path(input_path), PathBuf::from);
        vec![remover.process_file(input_path, &output_path)]
    };

    for line in results
        .iter()
        .flat_map(|r| report_lines(r, cli.verbose, cli.quiet))
    {
        eprintln!("{line}");
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprintln!("{}", summary_line(results.len(), failed));
    }

    if failed > 0 {
        process::exit(1);
    }
}

/// Lines reported for one processed file.
fn report_lines(result: &ProcessResult, verbose: bool, quiet: bool) -> Vec<String> {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if !result.success {
        return vec![format!("[FAIL] {filename}: {}", result.message)];
    }
    if quiet {
        return Vec::new();
    }

    let mut lines = vec![match &result.output {
        Some(out) => format!(
            "[OK] {filename} -> {} ({:.1}% transparent)",
            out.display(),
            result.percent_removed()
        ),
        None => format!("[OK] {filename}"),
    }];
    if verbose && !result.message.is_empty() {
        lines.push(format!("  -> {}", result.message));
    }
    lines
}

fn summary_line(total: usize, failed: usize) -> String {
    let mut line = format!("[Summary] Processed: {}", total - failed);
    if failed > 0 {
        line.push_str(&format!(", Failed: {failed}"));
    }
    line.push_str(&format!(" (Total: {total})"));
    line
}
