use clap::Parser;
use std::path::PathBuf;

use quickdigits::{RecognitionPipeline, RtenDigitClassifier, load_grayscale};

#[derive(Parser)]
#[command(name = "quickdigits")]
#[command(about = "Recognize a handwritten number from an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Path to the digit classifier model (defaults to the cache location)
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Print located digit boxes only, without running the classifier
    #[arg(long)]
    boxes: bool,

    /// Emit the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // In JSON mode every failure takes the {"error": ...} wire form, no
    // matter which stage it came from.
    match run(&args) {
        Ok(()) => Ok(()),
        Err(err) => {
            if args.json {
                println!("{}", error_json(&err));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let img = load_grayscale(&args.image_path)?;
    let pipeline = RecognitionPipeline::new();

    if args.boxes {
        let regions = pipeline.locate(&img)?;
        println!("Located {} digit region(s):", regions.len());
        for (i, r) in regions.iter().enumerate() {
            println!(
                "  {}: x={} y={} {}x{} (area {})",
                i,
                r.min_x,
                r.min_y,
                r.width(),
                r.height(),
                r.area()
            );
        }
        return Ok(());
    }

    let classifier = match &args.model {
        Some(path) => RtenDigitClassifier::from_path(path)?,
        None => RtenDigitClassifier::from_default_location()?,
    };

    let result = pipeline.recognize(&img, &classifier)?;
    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", result.full_number);
        for digit in &result.digits {
            eprintln!(
                "  pos {}: digit {} (confidence {:.4})",
                digit.position, digit.digit, digit.confidence
            );
        }
    }
    Ok(())
}

fn error_json(err: &anyhow::Error) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}
