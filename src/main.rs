use std::env;
use std::fs;
use std::path::Path;
use trellis::{LayoutDocument, PipelineError, layout_file};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Lays out a JSON document and prints or writes the render commands.
fn main() -> Result<(), PipelineError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Lays out a JSON layout document and emits its render commands as JSON.");
        eprintln!();
        eprintln!("Usage: {} <path/to/layout.json> [path/to/commands.json]", args[0]);
        eprintln!();
        eprintln!("Without an output path the report is printed to stdout.");
        std::process::exit(1);
    }

    let input = Path::new(&args[1]);
    match args.get(2) {
        Some(output) => {
            let report = layout_file(input, Path::new(output))?;
            log::info!(
                "wrote {} commands for {} elements to {}",
                report.stats.render_command_count,
                report.stats.element_count,
                output
            );
            for error in &report.errors {
                eprintln!("[{}] {}", error.kind, error.message);
            }
        }
        None => {
            let document = LayoutDocument::from_json(&fs::read_to_string(input)?)?;
            let report = document.layout()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
