//! Print the materialized document.

use amalgam::Document;

use crate::cli::FileArgs;
use crate::output::{OutputFormat, print_json};

/// Run the show command
pub fn run(args: &FileArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    print_json(&doc.to_json()?, format)?;
    Ok(())
}
