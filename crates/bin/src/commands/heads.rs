//! Print the heads of a document.

use amalgam::Document;

use crate::cli::FileArgs;
use crate::output::OutputFormat;

/// Run the heads command
pub fn run(args: &FileArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    let heads: Vec<String> = doc.heads().iter().map(ToString::to_string).collect();

    match format {
        OutputFormat::Human => {
            if heads.is_empty() {
                println!("No changes.");
            }
            for head in &heads {
                println!("{head}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&heads)?),
    }
    Ok(())
}
