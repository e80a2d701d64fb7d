//! Merge two document files.

use amalgam::Document;
use tracing::info;

use crate::cli::MergeArgs;
use crate::output::OutputFormat;

/// Run the merge command
pub fn run(args: &MergeArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let left = Document::load_from_file(&args.left)?;
    let right = Document::load_from_file(&args.right)?;

    let merged = left.merge(&right)?;
    merged.save_to_file(&args.output)?;

    let added = merged.log().len() - left.log().len();
    info!(
        output = %args.output.display(),
        changes = merged.log().len(),
        added,
        "Merged documents"
    );

    match format {
        OutputFormat::Human => println!(
            "Merged {} changes ({added} new) into {}",
            merged.log().len(),
            args.output.display()
        ),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "output": args.output.display().to_string(),
                "changes": merged.log().len(),
                "added": added,
                "heads": merged.heads().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
