//! Create a document file, optionally starting from a seed change.

use amalgam::{Document, ROOT};
use tracing::info;

use crate::cli::NewArgs;
use crate::output::OutputFormat;

/// Run the new command
pub fn run(args: &NewArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    if args.file.exists() && !args.force {
        return Err(format!("{} already exists; pass --force to overwrite", args.file.display()).into());
    }

    let doc = match &args.seed {
        Some(seed) => seeded(seed)?,
        None => Document::new(),
    };
    doc.save_to_file(&args.file)?;
    info!(path = %args.file.display(), changes = doc.log().len(), "Created document");

    let heads: Vec<String> = doc.heads().iter().map(ToString::to_string).collect();
    match format {
        OutputFormat::Human => match heads.first() {
            Some(head) => println!("Created {} with seed change {head}", args.file.display()),
            None => println!("Created {}", args.file.display()),
        },
        OutputFormat::Json => {
            let value = serde_json::json!({
                "path": args.file.display().to_string(),
                "heads": heads,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

/// A document whose only change writes `seed` into the root as the seed actor.
pub fn seeded(seed: &str) -> Result<Document, Box<dyn std::error::Error>> {
    let json: serde_json::Value = serde_json::from_str(seed)?;
    let fields = json
        .as_object()
        .ok_or("seed must be a JSON object")?;
    Ok(Document::seed().change(|tx| tx.merge_json(&ROOT, fields))?)
}
