//! List the changes of a document.

use amalgam::Document;

use crate::cli::FileArgs;
use crate::output::{OutputFormat, print_table};

/// Run the history command
pub fn run(args: &FileArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load_from_file(&args.file)?;
    let changes = doc.get_changes();

    match format {
        OutputFormat::Human => {
            if changes.is_empty() {
                println!("No changes.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = changes
                .iter()
                .map(|change| {
                    vec![
                        change.hash().short(),
                        change.actor().short(),
                        change.seq().to_string(),
                        change.time_rfc3339(),
                        change.len().to_string(),
                        change.message().unwrap_or_default().to_string(),
                    ]
                })
                .collect();
            print_table(&["HASH", "ACTOR", "SEQ", "TIME", "OPS", "MESSAGE"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = changes
                .iter()
                .map(|change| {
                    serde_json::json!({
                        "hash": change.hash().to_string(),
                        "actor": change.actor().to_string(),
                        "seq": change.seq(),
                        "start_op": change.start_op(),
                        "time": change.time_rfc3339(),
                        "ops": change.len(),
                        "message": change.message(),
                        "deps": change.deps().iter().map(ToString::to_string).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}
