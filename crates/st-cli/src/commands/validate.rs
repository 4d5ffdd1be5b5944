//! Validate command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{load_corpus, warning_count};

/// Execute the validate command.
pub fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let corpus = load_corpus(&global.root, args.strict)?;

    println!(
        "Validated {} model(s): {} warning(s)",
        corpus.models.len(),
        warning_count(&corpus.diagnostics)
    );
    Ok(())
}
