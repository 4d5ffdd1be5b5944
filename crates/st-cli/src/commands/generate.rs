//! Generate command implementation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use st_core::{lineage, Settings};
use st_sql::{dialect_for, generate_audits, SqlGenerator};

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::commands::common::load_corpus;

/// Execute the generate command.
pub fn execute(args: &GenerateArgs, global: &GlobalArgs) -> Result<()> {
    // Unknown dialect is fatal before any pipeline stage runs
    let settings = Settings {
        dialect: args.dialect.parse()?,
        out_dir: resolve_against_root(&global.root, &args.out_dir),
        ..Settings::new(global.root.clone())
    };

    let corpus = load_corpus(&settings.root, false)?;
    let generator = SqlGenerator::new(&corpus.models, &corpus.dag, dialect_for(settings.dialect));

    std::fs::create_dir_all(&settings.out_dir).with_context(|| {
        format!(
            "cannot create output directory {}",
            settings.out_dir.display()
        )
    })?;

    let artifacts = generator.generate_all()?;
    for (name, sql) in &artifacts {
        let path = settings.out_dir.join(format!("{}.sql", name));
        std::fs::write(&path, sql)
            .with_context(|| format!("cannot write {}", path.display()))?;
        if global.verbose {
            eprintln!("wrote {}", path.display());
        }
    }

    // Audit statements, one document per audit, keyed <model>.<index>
    let audit_dir = settings.out_dir.join("audits");
    let audit_dialect = dialect_for(settings.dialect);
    let mut audit_count = 0;
    for model in corpus.models.values() {
        for statement in generate_audits(model, audit_dialect.as_ref()) {
            if audit_count == 0 {
                std::fs::create_dir_all(&audit_dir).with_context(|| {
                    format!("cannot create audit directory {}", audit_dir.display())
                })?;
            }
            let path = audit_dir.join(format!("{}.sql", statement.key));
            std::fs::write(&path, &statement.sql)
                .with_context(|| format!("cannot write {}", path.display()))?;
            audit_count += 1;
        }
    }

    // Dependency-graph document for downstream lineage rendering
    let graph = lineage::export_nodes_edges(&corpus.models, &corpus.dag);
    let graph_path = settings.out_dir.join("graph.json");
    std::fs::write(&graph_path, serde_json::to_string_pretty(&graph)?)
        .with_context(|| format!("cannot write {}", graph_path.display()))?;

    println!(
        "Generated {} model artifact(s) and {} audit statement(s) to {}",
        artifacts.len(),
        audit_count,
        settings.out_dir.display()
    );
    Ok(())
}

/// Resolve a directory against the root unless absolute.
pub(crate) fn resolve_against_root(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}
