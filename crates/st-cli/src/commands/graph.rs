//! Graph command implementation

use anyhow::{Context, Result};

use st_core::lineage;

use crate::cli::{GlobalArgs, GraphArgs, GraphFormatArg};
use crate::commands::common::load_corpus_from;

/// Execute the graph command.
pub fn execute(args: &GraphArgs, global: &GlobalArgs) -> Result<()> {
    let corpus = load_corpus_from(global)?;

    let rendered = match args.format {
        GraphFormatArg::NodesEdges => {
            let doc = lineage::export_nodes_edges(&corpus.models, &corpus.dag);
            serde_json::to_string_pretty(&doc)?
        }
        GraphFormatArg::Hierarchical => {
            let doc = lineage::export_hierarchical(&corpus.models);
            serde_json::to_string_pretty(&doc)?
        }
        GraphFormatArg::Dot => lineage::export_dot(&corpus.models),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if global.verbose {
        let stats = lineage::graph_stats(&corpus.models, &corpus.dag);
        eprintln!(
            "{} model(s), {} dependency edge(s), {} source(s), {} leaf/leaves",
            stats.total_models,
            stats.total_dependencies,
            stats.source_models.len(),
            stats.leaf_models.len()
        );
    }

    Ok(())
}
