//! taxocomp - Hierarchical abundance comparison CLI
//!
//! Command-line interface for two-group and pairwise comparison of
//! hierarchical abundance tables.

use clap::{Parser, Subcommand};
use taxocomp::aggregate::AggregateConfig;
use taxocomp::compare::{ComparisonConfig, SignificancePolicy};
use taxocomp::data::{
    find_group, groups_from_metadata, AbundanceTable, HierarchyNode, Metadata, TreeSummary,
};
use taxocomp::error::Result;
use taxocomp::pipeline::{run_comparison, run_matrix, PipelineOptions};
use std::path::PathBuf;

/// Hierarchical abundance group comparison
#[derive(Parser)]
#[command(name = "taxocomp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two sample groups over the hierarchy
    Compare {
        /// Path to abundance table TSV
        #[arg(short = 'c', long)]
        table: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column defining the groups
        #[arg(short = 'g', long)]
        group_column: String,

        /// Name of group 1
        #[arg(long)]
        group_1: String,

        /// Name of group 2
        #[arg(long)]
        group_2: String,

        /// Output path for results TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Table is in long format (lineage, sample, value)
        #[arg(long)]
        long: bool,

        /// Lineage path delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: String,

        /// P-value threshold for significance
        #[arg(long, default_value = "0.05")]
        max_p: f64,

        /// Optional q-value threshold for significance
        #[arg(long)]
        max_q: Option<f64>,

        /// Aggregate only significant nodes
        #[arg(long)]
        significant_only: bool,

        /// Also write the full result set as JSON next to the TSV
        #[arg(long)]
        json: bool,
    },

    /// Compare every pair of sample groups
    Matrix {
        /// Path to abundance table TSV
        #[arg(short = 'c', long)]
        table: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column defining the groups
        #[arg(short = 'g', long)]
        group_column: String,

        /// Output path for the per-pair summary TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Table is in long format (lineage, sample, value)
        #[arg(long)]
        long: bool,

        /// Lineage path delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: String,

        /// P-value threshold for significance
        #[arg(long, default_value = "0.05")]
        max_p: f64,

        /// Optional q-value threshold for significance
        #[arg(long)]
        max_q: Option<f64>,
    },

    /// Summarize the hierarchy built from an abundance table
    Tree {
        /// Path to abundance table TSV
        #[arg(short = 'c', long)]
        table: PathBuf,

        /// Table is in long format (lineage, sample, value)
        #[arg(long)]
        long: bool,

        /// Lineage path delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: String,
    },
}

fn load_tree(table: &PathBuf, long: bool, delimiter: &str) -> Result<HierarchyNode> {
    eprintln!("Loading abundance table from {:?}...", table);
    let table = if long {
        AbundanceTable::from_long_tsv(table)?
    } else {
        AbundanceTable::from_wide_tsv(table)?
    };
    eprintln!(
        "  {} lineages x {} samples",
        table.n_lineages(),
        table.n_samples()
    );
    table.build_hierarchy(delimiter)
}

fn options(max_p: f64, max_q: Option<f64>, significant_only: bool) -> PipelineOptions {
    PipelineOptions {
        comparison: ComparisonConfig {
            policy: SignificancePolicy { max_p, max_q },
            ..Default::default()
        },
        aggregate: AggregateConfig {
            significant_only,
            ..Default::default()
        },
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            table,
            metadata,
            group_column,
            group_1,
            group_2,
            output,
            long,
            delimiter,
            max_p,
            max_q,
            significant_only,
            json,
        } => {
            let tree = load_tree(&table, long, &delimiter)?;

            eprintln!("Loading metadata from {:?}...", metadata);
            let metadata = Metadata::from_tsv(metadata)?;
            let groups = groups_from_metadata(&metadata, &group_column)?;
            let g1 = find_group(&groups, &group_1)?;
            let g2 = find_group(&groups, &group_2)?;

            eprintln!(
                "Comparing '{}' ({} samples) vs '{}' ({} samples)...",
                g1.name,
                g1.len(),
                g2.name,
                g2.len()
            );
            let opts = options(max_p, max_q, significant_only);
            let outcome = run_comparison(&tree, g1, g2, &opts)?;

            eprintln!("Writing results to {:?}...", output);
            outcome.stats.to_tsv(&output)?;
            if json {
                let json_path = output.with_extension("json");
                eprintln!("Writing JSON to {:?}...", json_path);
                std::fs::write(&json_path, outcome.stats.to_json_string()?)?;
            }

            eprintln!("Done!");
            println!("{}", outcome.stats.summary());
        }

        Commands::Matrix {
            table,
            metadata,
            group_column,
            output,
            long,
            delimiter,
            max_p,
            max_q,
        } => {
            let tree = load_tree(&table, long, &delimiter)?;

            eprintln!("Loading metadata from {:?}...", metadata);
            let metadata = Metadata::from_tsv(metadata)?;
            let groups = groups_from_metadata(&metadata, &group_column)?;
            eprintln!(
                "Comparing {} groups pairwise ({} pairs)...",
                groups.len(),
                groups.len() * groups.len().saturating_sub(1) / 2
            );

            let opts = options(max_p, max_q, false);
            let matrix = run_matrix(&tree, &groups, &opts)?;

            eprintln!("Writing summary to {:?}...", output);
            matrix.to_tsv(&output)?;

            eprintln!("Done!");
            println!("{}", matrix);
        }

        Commands::Tree {
            table,
            long,
            delimiter,
        } => {
            let tree = load_tree(&table, long, &delimiter)?;
            println!("{}", TreeSummary::of(&tree));
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
