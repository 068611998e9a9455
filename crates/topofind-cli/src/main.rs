//! Topofind CLI
//!
//! Command-line front end for the find/hide query engine:
//! - Parsing query text into the structured selector pair (`parse`)
//! - Highlighting matching elements of a topology snapshot (`find`)
//! - Computing the cascaded hidden set for a snapshot (`hide`)
//!
//! Snapshots are JSON files:
//! `{ "nodes": [{"id", "parent"?, "isBox"?, "attrs"}], "edges": [{"id",
//! "source", "target", "attrs"}] }`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use topofind_dsl::{parse_find_query, parse_hide_query, FieldTable, ParsedQuery};
use topofind_graph::{compute_hidden, find_matches, EdgeMode, Snapshot};

#[derive(Parser)]
#[command(name = "topofind")]
#[command(
    author,
    version,
    about = "Topofind: find/hide query engine for topology graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    /// Traffic-graph vocabulary (apps, workloads, rates, edge protocols).
    Graph,
    /// Mesh-overview vocabulary (infra names and types).
    Mesh,
}

impl ViewArg {
    fn table(self) -> FieldTable {
        match self {
            ViewArg::Graph => FieldTable::traffic_graph(),
            ViewArg::Mesh => FieldTable::mesh(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EdgeModeArg {
    All,
    None,
    Unhealthy,
}

impl From<EdgeModeArg> for EdgeMode {
    fn from(arg: EdgeModeArg) -> EdgeMode {
        match arg {
            EdgeModeArg::All => EdgeMode::All,
            EdgeModeArg::None => EdgeMode::None,
            EdgeModeArg::Unhealthy => EdgeMode::Unhealthy,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a find/hide expression and print the selector pair as JSON.
    Parse {
        /// Query text, e.g. 'httpin > 5 and namespace = foo'
        expr: String,
        #[arg(long, value_enum, default_value = "graph")]
        view: ViewArg,
        /// Tag errors as the hide field instead of the find field.
        #[arg(long)]
        hide: bool,
    },

    /// Evaluate a find expression against a snapshot and print matched ids.
    Find {
        /// Snapshot JSON file.
        snapshot: PathBuf,
        expr: String,
        #[arg(long, value_enum, default_value = "graph")]
        view: ViewArg,
    },

    /// Run the hide cascade against a snapshot and print the hidden sets.
    Hide {
        /// Snapshot JSON file.
        snapshot: PathBuf,
        expr: String,
        #[arg(long, value_enum, default_value = "graph")]
        view: ViewArg,
        #[arg(long, value_enum, default_value = "all")]
        edge_mode: EdgeModeArg,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { expr, view, hide } => {
            let table = view.table();
            let parsed = if hide {
                parse_hide_query(&expr, &table)
            } else {
                parse_find_query(&expr, &table)
            };
            match parsed {
                Ok(query) => print_query(&query)?,
                Err(e) => {
                    eprintln!("{}", e.to_string().red());
                    std::process::exit(1);
                }
            }
        }

        Commands::Find {
            snapshot,
            expr,
            view,
        } => {
            let snap = load_snapshot(&snapshot)?;
            let query = parse_find_query(&expr, &view.table())?;
            let matched = find_matches(
                &snap,
                query.node_selector.as_ref(),
                query.edge_selector.as_ref(),
            );
            if matched.is_empty() {
                println!("{}", "no matches".dimmed());
            } else {
                for id in matched {
                    println!("{id}");
                }
            }
            print_hints(&query);
        }

        Commands::Hide {
            snapshot,
            expr,
            view,
            edge_mode,
        } => {
            let snap = load_snapshot(&snapshot)?;
            let query = parse_hide_query(&expr, &view.table())?;
            let hidden = compute_hidden(
                &snap,
                query.node_selector.as_ref(),
                query.edge_selector.as_ref(),
                edge_mode.into(),
            );

            let mut nodes: Vec<&String> = hidden.nodes.iter().collect();
            let mut edges: Vec<&String> = hidden.edges.iter().collect();
            nodes.sort();
            edges.sort();

            println!("{}", "hidden nodes:".bold());
            for id in nodes {
                println!("  {id}");
            }
            println!("{}", "hidden edges:".bold());
            for id in edges {
                println!("  {id}");
            }
            print_hints(&query);
        }
    }

    Ok(())
}

fn load_snapshot(path: &PathBuf) -> Result<Snapshot> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn print_query(query: &ParsedQuery) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(query)?);
    Ok(())
}

fn print_hints(query: &ParsedQuery) {
    for hint in &query.hints {
        eprintln!("{}", hint.notice().yellow());
    }
}
