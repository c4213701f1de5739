use clap::{Parser, Subcommand};
use schemagraph::config::DesignerConfig;
use schemagraph::designer::Designer;
use schemagraph::inference::RelationDelta;
use schemagraph::model::TableId;
use schemagraph::snapshot::Snapshot;
use schemagraph::view::{DetailLevel, DiagramView};
use std::fmt::Write;
use std::fs;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "schemagraph", about = "Inspect and repair schema designer projects")]
struct CommandLine {
    /// JSON file overriding designer defaults
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report relations that do not match the field naming convention
    Check {
        input: String,
        /// Write the repaired project instead of failing
        #[arg(long)]
        fix: bool,
        /// Output file for --fix (default: overwrite input)
        #[arg(short, long, requires = "fix")]
        output: Option<String>,
    },
    /// Print tables, columns and relations
    View {
        input: String,
        /// Detail level: tables, keys, all
        #[arg(short, long, default_value = "all")]
        detail: String,
        /// Restrict to these table names
        #[arg(short, long)]
        table: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = CommandLine::parse();

    let config = match &cli.config {
        Some(path) => {
            let input = read_file(path);
            DesignerConfig::from_json(&input).unwrap_or_else(|e| {
                eprintln!("Invalid config {}: {}", path, e);
                process::exit(1);
            })
        }
        None => DesignerConfig::default(),
    };

    match cli.command {
        Command::Check { input, fix, output } => {
            let (designer, delta) = load(&input, config);
            print!("{}", describe_delta(&designer, &delta));

            if delta.is_empty() {
                println!("{}: consistent", input);
                return;
            }
            if !fix {
                process::exit(2);
            }

            let path = output.unwrap_or(input);
            let json = designer.snapshot().to_json().unwrap_or_else(|e| {
                eprintln!("Failed to serialize project: {}", e);
                process::exit(1);
            });
            if let Err(e) = fs::write(&path, json) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
            info!(path = %path, "repaired project written");
        }
        Command::View {
            input,
            detail,
            table,
        } => {
            let detail = DetailLevel::from_str(&detail).unwrap_or_else(|| {
                eprintln!("Invalid detail level: {}", detail);
                process::exit(1);
            });
            let (designer, _) = load(&input, config);
            let include: Vec<TableId> = designer
                .tables()
                .filter(|t| table.contains(&t.name))
                .map(|t| t.id)
                .collect();
            let include = (!table.is_empty()).then_some(include.as_slice());
            let view = DiagramView::build(&designer, include, detail);
            print!("{}", render_text(&view));
        }
    }
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn load(path: &str, config: DesignerConfig) -> (Designer, RelationDelta) {
    let input = read_file(path);
    let snapshot = match Snapshot::from_json(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid project {}: {}", path, e);
            process::exit(1);
        }
    };
    match Designer::from_snapshot(snapshot, config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Invalid project {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn table_name(designer: &Designer, id: TableId) -> String {
    designer
        .table(id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn describe_delta(designer: &Designer, delta: &RelationDelta) -> String {
    let mut out = String::new();
    for relation in &delta.retracted {
        let _ = writeln!(
            out,
            "stale relation {} ({} -> {})",
            relation.id,
            table_name(designer, relation.from_table_id),
            table_name(designer, relation.to_table_id)
        );
    }
    for relation in &delta.created {
        let field = designer
            .field(relation.field_id)
            .map(|f| f.name.as_str())
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "missing relation {}.{} -> {}",
            table_name(designer, relation.from_table_id),
            field,
            table_name(designer, relation.to_table_id)
        );
    }
    out
}

fn render_text(view: &DiagramView) -> String {
    let mut out = String::new();
    for node in &view.nodes {
        let _ = writeln!(out, "{} @ ({}, {})", node.label, node.position.x, node.position.y);
        for column in &node.columns {
            let marker = if column.is_fk { " fk" } else { "" };
            let _ = writeln!(out, "    {} {}{}", column.name, column.typ, marker);
        }
    }
    for edge in &view.edges {
        let from = view.nodes.iter().find(|n| n.id == edge.from).map(|n| n.label.as_str());
        let to = view.nodes.iter().find(|n| n.id == edge.to).map(|n| n.label.as_str());
        let _ = writeln!(
            out,
            "{}.{} -> {}",
            from.unwrap_or("?"),
            edge.label,
            to.unwrap_or("?")
        );
    }
    out
}
