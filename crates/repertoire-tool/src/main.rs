//! Repertoire command-line tool
//!
//! Lists variants, exports PGN (whole tree or a single variant), imports PGN
//! into the persisted tree shape and resolves FEN deep links.
//!
//! Usage:
//!   repertoire variants tree.json
//!   repertoire pgn tree.json [--variant NAME] [--comments comments.json]
//!   repertoire import games.pgn --out tree.json [--comments-out comments.json]
//!   repertoire locate tree.json --fen "<FEN>" [--variant NAME]

mod config;
mod error;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use repertoire_core::{
    enumerate_variants, import_pgn, pgn, select_variant, tree_to_pgn, variant_to_pgn, Board,
    ChessBoard, CommentSource, DeepLink, FenIndex, NoComments, PgnHeader, Side,
};
use tracing_subscriber::EnvFilter;

use crate::config::ToolConfig;
use crate::error::ToolError;
use crate::store::FileCommentStore;

#[derive(Parser)]
#[command(name = "repertoire")]
#[command(about = "Inspect and export chess opening repertoires")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every variant with its name and moves
    Variants {
        /// Persisted repertoire tree (JSON)
        tree: PathBuf,
    },
    /// Export the repertoire, or one variant, as PGN
    Pgn {
        tree: PathBuf,

        /// Export only this variant (full name or base name)
        #[arg(long)]
        variant: Option<String>,

        /// Side the repertoire is played from
        #[arg(long, value_enum)]
        orientation: Option<Orientation>,

        /// Comment store (JSON object FEN -> text)
        #[arg(long, value_name = "FILE")]
        comments: Option<PathBuf>,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Import PGN games (with variations) into a persisted tree
    Import {
        pgn: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,

        /// Where to write comments found in the PGN
        #[arg(long, value_name = "FILE")]
        comments_out: Option<PathBuf>,
    },
    /// Find the node and variant for a position
    Locate {
        tree: PathBuf,

        #[arg(long)]
        fen: String,

        /// Restrict the search to one variant
        #[arg(long)]
        variant: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Orientation {
    White,
    Black,
}

impl From<Orientation> for Side {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::White => Side::White,
            Orientation::Black => Side::Black,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ToolConfig::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Variants { tree } => list_variants(&tree).await?,
        Command::Pgn {
            tree,
            variant,
            orientation,
            comments,
            output,
        } => {
            let orientation = orientation.map(Side::from).unwrap_or(config.orientation);
            let comments = comments.or_else(|| config.comments_path.clone());
            let text = export_pgn(&config, &tree, variant.as_deref(), orientation, comments).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &text).await?;
                    tracing::info!("Wrote {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Import {
            pgn,
            out,
            comments_out,
        } => import(&pgn, &out, comments_out.as_deref()).await?,
        Command::Locate { tree, fen, variant } => locate(&tree, fen, variant).await?,
    }

    Ok(())
}

async fn list_variants(path: &std::path::Path) -> Result<(), ToolError> {
    let tree = store::load_tree(path).await?;
    let variants = enumerate_variants(&tree);
    tracing::info!("{} variants in {}", variants.len(), path.display());

    for variant in &variants {
        println!("{}\t{}", variant.full_name, variant.sans(&tree).join(" "));
    }
    Ok(())
}

async fn export_pgn(
    config: &ToolConfig,
    path: &std::path::Path,
    variant: Option<&str>,
    orientation: Side,
    comments: Option<PathBuf>,
) -> Result<String, ToolError> {
    let tree = store::load_tree(path).await?;
    let source: Box<dyn CommentSource> = match comments {
        Some(path) => Box::new(FileCommentStore::new(path)),
        None => Box::new(NoComments),
    };
    let today = chrono::Local::now().date_naive();
    let start = ChessBoard::default();

    let pgn = match variant {
        Some(wanted) => {
            let variants = enumerate_variants(&tree);
            let found = variants
                .iter()
                .find(|v| v.full_name == wanted)
                .or_else(|| variants.iter().find(|v| v.name == wanted))
                .ok_or_else(|| ToolError::UnknownVariant(wanted.to_string()))?;
            let header = header_for(config, &found.full_name, orientation, today);
            variant_to_pgn(&tree, found, &start, &header, source.as_ref()).await?
        }
        None => {
            let header = header_for(config, &config.name, orientation, today);
            tree_to_pgn(&tree, tree.root(), &start, &header, source.as_ref()).await?
        }
    };
    Ok(pgn)
}

fn header_for(
    config: &ToolConfig,
    name: &str,
    orientation: Side,
    date: chrono::NaiveDate,
) -> PgnHeader {
    let mut header = PgnHeader::new(name, orientation, date);
    header.site = config.site.clone();
    header.annotator = config.annotator.clone();
    header
}

async fn import(
    pgn_path: &std::path::Path,
    out: &std::path::Path,
    comments_out: Option<&std::path::Path>,
) -> Result<(), ToolError> {
    let text = tokio::fs::read_to_string(pgn_path).await?;
    let imported = import_pgn(&text)?;
    store::save_tree(out, &imported.tree).await?;

    let variants = enumerate_variants(&imported.tree);
    tracing::info!(
        "Imported {} variants into {} ({})",
        variants.len(),
        out.display(),
        imported.name.as_deref().unwrap_or("unnamed")
    );

    if let Some(path) = comments_out {
        store::save_comments(path, &imported.comments).await?;
        tracing::info!("Wrote {} comments to {}", imported.comments.len(), path.display());
    } else if !imported.comments.is_empty() {
        tracing::warn!(
            "{} comments found but no --comments-out given; they were dropped",
            imported.comments.len()
        );
    }
    Ok(())
}

async fn locate(
    path: &std::path::Path,
    fen: String,
    variant: Option<String>,
) -> Result<(), ToolError> {
    let tree = store::load_tree(path).await?;
    let variants = enumerate_variants(&tree);
    let link = DeepLink {
        variant,
        fen: Some(fen),
    };

    let start = ChessBoard::default();
    let index = FenIndex::build(&tree, &variants, link.variant.as_deref(), &start)?;
    let fen = link.fen.as_deref().unwrap_or_default();
    let Some(node) = index.lookup(fen) else {
        println!("Position not in repertoire");
        return Ok(());
    };

    let board = pgn::board_at(&tree, node, &start)?;
    let line = tree
        .path_to(node)
        .iter()
        .map(|id| tree.node(*id).label())
        .collect::<Vec<_>>()
        .join(" ");
    println!("Line: {}", if line.is_empty() { "(start)" } else { line.as_str() });
    println!("FEN:  {}", board.fen());

    if let Some(idx) = select_variant(&variants, &tree, node, None, &link) {
        println!("Variant: {}", variants[idx].full_name);
    }
    Ok(())
}
