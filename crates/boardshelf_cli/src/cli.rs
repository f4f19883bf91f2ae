//! Command-line definition for the `boardshelf` tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect and edit a board shelf data directory.
#[derive(Parser, Debug)]
#[command(name = "boardshelf")]
#[command(version)]
#[command(about = "Manage the ordered board list of a drawing-board shelf")]
pub struct Cli {
    /// Data directory holding `boards/` and `logs/`
    #[arg(long, global = true, env = "BOARDSHELF_DATA_DIR", default_value = ".boardshelf")]
    pub data_dir: PathBuf,

    /// Log level (trace|debug|info|warn|error); defaults by build mode
    #[arg(long, global = true, env = "BOARDSHELF_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the board list in display order
    List,

    /// Create an empty board at the end of the list and activate it
    Create { name: String },

    /// Rename a board
    Rename { id: String, name: String },

    /// Rename a folder
    RenameFolder { id: String, name: String },

    /// Dissolve a folder, keeping its boards in place
    Ungroup { folder_id: String },

    /// Delete a board and its canvas
    Delete { id: String },

    /// Copy a board and its canvas
    Duplicate {
        id: String,
        /// Name of the copy (default: "<name> (Copy)")
        #[arg(long)]
        name: Option<String>,
    },

    /// Make a board the active one
    Activate { id: String },

    /// Drop one row onto another
    Move {
        /// Dragged board or folder id
        dragged: String,
        /// Target board or folder id
        target: String,
        #[arg(long, value_enum)]
        intent: IntentArg,
    },

    /// Write every board to a bundle file
    Export { path: PathBuf },

    /// List the entries of a bundle file with their default selection
    Inspect { path: PathBuf },

    /// Import boards from a bundle file
    Import {
        path: PathBuf,
        /// Entry indices to import (default: the default selection)
        #[arg(long, value_delimiter = ',', conflicts_with = "all")]
        select: Vec<usize>,
        /// Import every entry, duplicates included
        #[arg(long)]
        all: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentArg {
    Before,
    After,
    Inside,
}
