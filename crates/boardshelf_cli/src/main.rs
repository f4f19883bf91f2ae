//! `boardshelf` command-line entry point.
//!
//! # Responsibility
//! - Open the shelf database under a data directory and run one command.
//! - Print results on stdout; diagnostics go to the rolling log files.

mod cli;

use anyhow::{anyhow, Context, Result};
use boardshelf_core::board_list::apply_drop;
use boardshelf_core::model::board::{board_exists, locate_folder};
use boardshelf_core::service::transfer::default_selection;
use boardshelf_core::{
    default_log_level, init_from_config, open_shelf_db, BoardIndexStore, BoardListItem, DropIntent,
    DropTarget, ItemKind, ShelfConfig, ShelfSession, SqliteBoardRepository,
};
use clap::Parser;
use cli::{Cli, Commands, IntentArg};
use log::info;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    init_from_config(&config).context("failed to initialize logging")?;

    let conn = open_shelf_db(&config.paths).with_context(|| {
        format!(
            "failed to open shelf database at `{}`",
            config.paths.db_path().display()
        )
    })?;
    let repo = SqliteBoardRepository::try_new(&conn).context("failed to prepare repository")?;
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Commands::List => {
            let store = BoardIndexStore::load(repo)?;
            print_index(store.items(), store.active_board_id());
        }
        Commands::Create { name } => {
            let mut store = BoardIndexStore::load(repo)?;
            let board = store.create_board(&name)?;
            println!("{}", board.id);
        }
        Commands::Rename { id, name } => {
            BoardIndexStore::load(repo)?.rename_board(&id, &name)?;
        }
        Commands::RenameFolder { id, name } => {
            BoardIndexStore::load(repo)?.rename_folder(&id, &name)?;
        }
        Commands::Ungroup { folder_id } => {
            BoardIndexStore::load(repo)?.ungroup_folder(&folder_id)?;
        }
        Commands::Delete { id } => {
            BoardIndexStore::load(repo)?.delete_board(&id)?;
        }
        Commands::Duplicate { id, name } => {
            let mut store = BoardIndexStore::load(repo)?;
            let board = store.duplicate_board(&id, name.as_deref())?;
            println!("{}", board.id);
        }
        Commands::Activate { id } => {
            BoardIndexStore::load(repo)?.set_active_board(&id)?;
        }
        Commands::Move {
            dragged,
            target,
            intent,
        } => {
            let mut store = BoardIndexStore::load(repo)?;
            let items = store.items();
            let active_kind = item_kind(items, &dragged)?;
            let over_kind = item_kind(items, &target)?;
            let drop_target = DropTarget {
                over_id: target,
                over_kind,
                intent: intent.into(),
            };
            match apply_drop(items, &dragged, active_kind, &drop_target) {
                Some(next) => {
                    store.write(next)?;
                    print_index(store.items(), store.active_board_id());
                }
                None => println!("nothing to move"),
            }
        }
        Commands::Export { path } => {
            let mut session = ShelfSession::open(repo, config.autosave_delay)?;
            let bundle = session
                .export_bundle(&path)
                .with_context(|| format!("failed to export to `{}`", path.display()))?;
            println!("exported {} boards", bundle.boards.len());
        }
        Commands::Inspect { path } => {
            let session = ShelfSession::open(repo, config.autosave_delay)?;
            let (bundle, candidates) = session
                .read_import(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            println!("bundle version {}", bundle.version);
            for candidate in candidates {
                println!(
                    "[{}] {:<3} {} key={}{}{}",
                    if candidate.selected { "x" } else { " " },
                    candidate.index,
                    candidate.name,
                    candidate.key,
                    if candidate.duplicate { " duplicate" } else { "" },
                    if candidate.has_data { "" } else { " empty" },
                );
            }
        }
        Commands::Import { path, select, all } => {
            let mut session = ShelfSession::open(repo, config.autosave_delay)?;
            let (bundle, candidates) = session
                .read_import(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            let selected = if all {
                (0..bundle.boards.len()).collect()
            } else if select.is_empty() {
                default_selection(&candidates)
            } else {
                select
            };
            let summary = session.import(&bundle, &selected)?;
            println!(
                "imported {} skipped {}",
                summary.imported, summary.skipped
            );
        }
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ShelfConfig> {
    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(&cli.data_dir)
    };
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    Ok(ShelfConfig::new(data_dir).with_log_level(level))
}

fn item_kind(items: &[BoardListItem], id: &str) -> Result<ItemKind> {
    if locate_folder(items, id).is_some() {
        Ok(ItemKind::Folder)
    } else if board_exists(items, id) {
        Ok(ItemKind::Board)
    } else {
        Err(anyhow!("no board or folder with id `{id}`"))
    }
}

fn print_index(items: &[BoardListItem], active: Option<&str>) {
    if items.is_empty() {
        println!("(no boards)");
        return;
    }
    let marker = |id: &str| if active == Some(id) { "*" } else { " " };
    for item in items {
        match item {
            BoardListItem::Board(board) => {
                println!("{} {}  {}", marker(board.id.as_str()), board.id, board.name);
            }
            BoardListItem::Folder(folder) => {
                println!("  {}  {}/", folder.id, folder.name);
                for board in &folder.items {
                    println!("{}   {}  {}", marker(board.id.as_str()), board.id, board.name);
                }
            }
        }
    }
}

impl From<IntentArg> for DropIntent {
    fn from(value: IntentArg) -> Self {
        match value {
            IntentArg::Before => DropIntent::Before,
            IntentArg::After => DropIntent::After,
            IntentArg::Inside => DropIntent::Inside,
        }
    }
}
