//! `vct init` command - Initialize a new content workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::{ProjectError, Workspace};
use crate::core::{Config, SqliteStore};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the config even if .vct/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    match Workspace::init(&path, args.force) {
        Ok(workspace) => {
            let config = Config::load(Some(&workspace));
            let db_path = config.database_path(&workspace);
            SqliteStore::open(&db_path)?;

            println!(
                "{} Initialized content workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!("  config: {}", workspace.vct_dir().join("config.yaml").display());
            println!("  store:  {}", db_path.display());
            println!();
            println!("Next steps:");
            println!(
                "  {} Print an import template",
                style("vct template document").yellow()
            );
            println!(
                "  {} Preview an import",
                style("vct import document docs.csv --dry-run").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Content workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("vct init --force").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
