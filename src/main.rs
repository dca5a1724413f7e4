use clap::Parser;
use miette::Result;
use vct::cli::helpers::discover_workspace;
use vct::cli::{logging, Cli, Commands};
use vct::core::Config;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let workspace = discover_workspace(&global).ok();
    let config = Config::load(workspace.as_ref());
    logging::init(global.verbose, config.log_level());

    match cli.command {
        Commands::Init(args) => vct::cli::commands::init::run(args),
        Commands::Import(args) => vct::cli::commands::import::run(args, &global),
        Commands::Export(args) => vct::cli::commands::export::run(args, &global),
        Commands::Template(args) => vct::cli::commands::template::run(args),
        Commands::Mapping(args) => vct::cli::commands::mapping::run(args, &global),
        Commands::List(args) => vct::cli::commands::list::run(args, &global),
        Commands::Tag(args) => vct::cli::commands::tag::run(args, &global),
        Commands::Config(cmd) => vct::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => vct::cli::commands::completions::run(args),
    }
}
