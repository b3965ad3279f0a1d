mod build;
mod config;
mod discover;
mod logging;
mod scaffold;
mod serve;
mod watch;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use expander::Meta;

#[derive(Parser)]
#[command(name = "daphne", version, about = "Static website compiler")]
struct Cli {
    /// Site directory containing _config.toml
    #[arg(short, long, global = true, default_value = ".")]
    source: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v for progress, -vv for expansion details)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory (the default)
    Build,

    /// Build, then rebuild whenever a source file changes
    Watch,

    /// Build for localhost, serve the output and rebuild on changes
    Serve(ServeArgs),

    /// Create the directories and config of a new site
    New,

    /// Create a post dated today
    NewPost(NewPostArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = serve::DEFAULT_PORT)]
    port: u16,
}

#[derive(clap::Args)]
struct NewPostArgs {
    /// Post title; several words are joined with spaces
    #[arg(required = true)]
    title: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => process::exit(build::run(&cli.source, cli.no_color, &Meta::new())),
        Command::Watch => {
            let overrides = Meta::new();
            build::run(&cli.source, cli.no_color, &overrides);
            let rebuild = || {
                build::run(&cli.source, cli.no_color, &overrides);
            };
            if let Err(e) = watch::watch(&cli.source, rebuild) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Command::Serve(args) => {
            if let Err(e) = serve::serve(&cli.source, cli.no_color, args.port) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Command::New => match scaffold::new_project(&cli.source) {
            Ok(created) => {
                for path in created {
                    eprintln!("created {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        Command::NewPost(args) => {
            let title = args.title.join(" ");
            let today = chrono::Local::now().date_naive();
            match scaffold::new_post(&cli.source, &title, today) {
                Ok(path) => eprintln!("created {}", path.display()),
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
