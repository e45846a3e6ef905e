use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use rit::errors::Result;
use rit::paths::RitPaths;
use rit::{commands, output};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rit",
    version = rit::VERSION,
    about = "A raw version control system",
    long_about = "Incremental snapshot version control: full and incremental \
                  tar archives of a working directory, organized as a commit \
                  graph with branches and a tiered backup rotation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging level. Default level is info.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging level. Default level is info.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository in the current directory
    Init,

    /// Create a commit from the current state
    Commit {
        /// The commit message
        msg: String,
    },

    /// Switch HEAD and restore the working tree
    Checkout {
        /// The ref to checkout, or the new branch name with --orphan
        ref_or_name: Option<String>,

        /// Attach HEAD to a new branch with no commits yet
        #[arg(long)]
        orphan: bool,

        /// Discard uncommitted changes if there are any
        #[arg(short, long)]
        force: bool,
    },

    /// Reset current HEAD (or its branch) to the specified state
    Reset {
        /// Commit to reset to
        r#ref: String,

        /// Also restore the working tree to the target commit
        #[arg(long)]
        hard: bool,
    },

    /// List, create, move, or delete branches
    Branch {
        /// The branch to create. If omitted, lists all branches.
        name: Option<String>,

        /// The head of the new branch. By default, the current commit.
        r#ref: Option<String>,

        /// Overwrite the branch if it already exists
        #[arg(short, long)]
        force: bool,

        /// Delete the specified branch
        #[arg(short, long)]
        delete: bool,
    },

    /// Log the commit history
    Log {
        /// The refs to log. By default, the current head.
        refs: Vec<String>,

        /// Include all branches
        #[arg(long)]
        all: bool,

        /// Include full commit ids and dates
        #[arg(long)]
        full: bool,
    },

    /// Show the contents of a commit
    Show {
        /// The ref to show. By default, head.
        r#ref: Option<String>,
    },

    /// Show the working tree's diff state
    Status,

    /// Remove commits unreachable from any branch or HEAD
    Prune,

    /// Print a read-only snapshot of the object store
    Query,

    /// Tiered backup rotation
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Take a periodic snapshot on the time-bucketed level branches
    Periodic,

    /// Expire aged-out level branches, then prune unreachable commits
    Prune,

    /// Restore the tree to a ref, keeping a before/after restore point
    Restore {
        /// The ref to restore to
        r#ref: String,
    },

    /// Take a snapshot and rotate it into the quick ring
    Quick,

    /// Take a snapshot pinned under a permanent manual branch
    Manual {
        /// Name of the manual backup
        name: String,
    },
}

fn init_tracing(verbosity: i8) {
    let default = match verbosity {
        i8::MIN..=-1 => "rit=warn",
        0 => "rit=info",
        1 => "rit=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    if let Err(e) = run() {
        output::error(&e.to_string());
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = (i16::from(cli.verbose) - i16::from(cli.quiet))
        .clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8;
    output::set_verbosity(verbosity);
    init_tracing(verbosity);

    // init and completion run before repository discovery.
    let command = match cli.command {
        Commands::Init => {
            commands::init::execute(&std::env::current_dir()?)?;
            return Ok(());
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
            return Ok(());
        }
        command => command,
    };

    let paths = RitPaths::discover(std::env::current_dir()?)?;
    match command {
        Commands::Init | Commands::Completion { .. } => unreachable!("handled above"),
        Commands::Commit { msg } => {
            commands::commit::execute(&paths, &msg)?;
        }
        Commands::Checkout {
            ref_or_name,
            orphan,
            force,
        } => {
            commands::checkout::execute(&paths, ref_or_name.as_deref(), orphan, force)?;
        }
        Commands::Reset { r#ref, hard } => {
            commands::reset::execute(&paths, &r#ref, hard)?;
        }
        Commands::Branch {
            name,
            r#ref,
            force,
            delete,
        } => {
            commands::branch::execute(&paths, name.as_deref(), r#ref.as_deref(), force, delete)?;
        }
        Commands::Log { refs, all, full } => {
            commands::log::execute(&paths, &refs, all, full)?;
        }
        Commands::Show { r#ref } => {
            commands::show::execute(&paths, r#ref.as_deref())?;
        }
        Commands::Status => {
            commands::status::execute(&paths)?;
        }
        Commands::Prune => {
            commands::prune::execute(&paths)?;
        }
        Commands::Query => {
            commands::query::execute(&paths)?;
        }
        Commands::Backup { action } => match action {
            BackupAction::Periodic => commands::backup::periodic(&paths)?,
            BackupAction::Prune => commands::backup::prune(&paths)?,
            BackupAction::Restore { r#ref } => commands::backup::restore(&paths, &r#ref)?,
            BackupAction::Quick => commands::backup::quick(&paths)?,
            BackupAction::Manual { name } => commands::backup::manual(&paths, &name)?,
        },
    }

    Ok(())
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(generator, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
