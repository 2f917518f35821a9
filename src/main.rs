use clap::CommandFactory;
use clap::{Parser, Subcommand};
use sitepatch::commands::apply::ApplyOptions;
use sitepatch::commands::rewrite::RewriteOptions;
use sitepatch::commands::ship::ShipArgs;
use sitepatch::llm::client::LlmConfig;
use sitepatch::utils::setup_crypto_provider;
use std::path::PathBuf;

// Use jemalloc on musl x86_64 for better performance
#[cfg(all(target_env = "musl", target_arch = "x86_64"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(
    name = "sitepatch",
    about = "Idempotent literal patches for source trees, shipped with git",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\n",
        "Build Information:\n",
        "  Timestamp:         ", env!("VERGEN_BUILD_TIMESTAMP"), "\n",
        "  Target Triple:     ", env!("VERGEN_CARGO_TARGET_TRIPLE"), "\n",
        "\n",
        "Source Control:\n",
        "  Commit SHA:        ", env!("VERGEN_GIT_SHA"), "\n",
        "  Commit Timestamp:  ", env!("VERGEN_GIT_COMMIT_TIMESTAMP"), "\n",
        "  Branch:            ", env!("VERGEN_GIT_BRANCH"), "\n",
        "\n",
        "Compiler:\n",
        "  Rustc Version:     ", env!("VERGEN_RUSTC_SEMVER"), "\n",
        "  Rustc Channel:     ", env!("VERGEN_RUSTC_CHANNEL"), "\n",
        "  Host Triple:       ", env!("VERGEN_RUSTC_HOST_TRIPLE"), "\n"
    ),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON patch recipe to files under a project root.
    ///
    /// Every rule is idempotent: running the same recipe twice leaves the
    /// files as they were after the first run and reports "already applied".
    Apply {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        recipe: PathBuf,
        /// Directory the recipe paths are relative to
        #[arg(long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Print a unified diff per changed file
        #[arg(long)]
        diff: bool,
        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
        /// Skip the recipe's commit section
        #[arg(long)]
        no_commit: bool,
    },

    /// Ask an LLM to rewrite a whole file according to an instruction.
    ///
    /// The instruction may also be piped on stdin. The response is checked
    /// before anything is written; a rejected response leaves the file as is.
    Rewrite {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
        instruction: Option<String>,
        #[arg(short, long)]
        model: Option<String>,
        /// OpenAI-compatible endpoint, e.g. http://localhost:1234/v1
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        system_prompt: Option<String>,
        /// Show the diff without writing
        #[arg(long)]
        dry_run: bool,
        /// Accept responses that look truncated
        #[arg(long)]
        force: bool,
        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stage, commit, and optionally push changes in a git working tree.
    Ship {
        #[arg(short, long)]
        message: String,
        #[arg(long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,
        /// Path to stage; repeatable. Stages everything when omitted.
        #[arg(long = "path")]
        paths: Vec<PathBuf>,
        #[arg(long)]
        push: bool,
        #[arg(long)]
        remote: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Show instructions for enabling shell completions.
    Completions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_crypto_provider();

    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    sitepatch::logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            recipe,
            root,
            dry_run,
            diff,
            json,
            no_commit,
        } => sitepatch::commands::apply::run(
            recipe,
            root,
            ApplyOptions {
                dry_run,
                show_diff: diff,
                json,
                no_commit,
            },
        ),
        Commands::Rewrite {
            file,
            instruction,
            model,
            base_url,
            temperature,
            system_prompt,
            dry_run,
            force,
            json,
        } => match LlmConfig::from_env() {
            Ok(config) => {
                sitepatch::commands::rewrite::run(
                    file,
                    instruction,
                    config.with_overrides(model, base_url, temperature),
                    RewriteOptions {
                        system_prompt,
                        dry_run,
                        force,
                        json,
                    },
                )
                .await
            }
            Err(e) => Err(e),
        },
        Commands::Ship {
            message,
            root,
            paths,
            push,
            remote,
            branch,
            json,
        } => sitepatch::commands::ship::run(
            root,
            ShipArgs {
                message,
                paths,
                push,
                remote,
                branch,
                json,
            },
        ),
        Commands::Completions => {
            println!(
                "Bash:\n\
                echo \"source <(COMPLETE=bash sitepatch)\" >> ~/.bashrc\n\
                \n\
                Elvish:\n\
                echo \"eval (E:COMPLETE=elvish sitepatch | slurp)\" >> ~/.elvish/rc.elv\n\
                \n\
                Fish:\n\
                echo \"COMPLETE=fish sitepatch | source\" >> ~/.config/fish/config.fish\n\
                \n\
                Zsh:\n\
                echo \"source <(COMPLETE=zsh sitepatch)\" >> ~/.zshrc\n"
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
