use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod format;
mod logging;

use commands::acr::RegistryArgs;
use commands::blob::BlobArgs;

/// azlook - Azure Container Registry and Blob Storage explorer
///
/// Walks registry repositories, manifests and tags, and probes blob
/// container properties.
#[derive(Parser, Debug)]
#[command(name = "azlook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Explore an Azure Container Registry
    Acr {
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(subcommand)]
        command: AcrCommands,
    },
    /// Inspect Azure Blob Storage containers
    Blob {
        #[command(subcommand)]
        command: BlobCommands,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum AcrCommands {
    /// Walk every repository, manifest and tag
    #[command(visible_alias = "ls")]
    List {
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// List repository names
    Repos {
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// List tags of a repository
    Tags {
        /// Repository name
        repository: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Show manifest properties
    Show {
        /// Repository name
        repository: String,
        /// Tag or digest (sha256:...)
        reference: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Check registry connectivity
    Check {
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BlobCommands {
    /// Show container properties
    Props {
        #[command(flatten)]
        storage: BlobArgs,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a config file with default values
    Init,
    /// Display the resolved configuration
    Show {
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(context::VerbosityLevel::from_count(cli.verbose));

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(cli.color.as_deref(), cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init => commands::config::handle_init(&ctx),
            ConfigCommands::Show { format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::config::handle_show(&ctx, fmt);
            }
            ConfigCommands::Path => commands::config::handle_path(&ctx),
        },
        Commands::Acr { registry, command } => match command {
            AcrCommands::List { format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::acr::handlers::handle_acr_list(&ctx, &registry, fmt).await;
            }
            AcrCommands::Repos { format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::acr::handlers::handle_acr_repos(&ctx, &registry, fmt).await;
            }
            AcrCommands::Tags { repository, format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::acr::handlers::handle_acr_tags(&ctx, &registry, &repository, fmt).await;
            }
            AcrCommands::Show {
                repository,
                reference,
                format,
            } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::acr::handlers::handle_acr_show(
                    &ctx,
                    &registry,
                    &repository,
                    &reference,
                    fmt,
                )
                .await;
            }
            AcrCommands::Check { format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::acr::handlers::handle_acr_check(&ctx, &registry, fmt).await;
            }
        },
        Commands::Blob { command } => match command {
            BlobCommands::Props { storage, format } => {
                let fmt = ctx.output_format(format.as_deref());
                commands::blob::handlers::handle_blob_props(&ctx, &storage, fmt).await;
            }
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
