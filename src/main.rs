use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use compact_str::CompactString;
use gh_export::{
    Exporter, RepoName,
    config::{default_config_path, load_config},
    export::{DEFAULT_DISCUSSIONS_FILE, DEFAULT_ISSUES_FILE, DEFAULT_PULLS_FILE},
    logging::{LogFormat, LoggingConfig, init_logging},
};

#[derive(Parser)]
#[command(name = "gh-export")]
#[command(version)]
#[command(about = "Export GitHub issues, pull requests and discussions to CSV")]
#[command(after_long_help = r#"EXAMPLES
    $ gh-export issues acme/widgets
    $ gh-export pulls acme/widgets widget-pulls.csv
    $ gh-export discussions acme/widgets

CONFIGURATION
    The token is taken from --token, then GITHUB_TOKEN (a .env file in the
    current directory is honoured), then the `token` key of the config file.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// GitHub personal access token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<CompactString>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, global = true)]
    api_url: Option<CompactString>,

    /// GraphQL endpoint
    #[arg(long, global = true)]
    graphql_url: Option<CompactString>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Export issues (pull requests are skipped)
    Issues(ExportArgs),
    /// Export pull requests
    Pulls(ExportArgs),
    /// Export the first 100 discussions
    Discussions(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Repository as owner/repository
    repo_name: RepoName,
    /// Output CSV file
    output_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&LoggingConfig::new(cli.verbose, cli.log_format))
        .map_err(|e| color_eyre::eyre::eyre!("Failed to initialize logging: {e}"))?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?.merge(cli.token, cli.api_url, cli.graphql_url);

    let exporter = Exporter::new(config).await?;
    println!("GitHub token is valid (authenticated as {})", exporter.login());

    match cli.command {
        Command::Issues(args) => {
            let output = args.output_file.unwrap_or_else(|| DEFAULT_ISSUES_FILE.into());
            let summary = exporter.issues(&args.repo_name, &output).await?;
            println!(
                "CSV file '{}' created successfully with issue data from {}!",
                summary.path.display(),
                summary.repo
            );
        },
        Command::Pulls(args) => {
            let output = args.output_file.unwrap_or_else(|| DEFAULT_PULLS_FILE.into());
            let summary = exporter.pulls(&args.repo_name, &output).await?;
            println!(
                "CSV file '{}' created successfully with pull request data from {}!",
                summary.path.display(),
                summary.repo
            );
        },
        Command::Discussions(args) => {
            let output = args
                .output_file
                .unwrap_or_else(|| DEFAULT_DISCUSSIONS_FILE.into());
            match exporter.discussions(&args.repo_name, &output).await? {
                Some(summary) => println!(
                    "CSV file '{}' created successfully with discussion data from {}!",
                    summary.path.display(),
                    summary.repo
                ),
                None => eprintln!("Error fetching discussions, no file written"),
            }
        },
    }

    Ok(())
}
