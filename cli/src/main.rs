use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use skillscout_core::{Config, RegistrySpec, SearchOptions, UnifiedSearch};

mod output;

#[derive(Parser)]
#[command(name = "skillscout")]
#[command(about = "skillscout - find installed and installable skills", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search local and external skill sources
    Search {
        query: String,
        #[arg(short, long)]
        local_only: bool,
        #[arg(short, long)]
        external_only: bool,
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long)]
        json: bool,
    },
    /// Look up one skill by name
    Get {
        name: String,
        #[arg(short, long)]
        json: bool,
    },
    /// Recommend the best skill for a task description
    Recommend {
        task: String,
        #[arg(short, long)]
        json: bool,
    },
    /// Rebuild the external catalog cache from the configured registries
    Refresh,
    /// List configured skill sources
    Sources {
        #[arg(short, long)]
        json: bool,
    },
    /// List the cached external catalog
    List {
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        json: bool,
    },
    /// Manage external registries
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// Add a GitHub registry (owner/repo) for future refreshes
    Add {
        /// Repository as owner/repo
        repo: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "main")]
        branch: String,
        #[arg(long, default_value_t = 10)]
        priority: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_init()?;
    let mut search = UnifiedSearch::new(config);

    match cli.command {
        Commands::Search {
            query,
            local_only,
            external_only,
            top,
            verbose,
            json,
        } => {
            let options = SearchOptions {
                local_only,
                external_only,
                top_n: top,
            };
            let results = search.search(&query, &options);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                output::print_search(&results, verbose);
            }
        }
        Commands::Get { name, json } => match search.get(&name) {
            Some(hit) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&hit)?);
                } else {
                    output::print_hit(&hit);
                }
            }
            None => {
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "error": "not found", "name": name })
                    );
                } else {
                    println!("{} Skill '{}' not found", style("!").yellow(), name);
                }
            }
        },
        Commands::Recommend { task, json } => match search.recommend(&task) {
            Some(recommendation) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&recommendation)?);
                } else {
                    output::print_recommendation(&recommendation);
                }
            }
            None => {
                if json {
                    println!("{}", serde_json::json!({ "recommended": false, "task": task }));
                } else {
                    println!(
                        "{} No skill matches '{}' with enough confidence",
                        style("!").yellow(),
                        task
                    );
                }
            }
        },
        Commands::Refresh => {
            let count = search.refresh().await?;
            println!(
                "{} Refreshed external catalog: {} skills indexed",
                style("✓").green().bold(),
                count
            );
        }
        Commands::Sources { json } => {
            let sources = search.list_sources();
            if json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
            } else {
                output::print_sources(&sources);
            }
        }
        Commands::List {
            source,
            category,
            json,
        } => {
            let skills = search.list_external(source.as_deref(), category.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&skills)?);
            } else {
                output::print_catalog(&skills);
            }
        }
        Commands::Registry { command } => match command {
            RegistryCommands::Add {
                repo,
                name,
                branch,
                priority,
            } => {
                let (owner, repo) = repo.split_once('/').ok_or_else(|| {
                    anyhow::anyhow!("Expected OWNER/REPO, got '{}'", repo)
                })?;

                let spec = RegistrySpec {
                    name: name.unwrap_or_else(|| repo.to_string()),
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch,
                    priority,
                };
                let url = spec.url();
                search.add_registry(spec)?;
                println!(
                    "{} Registry added: {} (run 'skillscout refresh' to index it)",
                    style("✓").green().bold(),
                    url
                );
            }
        },
    }

    Ok(())
}
