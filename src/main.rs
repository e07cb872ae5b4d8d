mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use vf_av::ToolRegistry;
use vf_core::config::Config;
use vf_core::JobId;

/// Load the config file (or defaults) and overlay the environment.
fn load_config(config_path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(config_path);
    config.apply_env();
    config
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path);

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting vidforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    vf_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidforge=trace,vf_server=trace,vf_pipeline=trace,vf_clients=debug,vf_av=debug,vf_core=debug,tower_http=debug".to_string()
        } else {
            "vidforge=debug,vf_server=debug,vf_pipeline=debug,vf_clients=info,vf_av=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Run { video, job_id } => run_video(&video, job_id, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_video(video: &Path, job_id: Option<String>, config_path: Option<&Path>) -> Result<()> {
    if !video.is_file() {
        anyhow::bail!("Video file does not exist: {}", video.display());
    }

    let config = load_config(config_path);
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let job_id = job_id.map(JobId::from).unwrap_or_default();
    tracing::info!(job_id = %job_id, "Processing video {}", video.display());

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let tools = ToolRegistry::discover(&config.tools);
        let orchestrator = vf_server::build_orchestrator(&config, &tools);
        orchestrator.run(&job_id, video).await
    });
    let result = result.with_context(|| format!("Pipeline failed for job {job_id}"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path);
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Their stages will fall back to placeholders.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upload dir: {}", config.server.upload_dir.display());
            println!("  Data dir: {}", config.server.data_dir.display());
            println!("  Indexing service: {}", config.indexing.base_url);
            println!(
                "  Code generation: {} ({})",
                config.codegen.base_url, config.codegen.model
            );
            println!("  Skip polling: {}", config.pipeline.skip_polling);

            let warnings = config.validate();
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for warning in warnings {
                    println!("  - {warning}");
                }
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
