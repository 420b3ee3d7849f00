//! contentctl - analyse, validate, transform, publish and schedule content.

mod input;
mod output;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use content::ContentService;
use platforms::credentials;
use platforms::{
    AdapterFactory, ContentTester, Platform, PlatformRegistry, PlatformsConfig, PublishStatus,
    PublishingPipeline, TransformOptions,
};
use scheduler::{
    ContentScheduler, PipelinePublisher, Priority, ScheduleOptions, ScheduleStatus,
    SchedulerConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Publish one article to WordPress, Webflow and social networks.
#[derive(Parser, Debug)]
#[command(name = "contentctl")]
#[command(about = "Universal content publishing tool")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON logs and JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Platform settings (TOML); defaults to environment variables
    #[arg(long, global = true, env = "CONTENTCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// SEO, readability and structure metrics
    Analyze {
        /// Markdown or blog post JSON file
        file: PathBuf,
    },

    /// Validate content, optionally against target platforms
    Validate {
        file: PathBuf,

        /// Platforms to test compatibility with
        #[arg(long, value_delimiter = ',', value_parser = parse_platform)]
        platforms: Vec<Platform>,
    },

    /// Show the platform-native form of an article
    Transform {
        file: PathBuf,

        #[arg(long, value_parser = parse_platform)]
        platform: Platform,

        /// draft, publish, private or scheduled
        #[arg(long, default_value = "draft", value_parser = parse_status)]
        status: PublishStatus,
    },

    /// Publish now to one or more platforms
    Publish {
        file: PathBuf,

        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_platform)]
        platforms: Vec<Platform>,

        #[arg(long, default_value = "publish", value_parser = parse_status)]
        status: PublishStatus,

        /// Public URL linked from social posts
        #[arg(long)]
        canonical_url: Option<String>,
    },

    /// Queue an article and wait until it has been published
    Schedule {
        file: PathBuf,

        #[arg(long, required = true, value_delimiter = ',', value_parser = parse_platform)]
        platforms: Vec<Platform>,

        /// Publish time (RFC 3339); defaults to now
        #[arg(long, conflicts_with = "auto")]
        at: Option<DateTime<Utc>>,

        /// Pick the next preferred posting hour
        #[arg(long)]
        auto: bool,

        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,

        /// Check platform compatibility before publishing
        #[arg(long)]
        test: bool,
    },

    /// Encrypt a secret with CMS_ENCRYPTION_KEY for use in config files
    EncryptCredential {
        value: String,
    },

    /// List platforms, their capabilities and whether they are configured
    Platforms,
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse()
}

fn parse_status(s: &str) -> Result<PublishStatus, String> {
    match s.to_ascii_lowercase().as_str() {
        "draft" => Ok(PublishStatus::Draft),
        "publish" => Ok(PublishStatus::Publish),
        "private" => Ok(PublishStatus::Private),
        "scheduled" => Ok(PublishStatus::Scheduled),
        other => Err(format!("unknown status: {other}")),
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let service = ContentService::default();
    match cli.command {
        Commands::Analyze { file } => {
            let content = input::load_content(&file, &service)?;
            let analysis = service.analyze(&content);
            if cli.json {
                output::print_json(&analysis)
            } else {
                output::render_analysis(&content.title, &analysis);
                Ok(())
            }
        }
        Commands::Validate { file, platforms } => {
            let content = input::load_content(&file, &service)?;
            let validation = service.validate(&content);
            let report = (!platforms.is_empty())
                .then(|| ContentTester::new().test_compatibility(&content, &platforms));
            if cli.json {
                output::print_json(&serde_json::json!({
                    "validation": validation,
                    "compatibility": report,
                }))?;
            } else {
                output::render_validation(&validation, report.as_ref());
            }
            if validation.is_valid && report.as_ref().is_none_or(|r| r.compatible) {
                Ok(())
            } else {
                bail!("Validation failed")
            }
        }
        Commands::Transform {
            file,
            platform,
            status,
        } => {
            let content = input::load_content(&file, &service)?;
            let registry = load_registry(cli.config.as_deref())?;
            let adapter = registry
                .get(platform)
                .ok_or_else(|| anyhow!("{platform} is not configured"))?;
            let options = TransformOptions {
                status,
                ..Default::default()
            };
            let result = adapter.transform(&content, &options);
            output::print_json(&result)?;
            if result.success {
                Ok(())
            } else {
                bail!("Transformation for {platform} failed")
            }
        }
        Commands::Publish {
            file,
            platforms,
            status,
            canonical_url,
        } => {
            let content = input::load_content(&file, &service)?;
            let pipeline = PublishingPipeline::new(load_registry(cli.config.as_deref())?);
            let options = TransformOptions {
                status,
                canonical_url,
                ..Default::default()
            };
            tracing::info!(title = %content.title, ?platforms, "Publishing content");
            let results = pipeline.publish_all(&content, &platforms, &options).await;
            if cli.json {
                output::print_json(&results)?;
            } else {
                output::render_results(&results);
            }
            let failed = results.iter().filter(|r| !r.success).count();
            if failed == 0 {
                Ok(())
            } else {
                bail!("{failed} of {} platforms failed", results.len())
            }
        }
        Commands::Schedule {
            file,
            platforms,
            at,
            auto,
            priority,
            test,
        } => {
            let content = input::load_content(&file, &service)?;
            let options = ScheduleOptions {
                priority,
                scheduled_time: at,
                auto_schedule: auto,
            };
            run_schedule(cli.config.as_deref(), content, platforms, options, test, cli.json).await
        }
        Commands::EncryptCredential { value } => {
            let key = credentials::key_from_env().context("Cannot encrypt credential")?;
            println!("{}", credentials::encrypt(&value, &key));
            Ok(())
        }
        Commands::Platforms => {
            let config = load_config(cli.config.as_deref())?;
            let rows: Vec<_> = Platform::ALL
                .iter()
                .map(|p| (*p, config.is_configured(*p), p.capabilities()))
                .collect();
            if cli.json {
                let listing: Vec<_> = rows
                    .iter()
                    .map(|(platform, configured, caps)| {
                        serde_json::json!({
                            "platform": platform,
                            "configured": configured,
                            "capabilities": caps,
                        })
                    })
                    .collect();
                output::print_json(&listing)
            } else {
                output::render_platforms(&rows);
                Ok(())
            }
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("contentctl=debug,content=debug,platforms=debug,scheduler=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<PlatformsConfig> {
    match path {
        Some(path) => PlatformsConfig::from_file(path)
            .with_context(|| format!("Failed to load platform config from {}", path.display())),
        None => PlatformsConfig::from_env().context("Failed to load platform config from environment"),
    }
}

fn load_registry(path: Option<&Path>) -> Result<PlatformRegistry> {
    let config = load_config(path)?;
    let registry = PlatformRegistry::from_config(&AdapterFactory::with_builtins(), &config)
        .context("Failed to build platform adapters")?;
    tracing::debug!(platforms = ?registry.platforms(), "Adapters ready");
    Ok(registry)
}

async fn run_schedule(
    config_path: Option<&Path>,
    content: content::UniversalContent,
    platforms: Vec<Platform>,
    options: ScheduleOptions,
    auto_test: bool,
    json: bool,
) -> Result<()> {
    let pipeline = PublishingPipeline::new(load_registry(config_path)?);
    let mut config = SchedulerConfig::from_env().context("Invalid scheduler settings")?;
    config.auto_test |= auto_test;
    config.auto_start = true;
    let poll = config.tick_interval.min(Duration::from_secs(5));

    let scheduler = ContentScheduler::new(Arc::new(PipelinePublisher::new(pipeline)), config);
    let id = scheduler.add_to_queue(content, platforms, options).await?;

    if let Some(item) = scheduler.get(&id).await {
        if !json {
            output::render_scheduled(&item);
            println!("Waiting for the scheduler (Ctrl-C to abort)...");
        }
    }

    let item = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                scheduler.stop().await;
                bail!("Interrupted before {id} was published");
            }
            () = tokio::time::sleep(poll) => {}
        }
        let item = scheduler
            .get(&id)
            .await
            .ok_or_else(|| anyhow!("Scheduled item {id} disappeared"))?;
        if item.status.is_finished() {
            break item;
        }
    };
    scheduler.stop().await;

    if json {
        output::print_json(&item)?;
    } else {
        output::render_scheduled(&item);
    }
    if item.status == ScheduleStatus::Failed {
        bail!("Publishing failed after {} attempts", item.attempts);
    }
    Ok(())
}
