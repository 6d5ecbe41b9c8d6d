use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::metadata::LevelFilter;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter, EnvFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hubtags::config::{self, Config, LogConfig};
use hubtags::{FuzzyFilter, HubSource, RegistryTag, RepositoryRef, TagBrowser};

/// Browse and fuzzy filter the tags of a registry repository.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Repository to list, `repository` or `namespace/repository`.
    repository: String,
    /// Only show tags matching this fuzzy query.
    #[arg(short, long, default_value = "")]
    query: String,
    /// Namespace of the repository, overrides the one in `repository`.
    #[arg(short, long)]
    namespace: Option<String>,
    /// Print the tags as json.
    #[arg(long)]
    json: bool,
    /// Print at most this many tags.
    #[arg(long)]
    limit: Option<usize>,
    /// Path of the config file.
    #[arg(long, env = config::CONFIG_PATH_ENV)]
    config_path: Option<PathBuf>,
}

/// Create directory tree up to the file in `path`.
fn create_path_to(path: &str) -> io::Result<()> {
    let path = PathBuf::from(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

fn init_logging(logc: &LogConfig) -> anyhow::Result<Vec<WorkerGuard>> {
    let mut logging_guards = Vec::new();

    let (stderr_nb, stderr_guard) = tracing_appender::non_blocking(io::stderr());
    logging_guards.push(stderr_guard);

    let file_nb = if logc.file {
        create_path_to(&logc.path)?;

        let log_path = Path::new(&logc.path);
        let dir = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = log_path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "hubtags.log".into());

        // Get a rolling file appender depending on the config
        let file_appender = match logc.roll_period {
            config::RollPeriod::Minutely => tracing_appender::rolling::minutely(dir, &file_name),
            config::RollPeriod::Hourly => tracing_appender::rolling::hourly(dir, &file_name),
            config::RollPeriod::Daily => tracing_appender::rolling::daily(dir, &file_name),
            config::RollPeriod::Never => tracing_appender::rolling::never(dir, &file_name),
        };

        let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
        logging_guards.push(file_guard);
        Some(file_nb)
    } else {
        None
    };

    // Get json or text layers
    let (json_file, json_stderr, plain_file, plain_stderr) = match logc.format {
        config::LogFormat::Json => (
            file_nb.map(|w| tracing_subscriber::fmt::layer().with_writer(w).json()),
            Some(tracing_subscriber::fmt::layer().with_writer(stderr_nb).json()),
            None,
            None,
        ),
        config::LogFormat::Human => (
            None,
            None,
            file_nb.map(|w| tracing_subscriber::fmt::layer().with_writer(w).with_ansi(false)),
            Some(tracing_subscriber::fmt::layer().with_writer(stderr_nb)),
        ),
    };

    // Only log hubtags unless an env filter was given
    let targets_filter = if logc.env_filter.is_some() {
        None
    } else {
        Some(
            filter::Targets::new()
                .with_target("hubtags", logc.level)
                .with_default(LevelFilter::WARN)
        )
    };

    let env_filter = match &logc.env_filter {
        Some(env_filter) => Some(EnvFilter::from_str(env_filter)
            .with_context(|| format!("invalid log env_filter '{}'", env_filter))?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(json_file)
        .with(json_stderr)
        .with(plain_file)
        .with(plain_stderr)
        .with(targets_filter)
        .with(env_filter)
        .init();

    Ok(logging_guards)
}

fn print_table(out: &mut impl Write, tags: &[&RegistryTag]) -> io::Result<()> {
    let name_width = tags.iter().map(|t| t.name().len()).max().unwrap_or(0);
    let arch_width = tags.iter().map(|t| t.architectures().join(", ").len()).max().unwrap_or(0);

    for tag in tags {
        writeln!(
            out,
            "{:name_width$}  {:arch_width$}  {}",
            tag.name(),
            tag.architectures().join(", "),
            tag.last_updated_label(),
        )?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::new(args.config_path.as_deref())
        .context("failed to load config")?;
    let _logging_guards = init_logging(&config.log)?;
    debug!("Loaded config: {:?}", config);

    let mut target = RepositoryRef::parse_with_default(&args.repository, &config.registry.default_namespace)?;
    if let Some(namespace) = &args.namespace {
        target = target.with_namespace(namespace)?;
    }

    let source = HubSource::from_config(&config.registry)
        .context("failed to create http client")?;
    info!("Using registry at {}", source.url());

    let mut browser = TagBrowser::new(Arc::new(source))
        .with_filter(FuzzyFilter::with_min_score(config.filter.min_score));
    browser.select(target);

    let mut failure = None;
    loop {
        match browser.next_page().await {
            Ok(Some(tags)) => debug!("{} tags merged so far", tags.len()),
            Ok(None) => break,
            Err(e) => {
                error!("{}", e);
                failure = Some(e);
                break;
            },
        }
    }

    let mut results = browser.filtered(&args.query);
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &results)?;
        writeln!(out)?;
    } else {
        print_table(&mut out, &results)?;
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
