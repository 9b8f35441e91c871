//! Archiver CLI.
//!
//! Subcommands map one-to-one onto the download, listing, export and
//! conversion actions; configuration comes from a JSON file edited by
//! hand (see `config-init`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use leetcode_scraper::error::{AppError, Result};
use leetcode_scraper::models::{Category, Config, Problem};
use leetcode_scraper::pipeline::{
    CardAssembler, CompanyAssembler, PdfConverter, ProblemAssembler, RunSummary,
    SubmissionExporter, cards, companies, problem,
};
use leetcode_scraper::services::{
    Api, CachedClient, RequestClient, SolutionGenerator, YtDlpDownloader, ai,
};
use leetcode_scraper::storage::DiskCache;

#[derive(Parser, Debug)]
#[command(
    name = "leetcode-scraper",
    version,
    about = "Offline archiver for problems, explore cards and company question sets"
)]
struct Cli {
    /// Path to the configuration file (default: ~/.leetcode-scraper/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Keep going when a single item fails instead of stopping the run
    #[arg(long)]
    non_stop: bool,

    /// Route requests through a proxy (user:pass@host:port)
    #[arg(long)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration template to edit by hand
    ConfigInit {
        /// Replace an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// List every explore card URL into cards.csv
    CardUrls,

    /// Download explore cards
    Cards {
        /// Only this card slug
        slug: Option<String>,
    },

    /// List every problem URL into questions.csv
    QuestionUrls,

    /// Download every problem in the catalog
    Questions,

    /// Download one problem by number
    Question {
        /// Problem number as shown on the site
        id: u32,
    },

    /// Write the company index and company.csv
    CompanyIndex,

    /// Download company question sets
    Companies {
        /// Only this company slug
        slug: Option<String>,
    },

    /// Export accepted submissions for every attempted question
    Submissions,

    /// Convert assembled problems into PDF documents
    Convert,

    /// Report which problems of an id range are archived
    Report {
        /// First problem number of the range
        from: u32,
        /// Last problem number, inclusive
        to: u32,
    },

    /// Inspect or empty the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    /// Entry counts and expiry state
    Stats,
    /// Drop every cached response
    Clear,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(proxy) = cli.proxy.as_deref() {
        let value = proxy_env_value(proxy);
        // no runtime threads yet; spawned tools inherit these
        unsafe {
            std::env::set_var("HTTP_PROXY", &value);
            std::env::set_var("HTTPS_PROXY", &value);
        }
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.command {
        // works even when the current file does not parse
        Command::ConfigInit { force } => config_init(&config_path, force),
        Command::Cache { action } => {
            let config = Config::load_or_default(&config_path);
            cache_command(&config, action).await
        }
        command => {
            let config = Config::load_or_default(&config_path);
            let app = App::build(config, cli.proxy.as_deref())?;
            app.execute(command, cli.non_stop).await
        }
    }
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        log::warn!(
            "configuration already exists at {}; use --force to replace it",
            path.display()
        );
        return Ok(());
    }
    Config::default().save(path)?;
    log::info!("wrote configuration template to {}", path.display());
    log::info!("edit it to set leetcode_cookie and save_directory");
    Ok(())
}

async fn cache_command(config: &Config, action: CacheAction) -> Result<()> {
    let cache = DiskCache::new(config.cache_dir());
    match action {
        CacheAction::Stats => {
            let entries = cache.entries().await?;
            let expired = entries.iter().filter(|e| e.is_expired()).count();
            log::info!(
                "{} cache entries ({} expired) under {}",
                entries.len(),
                expired,
                config.cache_dir().display()
            );
        }
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            log::info!("removed {removed} cache entries");
        }
    }
    Ok(())
}

/// Everything the download actions need, built once per invocation.
struct App {
    config: Config,
    api: Api,
    media: YtDlpDownloader,
    generator: Option<Box<dyn SolutionGenerator>>,
}

impl App {
    fn build(config: Config, proxy: Option<&str>) -> Result<Self> {
        config.validate()?;

        let client = Arc::new(RequestClient::new(
            &config.leetcode_cookie,
            config.api_max_failures,
            proxy,
        )?);
        let cache = config
            .cache_api_calls
            .then(|| DiskCache::new(config.cache_dir()));
        let api = Api::new(CachedClient::new(
            client,
            cache,
            config.cache_expiration_days,
        ));
        let generator = ai::from_config(&config);

        Ok(Self {
            config,
            api,
            media: YtDlpDownloader::new(),
            generator,
        })
    }

    fn problems(&self) -> ProblemAssembler<'_> {
        ProblemAssembler::new(
            &self.api,
            &self.config,
            &self.media,
            self.generator.as_deref(),
        )
    }

    fn cards(&self) -> CardAssembler<'_> {
        CardAssembler::new(
            &self.api,
            &self.config,
            &self.media,
            self.generator.as_deref(),
        )
    }

    fn companies(&self) -> CompanyAssembler<'_> {
        CompanyAssembler::new(
            &self.api,
            &self.config,
            &self.media,
            self.generator.as_deref(),
        )
    }

    async fn card_catalog(&self) -> Result<Vec<Category>> {
        self.api
            .categories()
            .await?
            .ok_or_else(|| AppError::decode("card catalog returned no data"))
    }

    async fn all_problems(&self) -> Result<Vec<Problem>> {
        self.api
            .get_all_questions()
            .await?
            .ok_or_else(|| AppError::decode("question catalog returned no data"))
    }

    async fn execute(&self, command: Command, non_stop: bool) -> Result<()> {
        match command {
            Command::CardUrls => {
                let categories = self.card_catalog().await?;
                let path = self.config.save_directory.join("cards.csv");
                cards::write_url_list(&categories, &path).await?;
                log::info!("wrote {}", path.display());
                Ok(())
            }

            Command::Cards { slug } => {
                let summary = self
                    .cards()
                    .run(slug.as_deref(), &self.config.cards_dir(), non_stop)
                    .await?;
                log_summary("cards", &summary);
                Ok(())
            }

            Command::QuestionUrls => {
                let problems = self.all_problems().await?;
                let path = self.config.save_directory.join("questions.csv");
                problem::write_url_list(&problems, &path).await?;
                log::info!("wrote {} with {} problems", path.display(), problems.len());
                Ok(())
            }

            Command::Questions => {
                let problems = self.all_problems().await?;
                let summary = self
                    .problems()
                    .run_all(&problems, &self.config.questions_dir(), non_stop)
                    .await?;
                log_summary("questions", &summary);
                Ok(())
            }

            Command::Question { id } => {
                match self
                    .problems()
                    .run_one(id, &self.config.questions_dir())
                    .await?
                {
                    Some(path) => {
                        log::info!("wrote {}", path.display());
                        Ok(())
                    }
                    None => Err(AppError::decode(format!(
                        "question {id} could not be assembled"
                    ))),
                }
            }

            Command::CompanyIndex => {
                let assembler = self.companies();
                let tags = assembler.catalog().await?;
                assembler
                    .write_index(&tags, &self.config.companies_dir())
                    .await?;
                let path = self.config.save_directory.join("company.csv");
                companies::write_url_list(&tags, &path).await?;
                log::info!("wrote {}", path.display());
                Ok(())
            }

            Command::Companies { slug } => {
                let summary = self
                    .companies()
                    .run(slug.as_deref(), &self.config.companies_dir(), non_stop)
                    .await?;
                log_summary("companies", &summary);
                Ok(())
            }

            Command::Submissions => {
                if self.config.cookie().is_none() {
                    log::warn!("no session cookie configured; submission queries need one");
                }
                let exporter = SubmissionExporter::new(&self.api, &self.config);
                let exported = exporter.export_all().await?;
                log::info!("exported submissions for {exported} questions");
                Ok(())
            }

            Command::Convert => {
                let summary = PdfConverter::new(&self.config)
                    .convert_all(&self.config.questions_dir(), &self.config.pdf_dir())
                    .await?;
                log_summary("convert", &summary);
                Ok(())
            }

            Command::Report { from, to } => {
                let report =
                    problem::report_range(&self.api, &self.config.questions_dir(), from, to)
                        .await?;
                println!(
                    "downloaded ({}): {}",
                    report.downloaded.len(),
                    problem::condense(&report.downloaded)
                );
                println!(
                    "missing ({}): {}",
                    report.missing.len(),
                    problem::condense(&report.missing)
                );
                println!(
                    "not in catalog ({}): {}",
                    report.unknown.len(),
                    problem::condense(&report.unknown)
                );
                Ok(())
            }

            // handled before the network stack is built
            Command::ConfigInit { .. } | Command::Cache { .. } => Ok(()),
        }
    }
}

fn log_summary(action: &str, summary: &RunSummary) {
    log::info!(
        "{action}: {} written, {} skipped, {} failed",
        summary.written,
        summary.skipped,
        summary.failed
    );
}

fn proxy_env_value(spec: &str) -> String {
    if spec.contains("://") {
        spec.to_string()
    } else {
        format!("http://{spec}")
    }
}
