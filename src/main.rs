use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use procurement_crew::logging::{init_logging, LoggingOptions};
use procurement_crew::{Config, PipelineDeps, ProcurementPipeline};

#[derive(Parser, Debug)]
#[command(
    name = "procure",
    version,
    about = "Search, scrape and write a procurement comparison report"
)]
struct Cli {
    /// Config file (defaults to ./procurement.toml when present).
    #[arg(long, global = true, env = "PROCURE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and print the revised report.
    Run(RunArgs),
    /// Print the stage order and context edges without calling any service.
    Plan,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Product to procure.
    #[arg(long)]
    product: Option<String>,

    /// Candidate store; repeat for several.
    #[arg(long = "website")]
    websites: Vec<String>,

    /// Region the stores must sell in.
    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    max_queries: Option<usize>,

    /// Minimum search confidence score.
    #[arg(long)]
    score_threshold: Option<f64>,

    /// Minimum customer rating.
    #[arg(long)]
    rating_threshold: Option<f64>,

    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        let run = &mut config.run;
        if let Some(product) = self.product {
            run.product_name = product;
        }
        if !self.websites.is_empty() {
            run.websites = self.websites;
        }
        if let Some(country) = self.country {
            run.country = country;
        }
        if let Some(max) = self.max_queries {
            run.max_queries = max;
        }
        if let Some(score) = self.score_threshold {
            run.score_threshold = score;
        }
        if let Some(rating) = self.rating_threshold {
            run.rating_threshold = rating;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
    }
}

fn pipeline_deps(config: &Config) -> Result<PipelineDeps> {
    let backend = config
        .llm_backend()
        .context("failed to configure the LLM provider")?;
    let (fast, strong) = config.llm_handles(backend);
    let http = config.http_client();

    let mut deps = PipelineDeps::new(fast, strong, &config.output_dir);
    deps.max_iterations = config.llm.max_iterations;
    deps.search = config.search_provider(&http);
    deps.scrape = config.scrape_provider(&http);
    Ok(deps)
}

async fn run(config: Config) -> Result<()> {
    let mut pipeline = ProcurementPipeline::assemble(pipeline_deps(&config)?)?;
    if let Some(observer) = config.observer() {
        pipeline = pipeline.with_observer(observer);
    }

    let output = pipeline
        .run(vec![config.knowledge_source()], &config.run)
        .await
        .context("procurement run failed")?;

    println!("=== RESULTS ===");
    println!("{}", output.raw);
    Ok(())
}

fn plan(config: Config) -> Result<()> {
    // Placeholder handles: planning never talks to a provider.
    let backend = std::sync::Arc::new(procurement_crew::Client::new());
    let (fast, strong) = config.llm_handles(backend);
    let deps = PipelineDeps::new(fast, strong, &config.output_dir);
    let pipeline = ProcurementPipeline::assemble(deps)?;
    print!("{}", pipeline.plan()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("warning: failed to read .env: {err}");
        }
    }
    init_logging(LoggingOptions::default())?;

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            run(config).await
        }
        Command::Plan => plan(config),
    }
}
