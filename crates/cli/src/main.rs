use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use movie_types::Movie;
use server::config::{DEFAULT_LISTEN_ADDR, DEFAULT_MOVIE_INFO_URL, DEFAULT_REVIEWS_URL};
use server::{MovieAggregator, MovieServer, ServiceConfig};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

/// Movies - composes movie info and reviews into one view
#[derive(Parser)]
#[command(name = "movies")]
#[command(about = "Movie aggregation service over the movie-info and reviews providers", long_about = None)]
struct Cli {
    #[command(flatten)]
    providers: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Downstream providers and retry settings, shared by every command
#[derive(Args)]
struct ProviderArgs {
    /// Base URL of the movie-info provider
    #[arg(long, env = "MOVIES_MOVIE_INFO_URL", default_value = DEFAULT_MOVIE_INFO_URL)]
    movie_info_url: Url,

    /// Base URL of the reviews provider
    #[arg(long, env = "MOVIES_REVIEWS_URL", default_value = DEFAULT_REVIEWS_URL)]
    reviews_url: Url,

    /// Total attempts per downstream call, initial call included
    #[arg(long, env = "MOVIES_RETRY_ATTEMPTS", default_value = "4")]
    retry_attempts: u32,

    /// Backoff before the first retry, in milliseconds (doubles per retry)
    #[arg(long, env = "MOVIES_BACKOFF_MS", default_value = "100")]
    backoff_ms: u64,

    /// Upper bound on a single backoff, in milliseconds
    #[arg(long, env = "MOVIES_BACKOFF_MAX_MS", default_value = "2000")]
    backoff_max_ms: u64,

    /// Timeout for a single downstream attempt, in milliseconds
    #[arg(long, env = "MOVIES_CALL_TIMEOUT_MS", default_value = "5000")]
    call_timeout_ms: u64,
}

impl ProviderArgs {
    fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(self.movie_info_url.clone(), self.reviews_url.clone());
        config.retry_attempts = self.retry_attempts;
        config.backoff_base = Duration::from_millis(self.backoff_ms);
        config.backoff_max = Duration::from_millis(self.backoff_max_ms);
        config.call_timeout = Duration::from_millis(self.call_timeout_ms);
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /v1/movies/:id over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "MOVIES_LISTEN_ADDR", default_value_t = DEFAULT_LISTEN_ADDR)]
        listen: SocketAddr,

        /// Overall request timeout, in seconds
        #[arg(long, env = "MOVIES_REQUEST_TIMEOUT_SECS", default_value = "30")]
        request_timeout_secs: u64,
    },

    /// Compose and print a single movie
    Movie {
        /// Movie info id
        #[arg(long)]
        id: String,

        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Fire concurrent requests for one movie and report latencies
    Benchmark {
        /// Movie info id to request
        #[arg(long)]
        id: String,

        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = cli.providers.service_config();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Serve {
            listen,
            request_timeout_secs,
        } => {
            config.listen_addr = listen;
            config.request_timeout = Duration::from_secs(request_timeout_secs);
            handle_serve(config).await?
        }
        Commands::Movie { id, json } => handle_movie(config, id, json).await?,
        Commands::Benchmark { id, requests } => handle_benchmark(config, id, requests).await?,
    }

    Ok(())
}

/// Handle the 'serve' command
async fn handle_serve(config: ServiceConfig) -> Result<()> {
    let aggregator = MovieAggregator::from_config(&config)?;
    let handle = MovieServer::new(aggregator)
        .timeout(config.request_timeout)
        .start(config.listen_addr)
        .await
        .context("Failed to start movie server")?;

    println!(
        "{} Serving GET /v1/movies/:id on http://{}",
        "✓".green(),
        handle.addr()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("Shutting down");
    handle.stop();
    handle.stopped().await;
    Ok(())
}

/// Handle the 'movie' command
async fn handle_movie(config: ServiceConfig, id: String, json: bool) -> Result<()> {
    let aggregator = MovieAggregator::from_config(&config)?;

    let start = Instant::now();
    let movie = aggregator
        .get_movie(&id)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e.message(), e.status_code()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&movie).context("Failed to encode movie")?
        );
    } else {
        print_movie(&movie);
        println!("{}", format!("Composed in {:.2?}", start.elapsed()).dimmed());
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(config: ServiceConfig, id: String, requests: usize) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let aggregator = MovieAggregator::from_config(&config)?;

    // Use tokio::spawn to make concurrent requests
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for _ in 0..requests {
        let aggregator = aggregator.clone();
        let id = id.clone();
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let ok = aggregator.get_movie(&id).await.is_ok();
            (start.elapsed(), ok)
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    let mut failures = 0;
    for handle in handles {
        let (elapsed, ok) = handle.await.context("Benchmark task panicked")?;
        if !ok {
            failures += 1;
        }
        timings.push(elapsed);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let sum: Duration = timings.iter().sum();
    let avg_latency = sum / (timings.len() as u32);
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} failed)", requests, failures);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Value at quantile `q` of an ascending, non-empty slice.
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    let index = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Helper function to format and print a movie
fn print_movie(movie: &Movie) {
    let info = &movie.movie_info;
    println!(
        "{} ({})",
        info.name.bold().blue(),
        info.year.to_string().green()
    );
    println!("{}Released: {}", "• ".green(), info.release_date);
    println!("{}Cast: {}", "• ".green(), info.cast.join(", "));

    match movie.average_rating() {
        Some(avg) => println!(
            "{}Reviews: {} (average {:.1})",
            "• ".cyan(),
            movie.review_list.len(),
            avg
        ),
        None => println!("{}Reviews: none", "• ".cyan()),
    }
    for review in &movie.review_list {
        println!("  - [{:.1}] {}", review.rating, review.comment);
    }
}
