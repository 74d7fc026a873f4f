use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::print_test_summary;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Smoke tests for the streaming routes of a running server")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long, default_value = "http://localhost:4000")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Open a short job stream and wait for it to complete
    ConnectionTest,
    /// Create a job over REST and follow its progress stream
    JobProgress,
    /// Check that log stream event ids are sequential
    LogIds,
    /// Check that an open stream shows up in GET /streams
    StreamCount,
    /// Run every scenario
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let base_url = cli.base_url.trim_end_matches('/').to_string();
    let api_client = ApiClient::new(reqwest::Client::new(), base_url.clone());

    println!("{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(&base_url).await?);
        }
        ScenarioChoice::JobProgress => {
            results.push(scenarios::test_job_progress(&base_url, &api_client).await?);
        }
        ScenarioChoice::LogIds => {
            results.push(scenarios::test_log_ids(&base_url).await?);
        }
        ScenarioChoice::StreamCount => {
            results.push(scenarios::test_stream_count(&base_url, &api_client).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(&base_url).await?);
            results.push(scenarios::test_job_progress(&base_url, &api_client).await?);
            results.push(scenarios::test_log_ids(&base_url).await?);
            results.push(scenarios::test_stream_count(&base_url, &api_client).await?);
        }
    }

    // Print summary
    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
