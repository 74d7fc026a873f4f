use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::TestResult;
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A one-step job stream opens and delivers its `complete` event.
pub async fn test_connection(base_url: &str) -> Result<TestResult> {
    let name = "connection";
    let started = Instant::now();
    println!("{} Running {} scenario", "→".blue(), name);

    let mut sse = Connection::establish(
        base_url,
        "/jobs/stream?name=ping&steps=1&interval_ms=10",
        "job stream".to_string(),
    )
    .await?;

    let result = match sse.wait_for_event("complete", EVENT_TIMEOUT).await {
        Ok(event) if event.data["name"] == "ping" => TestResult::pass(name, started.elapsed()),
        Ok(event) => TestResult::fail(
            name,
            format!("unexpected completion payload: {}", event.data),
            started.elapsed(),
        ),
        Err(e) => TestResult::fail(name, e.to_string(), started.elapsed()),
    };

    sse.close();
    Ok(result)
}

/// A job created over REST streams one progress event per step up to 100%.
pub async fn test_job_progress(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let name = "job-progress";
    let started = Instant::now();
    println!("{} Running {} scenario", "→".blue(), name);

    let job = api_client.create_job("smoke", 3).await?;
    println!(
        "{} Job {} created, streaming from {}",
        "✓".green(),
        job.name,
        job.stream_url
    );

    let url = format!("{}&interval_ms=10", job.stream_url);
    let mut sse = Connection::establish(base_url, &url, "job stream".to_string()).await?;
    let events = match sse.collect_until("complete", EVENT_TIMEOUT).await {
        Ok(events) => events,
        Err(e) => return Ok(TestResult::fail(name, e.to_string(), started.elapsed())),
    };
    sse.close();

    let percentages: Vec<f64> = events
        .iter()
        .filter(|event| event.event_type == "progress")
        .filter_map(|event| event.data["percentage"].as_f64())
        .collect();

    let result = if percentages.len() as u64 != job.steps {
        TestResult::fail(
            name,
            format!(
                "expected {} progress events, got {}",
                job.steps,
                percentages.len()
            ),
            started.elapsed(),
        )
    } else if percentages.last() != Some(&100.0) {
        TestResult::fail(
            name,
            format!("progress ended at {:?}", percentages.last()),
            started.elapsed(),
        )
    } else {
        TestResult::pass(name, started.elapsed())
    };

    Ok(result)
}

/// The log stream numbers its events 1, 2, 3, ... in delivery order.
pub async fn test_log_ids(base_url: &str) -> Result<TestResult> {
    let name = "log-ids";
    let started = Instant::now();
    println!("{} Running {} scenario", "→".blue(), name);

    let mut sse = Connection::establish(
        base_url,
        "/logs/stream?interval_ms=10",
        "log stream".to_string(),
    )
    .await?;
    let events = match sse.collect_until("complete", EVENT_TIMEOUT).await {
        Ok(events) => events,
        Err(e) => return Ok(TestResult::fail(name, e.to_string(), started.elapsed())),
    };
    sse.close();

    let out_of_order = events
        .iter()
        .enumerate()
        .find(|(index, event)| event.id.as_deref() != Some((index + 1).to_string().as_str()));

    let result = match out_of_order {
        Some((index, event)) => TestResult::fail(
            name,
            format!("event {} carried id {:?}", index + 1, event.id),
            started.elapsed(),
        ),
        None => TestResult::pass(name, started.elapsed()),
    };

    Ok(result)
}

/// `GET /streams` counts an open job stream while it runs.
pub async fn test_stream_count(base_url: &str, api_client: &ApiClient) -> Result<TestResult> {
    let name = "stream-count";
    let started = Instant::now();
    println!("{} Running {} scenario", "→".blue(), name);

    let mut sse = Connection::establish(
        base_url,
        "/jobs/stream?name=slow&steps=50&interval_ms=200",
        "slow job stream".to_string(),
    )
    .await?;

    // The connection is registered by the time its first event arrives.
    if let Err(e) = sse.wait_for_event("progress", EVENT_TIMEOUT).await {
        return Ok(TestResult::fail(name, e.to_string(), started.elapsed()));
    }

    let open = api_client.open_streams("/jobs/stream").await?;
    sse.close();

    let result = if open >= 1 {
        TestResult::pass(name, started.elapsed())
    } else {
        TestResult::fail(
            name,
            "no open connection reported for /jobs/stream",
            started.elapsed(),
        )
    };

    Ok(result)
}
