// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the shared requester from the persistent flags
// 3. Dispatch to the endpoint or page handler
// 4. Print the report and exit with the proper code:
//    0 = request(s) completed, 1 = base request failed, 2 = internal error
//
// Resource-level failures are reported but never change the exit code; only
// the base request decides success or failure of the probe.
// =============================================================================

mod cli;
mod probe;
mod tls;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use reqwest::header::HeaderMap;
use url::Url;

use cli::{Cli, Commands};
use probe::{
    probe_page, HttpRequester, PageReport, ProbeRequest, Requester, RequesterSettings,
};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // An unexpected internal error - anything that is not a plain
            // probe outcome - lands here.
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // One requester for the whole run: both clients are built once from the
    // flags and shared read-only across every concurrent dispatch.
    let settings = RequesterSettings {
        insecure: cli.insecure,
        timeout: Duration::from_secs(cli.timeout),
    };
    let requester: Arc<dyn Requester> = Arc::new(HttpRequester::new(settings)?);

    match &cli.command {
        Commands::Endpoint { url } => handle_endpoint(url, requester, &cli).await,
        Commands::Page {
            url,
            show_resources_requested,
        } => handle_page(url, requester, &cli, *show_resources_requested).await,
    }
}

// Handles the 'endpoint' subcommand: one timed request, no body inspection
async fn handle_endpoint(url: &str, requester: Arc<dyn Requester>, cli: &Cli) -> Result<i32> {
    let request = ProbeRequest::get(url, requester);
    let exchange = request.exec_capture().await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&exchange.result)?);
    } else {
        println!("{}", exchange.result.summary());
    }

    if !exchange.result.is_success() {
        return Ok(1);
    }

    if cli.show_headers && !cli.json {
        if let Some(headers) = &exchange.headers {
            print_headers(headers);
        }
    }

    if cli.analyze_tls && !cli.json {
        analyze_tls(url, cli).await;
    }

    Ok(0)
}

// Handles the 'page' subcommand: base request plus concurrent resource probes
async fn handle_page(
    url: &str,
    requester: Arc<dyn Requester>,
    cli: &Cli,
    show_resources: bool,
) -> Result<i32> {
    if !cli.json {
        println!("initially requesting: {}", url);
    }

    let report = match probe_page(url, requester).await {
        Ok(report) => report,
        Err(e) => {
            // Base request failed: nothing was dispatched, surface and exit
            // non-zero.
            eprintln!("Error: {:#}", e);
            return Ok(1);
        }
    };

    if cli.json {
        print_page_json(&report)?;
        return Ok(0);
    }

    print_page_report(&report);

    if cli.show_headers {
        if let Some(headers) = &report.headers {
            print_headers(headers);
        }
    }

    if cli.analyze_tls {
        analyze_tls(&report.base.url, cli).await;
    }

    if show_resources {
        print_resource_lines(&report);
    }

    Ok(0)
}

// Prints the human-readable page summary
fn print_page_report(report: &PageReport) {
    println!("{}", report.base.summary());
    println!("resolving resources...");
    println!(
        "    finished requesting {} resource(s): {} succeeded, {} errored",
        report.resources.total(),
        report.resources.succeeded().len(),
        report.resources.errored().len(),
    );

    match report.longest_successful() {
        Some(longest) => println!(
            "    longest associated resource request: {}ms ({})",
            longest.timing.as_millis(),
            longest.url,
        ),
        None => println!("    no successful resource requests"),
    }

    println!(
        "total request estimated at {}ms",
        report.total_estimate().as_millis()
    );
}

// Prints every resource outcome, successes first, then errors
fn print_resource_lines(report: &PageReport) {
    println!();
    println!("resources parsed from initial request body:");
    for result in report
        .resources
        .succeeded()
        .iter()
        .chain(report.resources.errored())
    {
        println!("    {}", result.summary());
    }
    println!();
}

// Serializes the full page report for --json output
fn print_page_json(report: &PageReport) -> Result<()> {
    let payload = serde_json::json!({
        "base": report.base,
        "resources": {
            "dispatched": report.resources.dispatched(),
            "succeeded": report.resources.succeeded(),
            "errored": report.resources.errored(),
        },
        "longest_successful": report.longest_successful(),
        "total_estimate_ms": report.total_estimate().as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

// Dumps response headers, one per line
fn print_headers(headers: &HeaderMap) {
    println!();
    println!("headers");
    println!("-------");
    for (name, value) in headers {
        println!("    {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
}

// Runs the TLS inspection and prints its block
//
// The probe already succeeded at this point, so an inspection failure is
// reported but does not change the exit code.
async fn analyze_tls(url: &str, cli: &Cli) {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("TLS analysis skipped, invalid URL '{}': {}", url, e);
            return;
        }
    };

    match tls::inspect(&parsed, Duration::from_secs(cli.timeout)).await {
        Ok(report) => {
            println!();
            print!("{}", report.render());
        }
        Err(e) => eprintln!("TLS analysis failed: {:#}", e),
    }
}
