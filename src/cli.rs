// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is described with Rust structs
// and attributes, and clap generates the parsing code, --help and --version.
//
// Two subcommands:
// - endpoint: time one request against a specific URL
// - page: request a document and concurrently resolve its embedded resources
//
// The flags marked global = true behave like persistent flags - they can be
// given before or after the subcommand.
// =============================================================================

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rtime",
    version,
    about = "rtime is for request timing and analysis",
    long_about = "Command-line request timer and inspector. Makes request(s) to a page or a \
                  specific resource (endpoint) and reports timing, status, headers and TLS \
                  connection data."
)]
pub struct Cli {
    /// Make insecure request(s); certificate verification is skipped
    ///
    /// Deliberate probing aid for self-signed/staging endpoints - not a
    /// recommendation for production traffic.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Show headers from the final response
    #[arg(long, global = true)]
    pub show_headers: bool,

    /// Show TLS connection information for the requested host
    #[arg(long, global = true)]
    pub analyze_tls: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Output results as JSON instead of the human-readable report
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Request a specific resource
    ///
    /// Attempts to request the specified URL. Does not inspect the
    /// response body.
    Endpoint {
        /// URL to request
        url: String,
    },

    /// Request a page, just as you would in your browser
    ///
    /// Attempts to request the specified URL and resolve any associated
    /// resources - css, images, scripts, etc. Requests for additional
    /// resources are made concurrently.
    Page {
        /// URL to request
        url: String,

        /// Show request outcomes for each associated resource
        #[arg(long)]
        show_resources_requested: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_with_persistent_flags() {
        let cli = Cli::try_parse_from([
            "rtime",
            "endpoint",
            "https://example.com",
            "--insecure",
            "--show-headers",
        ])
        .unwrap();

        assert!(cli.insecure);
        assert!(cli.show_headers);
        assert!(!cli.analyze_tls);
        match cli.command {
            Commands::Endpoint { url } => assert_eq!(url, "https://example.com"),
            other => panic!("expected endpoint subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_with_resource_listing() {
        let cli = Cli::try_parse_from([
            "rtime",
            "page",
            "https://example.com",
            "--show-resources-requested",
        ])
        .unwrap();

        match cli.command {
            Commands::Page {
                url,
                show_resources_requested,
            } => {
                assert_eq!(url, "https://example.com");
                assert!(show_resources_requested);
            }
            other => panic!("expected page subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_accepted_before_subcommand() {
        let cli = Cli::try_parse_from(["rtime", "--timeout", "5", "page", "https://example.com"])
            .unwrap();
        assert_eq!(cli.timeout, 5);
    }

    #[test]
    fn test_show_resources_requested_rejected_for_endpoint() {
        let outcome = Cli::try_parse_from([
            "rtime",
            "endpoint",
            "https://example.com",
            "--show-resources-requested",
        ]);
        assert!(outcome.is_err());
    }

    #[test]
    fn test_url_is_required() {
        assert!(Cli::try_parse_from(["rtime", "endpoint"]).is_err());
    }
}
