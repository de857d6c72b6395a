//! bsk - command-line front end for booru-sidebar-kit
//!
//! The sidebar shells out to this binary. Every command writes its result to
//! stdout (plain text for scalars, JSON for records); logs go to stderr.
//!
//! # Input (via stdin)
//! - `rank`: `{"query": "...", "candidates": [...]}`, or one candidate per line
//!   together with `--query`
//! - `normalize`: the raw API response body
//! - `apply`: the JSON patch
//!
//! `download-cmd` only prints the command; the sidebar runs it.

use booru_sidebar_kit::booru::{self, ApiFamily, NormalizeOptions};
use booru_sidebar_kit::config::{default_config_path, load_config, Config};
use booru_sidebar_kit::ranking::{rank_candidates, Confidence, RankedMatch, Scorer};
use booru_sidebar_kit::similarity::{
    compute_score, compute_text_match_score, levenshtein_distance, partial_ratio,
};
use booru_sidebar_kit::{shell, snapshot, strings, KitError};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Output format version
const OUTPUT_VERSION: &str = "1.0";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "bsk", version, about = "Fuzzy tag matching and booru response helpers")]
struct Cli {
    /// Config file (defaults to <config dir>/booru-sidebar-kit/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Edit distance between two strings
    Distance { a: String, b: String },

    /// Composite similarity score between two strings
    Score {
        a: String,
        b: String,
        /// Use the substring-friendly text-match weighting
        #[arg(long)]
        text: bool,
    },

    /// Best match of SHORT against any same-length window of LONG
    Partial { short: String, long: String },

    /// Rank candidates from stdin against a query
    Rank {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_enum)]
        scorer: Option<ScorerArg>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        min_score: Option<f64>,
    },

    /// Normalize a raw API response from stdin
    Normalize {
        /// API family, e.g. danbooru, gelbooru_nsfw, waifu_im
        #[arg(long, required_unless_present = "autocomplete")]
        family: Option<String>,
        /// Input is a tag search rather than a post search
        #[arg(long)]
        tags: bool,
        /// Input is a gelbooru-style autocomplete response; the shape is the
        /// same for every family, so `--family` is not needed
        #[arg(long, conflicts_with_all = ["tags", "family"])]
        autocomplete: bool,
        #[arg(long)]
        sfw_only: bool,
    },

    /// Escape TEXT for HTML or a single-quoted shell string
    Escape {
        text: String,
        #[arg(long, conflicts_with = "shell")]
        html: bool,
        #[arg(long)]
        shell: bool,
    },

    /// Print a shell command that downloads URL into DIR/FILE
    DownloadCmd {
        url: String,
        dir: String,
        file: String,
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Apply a JSON patch from stdin to the object tree in TARGET
    Apply { target: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScorerArg {
    General,
    Text,
}

impl From<ScorerArg> for Scorer {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::General => Scorer::General,
            ScorerArg::Text => Scorer::Text,
        }
    }
}

// ============================================================================
// Input / Output Types
// ============================================================================

/// JSON form of the `rank` input
#[derive(Debug, Deserialize)]
struct RankInput {
    #[serde(default)]
    query: Option<String>,
    candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RankOutput {
    version: String,
    /// RFC 3339 timestamp
    generated: String,
    query: String,
    scorer: Scorer,
    matches: Vec<RankedMatch>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    // Initialize tracing if RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), KitError> {
    match cli.command {
        Command::Distance { a, b } => {
            println!("{}", levenshtein_distance(&a, &b));
        }
        Command::Score { a, b, text } => {
            let score = if text {
                compute_text_match_score(&a, &b)
            } else {
                compute_score(&a, &b)
            };
            println!("{}", score);
        }
        Command::Partial { short, long } => {
            println!("{}", partial_ratio(&short, &long));
        }
        Command::Rank {
            query,
            scorer,
            limit,
            min_score,
        } => {
            let config = resolve_config(cli.config.as_ref())?;
            let mut opts = config.ranking;
            if let Some(s) = scorer {
                opts.scorer = s.into();
            }
            if let Some(l) = limit {
                opts.limit = l;
            }
            if let Some(m) = min_score {
                opts.min_score = m;
            }

            let input = read_stdin()?;
            let (query, candidates) = parse_rank_input(&input, query)?;
            info!(
                "Ranking {} candidates for {:?}",
                candidates.len(),
                query
            );

            let matches = rank_candidates(&query, &candidates, &opts);
            log_matches(&matches);

            let output = RankOutput {
                version: OUTPUT_VERSION.to_string(),
                generated: chrono::Utc::now().to_rfc3339(),
                query,
                scorer: opts.scorer,
                matches,
            };
            println!("{}", serde_json::to_string(&output)?);
        }
        Command::Normalize {
            family,
            tags,
            autocomplete,
            sfw_only,
        } => {
            let body = read_stdin()?;
            debug!("Received {} bytes", body.len());

            if autocomplete {
                let raw: Value = serde_json::from_str(&body)?;
                let records = booru::normalize_autocomplete(&raw);
                info!("Normalized {} autocomplete tags", records.len());
                println!("{}", serde_json::to_string(&records)?);
                return Ok(());
            }

            let family: ApiFamily = family.unwrap_or_default().parse()?;
            if tags {
                let raw: Value = serde_json::from_str(&body)?;
                let records = booru::normalize_tags(family, &raw)?;
                info!("Normalized {} {} tags", records.len(), family);
                println!("{}", serde_json::to_string(&records)?);
            } else {
                let config = resolve_config(cli.config.as_ref())?;
                let opts = NormalizeOptions {
                    sfw_only: sfw_only || config.sfw_only,
                };
                let records = booru::normalize_posts_text(family, &body, &opts)?;
                info!("Normalized {} {} posts", records.len(), family);
                println!("{}", serde_json::to_string(&records)?);
            }
        }
        Command::Escape { text, html, shell } => {
            let escaped = if shell {
                strings::shell_single_quote_escape(&text)
            } else {
                if !html {
                    debug!("No escape mode given, defaulting to --html");
                }
                strings::escape_html(&text)
            };
            println!("{}", escaped);
        }
        Command::DownloadCmd {
            url,
            dir,
            file,
            user_agent,
        } => {
            let config = resolve_config(cli.config.as_ref())?;
            let ua = user_agent.unwrap_or(config.user_agent);
            println!("{}", shell::build_download_command(&url, &dir, &file, Some(&ua)));
        }
        Command::Apply { target } => {
            let content = fs::read_to_string(&target).map_err(|e| KitError::FileRead {
                path: target.clone(),
                source: e,
            })?;
            let mut tree: Value = serde_json::from_str(&content)?;
            let patch: Value = serde_json::from_str(&read_stdin()?)?;

            snapshot::apply_to_object(&mut tree, &patch);
            println!("{}", serde_json::to_string(&snapshot::to_plain_object(&tree))?);
        }
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn read_stdin() -> Result<String, KitError> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

/// Config from `--config`, else the default location, else defaults
fn resolve_config(explicit: Option<&PathBuf>) -> Result<Config, KitError> {
    let path = match explicit {
        Some(p) => p.clone(),
        None => match default_config_path() {
            Ok(p) => p,
            Err(KitError::NoConfigDir) => {
                warn!("No config directory on this platform, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e),
        },
    };
    debug!("Loading config from: {:?}", path);
    load_config(&path)
}

/// Accept either the JSON envelope or newline-separated candidates
fn parse_rank_input(
    input: &str,
    query_arg: Option<String>,
) -> Result<(String, Vec<String>), KitError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        let parsed: RankInput = serde_json::from_str(trimmed)?;
        let query = query_arg.or(parsed.query).unwrap_or_default();
        return Ok((query, parsed.candidates));
    }

    let candidates = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    Ok((query_arg.unwrap_or_default(), candidates))
}

/// Log ranked matches to stderr for debugging
fn log_matches(matches: &[RankedMatch]) {
    for m in matches {
        let conf = match m.confidence {
            Confidence::High => m.confidence.as_str().green(),
            Confidence::Medium => m.confidence.as_str().yellow(),
            Confidence::Low => m.confidence.as_str().red(),
        };
        info!(
            "{} (score: {:.3}, confidence: {})",
            m.candidate.bold(),
            m.score,
            conf
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_input_json() {
        let (q, c) =
            parse_rank_input(r#"{"query": "cat", "candidates": ["cat_ears", "dog"]}"#, None).unwrap();
        assert_eq!(q, "cat");
        assert_eq!(c, vec!["cat_ears", "dog"]);
    }

    #[test]
    fn test_parse_rank_input_flag_overrides_json_query() {
        let (q, _) =
            parse_rank_input(r#"{"query": "cat", "candidates": []}"#, Some("dog".into())).unwrap();
        assert_eq!(q, "dog");
    }

    #[test]
    fn test_parse_rank_input_lines() {
        let (q, c) = parse_rank_input("cat_ears\n\n  long_hair \n", Some("cat".into())).unwrap();
        assert_eq!(q, "cat");
        assert_eq!(c, vec!["cat_ears", "long_hair"]);
    }

    #[test]
    fn test_parse_rank_input_bad_json() {
        assert!(matches!(
            parse_rank_input("{ nope", None),
            Err(KitError::InputParse(_))
        ));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["bsk", "score", "cat", "category", "--text"]);
        assert!(matches!(cli.command, Command::Score { text: true, .. }));

        let cli = Cli::parse_from(["bsk", "rank", "--scorer", "general", "--limit", "3"]);
        match cli.command {
            Command::Rank { scorer, limit, .. } => {
                assert!(matches!(scorer, Some(ScorerArg::General)));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_autocomplete_needs_no_family() {
        let cli = Cli::parse_from(["bsk", "normalize", "--autocomplete"]);
        assert!(matches!(
            cli.command,
            Command::Normalize { family: None, autocomplete: true, .. }
        ));

        assert!(Cli::try_parse_from(["bsk", "normalize"]).is_err());
        assert!(Cli::try_parse_from(["bsk", "normalize", "--autocomplete", "--family", "danbooru"]).is_err());

        let cli = Cli::parse_from(["bsk", "normalize", "--family", "danbooru", "--tags"]);
        assert!(matches!(
            cli.command,
            Command::Normalize { family: Some(_), tags: true, autocomplete: false, .. }
        ));
    }
}
