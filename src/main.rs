//! redis-metrics CLI
//!
//! Command-line interface for recording and reading metrics:
//! - Record metric events and gauges
//! - Read current totals, per metric or per category
//! - Export history as rows or pivoted columns (table, json, csv)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use redis_metrics::config::{generate_default_config, Config, LoggingConfig};
use redis_metrics::{Granularity, MetricCounts, MetricsStore, RedisStore};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "redis-metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-bucketed metric counters and gauges in Redis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record occurrences of a metric
    Record {
        /// Metric slug
        slug: String,
        /// Amount to add
        #[arg(default_value_t = 1, allow_negative_numbers = true)]
        amount: i64,
        /// Category to file the metric under
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// Day to record against, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Overwrite today's totals of a metric
    Set {
        /// Metric slug
        slug: String,
        /// New value for every rollup
        #[arg(allow_negative_numbers = true)]
        value: i64,
        /// Category to file the metric under
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// Set a gauge, or print it when no value is given
    Gauge {
        /// Gauge slug
        slug: String,
        /// New value
        value: Option<String>,
    },

    /// Show current totals of metrics
    Get {
        /// Metric slugs
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Show current totals of every metric in a category
    Category {
        /// Category name
        name: String,
    },

    /// Add a metric to a category
    Categorize {
        /// Metric slug
        slug: String,
        /// Category name
        category: String,
    },

    /// List categories
    Categories,

    /// Show metric history
    History {
        /// Metric slugs (comma-separated or multiple args)
        #[arg(required = true)]
        slugs: Vec<String>,
        /// First day of the window, YYYY-MM-DD (default: one year back)
        #[arg(short, long)]
        since: Option<NaiveDate>,
        /// Granularity (daily, weekly, monthly, yearly)
        #[arg(short, long, default_value = "daily")]
        granularity: String,
        /// Pivot into one column per metric
        #[arg(long)]
        columns: bool,
    },

    /// List metric slugs
    Slugs,

    /// List gauges with their values
    Gauges,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Config { output } => write_default_config(output.as_deref()),
        command => run(command, &config, &cli.format).await,
    }
}

async fn run(command: Commands, config: &Config, format: &str) -> Result<()> {
    let store = RedisStore::connect(&config.store)
        .await
        .with_context(|| format!("connecting to {}", config.store.url()))?;
    let metrics = MetricsStore::new(store, config.registry.clone());

    match command {
        Commands::Record {
            slug,
            amount,
            category,
            date,
        } => {
            let date = date.unwrap_or_else(redis_metrics::dates::today);
            metrics
                .record_metric_on(&slug, amount, date, category.as_deref())
                .await?;
            println!("Recorded {} x{} on {}", slug, amount, date);
        }

        Commands::Set {
            slug,
            value,
            category,
        } => {
            metrics.set_metric(&slug, value, category.as_deref()).await?;
            println!("Set {} to {}", slug, value);
        }

        Commands::Gauge { slug, value } => match value {
            Some(value) => {
                metrics.set_gauge(&slug, &value).await?;
                println!("Set gauge {} to {}", slug, value);
            }
            None => {
                let value = require_gauge(&slug, metrics.get_gauge(&slug).await?)?;
                println!("{}", value);
            }
        },

        Commands::Get { slugs } => {
            let slugs = split_slugs(&slugs);
            let results = metrics.get_metrics(&slugs).await?;
            print_counts(format, &results)?;
        }

        Commands::Category { name } => {
            let results = metrics.get_category_metrics(&name).await?;
            if results.is_empty() && format == "table" {
                println!("No metrics in category {:?}", name);
            } else {
                print_counts(format, &results)?;
            }
        }

        Commands::Categorize { slug, category } => {
            metrics.categorize(&slug, &category).await?;
            println!("Added {} to {:?}", slug, category);
        }

        Commands::Categories => {
            for category in metrics.categories().await? {
                println!("{}", category);
            }
        }

        Commands::History {
            slugs,
            since,
            granularity,
            columns,
        } => {
            let slugs = split_slugs(&slugs);
            let granularity: Granularity = granularity.parse()?;

            let rows = if columns {
                metrics
                    .get_metric_history_as_columns(&slugs, since, granularity)
                    .await?
            } else {
                let mut rows = vec![vec!["Key".to_string(), "Value".to_string()]];
                rows.extend(
                    metrics
                        .get_metric_history(&slugs, since, granularity)
                        .await?
                        .into_iter()
                        .map(|(key, value)| vec![key, value.unwrap_or_default()]),
                );
                rows
            };
            print_rows(format, &rows)?;
        }

        Commands::Slugs => {
            let slugs = metrics.registered_metrics().await?;
            if slugs.is_empty() {
                println!("No metrics recorded yet.");
                println!();
                println!("Record your first metric with:");
                println!("  redis-metrics record signups");
            }
            for slug in slugs {
                println!("{}", slug);
            }
        }

        Commands::Gauges => {
            let mut rows = vec![vec!["Gauge".to_string(), "Value".to_string()]];
            for slug in metrics.registered_gauges().await? {
                let value = metrics.get_gauge(&slug).await?.unwrap_or_default();
                rows.push(vec![slug, value]);
            }
            print_rows(format, &rows)?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("redis_metrics={}", logging.level))
    });

    // stdout carries command output; logs go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&std::path::Path>) -> Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}

fn require_gauge(slug: &str, value: Option<String>) -> Result<String> {
    value.with_context(|| format!("Gauge {} has no value", slug))
}

/// Rule under the table header, spanning the ` | ` column gaps
fn separator(widths: &[usize]) -> String {
    let gaps = 3 * widths.len().saturating_sub(1);
    "-".repeat(widths.iter().sum::<usize>() + gaps)
}

/// Flatten `a,b c` style arguments into slugs
fn split_slugs(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_counts(format: &str, results: &[(String, MetricCounts)]) -> Result<()> {
    if format == "json" {
        let map: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(slug, counts)| Ok((slug.clone(), serde_json::to_value(counts)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    let mut rows = vec![["Metric", "Day", "Week", "Month", "Year"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()];
    for (slug, counts) in results {
        rows.push(vec![
            slug.clone(),
            counts.day.to_string(),
            counts.week.to_string(),
            counts.month.to_string(),
            counts.year.to_string(),
        ]);
    }
    print_rows(format, &rows)
}

/// Print a header row plus data rows
fn print_rows(format: &str, rows: &[Vec<String>]) -> Result<()> {
    match format {
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        "json" => {
            let (header, data) = match rows.split_first() {
                Some(split) => split,
                None => return Ok(()),
            };
            let objects: Vec<serde_json::Map<String, serde_json::Value>> = data
                .iter()
                .map(|row| {
                    header
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(serde_json::Value::String))
                        .collect()
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
        _ => {
            let columns = rows.first().map(|r| r.len()).unwrap_or(0);
            let widths: Vec<usize> = (0..columns)
                .map(|i| rows.iter().map(|r| r.get(i).map_or(0, |c| c.len())).max().unwrap_or(0))
                .collect();

            for (n, row) in rows.iter().enumerate() {
                let line: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                    .collect();
                println!("{}", line.join(" | ").trim_end());

                if n == 0 {
                    println!("{}", separator(&widths));
                }
            }
        }
    }

    Ok(())
}
