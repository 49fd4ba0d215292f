use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use insights_dashboard::config::DashboardConfig;
use insights_dashboard::{DashboardState, FileSource, FilterCriteria, FilterKey, RecordSource};

/// Insights dashboard: filter a dataset export and print chart view models as JSON
#[derive(Parser, Debug)]
#[command(name = "insights-dashboard", version, about, long_about = None)]
struct Cli {
    /// Dataset file (.json, .csv, .parquet); defaults to $DASHBOARD_DATA
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Topics kept in the top-topics chart
    #[arg(long, global = true)]
    top_topics: Option<usize>,

    /// Rows in the preview table
    #[arg(long, global = true)]
    preview_rows: Option<usize>,

    /// Emit compact instead of pretty-printed JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Every chart view model plus the active criteria
    Views(FilterArgs),
    /// Record count and mean scores only
    Summary(FilterArgs),
    /// The filtered records themselves
    Records {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print at most this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Distinct values of one column
    Unique {
        /// Column name, e.g. `sector` or `end_year`
        field: String,
    },
}

/// The filter panel as command-line flags.
#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    end_year: Option<String>,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    pestle: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    start_year: Option<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> FilterCriteria {
        let pairs = [
            (FilterKey::EndYear, self.end_year),
            (FilterKey::Topic, self.topic),
            (FilterKey::Sector, self.sector),
            (FilterKey::Region, self.region),
            (FilterKey::Pestle, self.pestle),
            (FilterKey::Source, self.source),
            (FilterKey::Country, self.country),
            (FilterKey::StartYear, self.start_year),
        ];
        pairs
            .into_iter()
            .fold(FilterCriteria::default(), |criteria, (key, value)| match value {
                Some(value) => criteria.with(key, value),
                None => criteria,
            })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load()?;
    if let Some(n) = cli.top_topics {
        config.top_topics = n;
    }
    if let Some(n) = cli.preview_rows {
        config.preview_rows = n;
    }

    let path = cli
        .data
        .or(config.data_path.clone())
        .context("No dataset given: pass --data or set DASHBOARD_DATA")?;
    let source = FileSource::new(path);

    let mut state = DashboardState::new(config.aggregate_options());
    let compact = cli.compact;

    match cli.command {
        Commands::Views(filters) => {
            state.load(&source);
            state.apply_criteria(filters.into_criteria());
            emit(&state.snapshot(), compact)?;
        }
        Commands::Summary(filters) => {
            state.load(&source);
            state.apply_criteria(filters.into_criteria());
            emit(&state.views().summary, compact)?;
        }
        Commands::Records { filters, limit } => {
            state.load(&source);
            state.apply_criteria(filters.into_criteria());
            let visible = state.visible_records();
            let shown = limit.unwrap_or(visible.len()).min(visible.len());
            emit(&visible[..shown], compact)?;
        }
        Commands::Unique { field } => {
            let values = source.get_unique_values_of(&field)?;
            emit(&values, compact)?;
        }
    }

    if let Some(message) = &state.status_message {
        log::error!("{message}");
    }
    Ok(())
}

fn emit<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    if compact {
        serde_json::to_writer(&mut out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_flags_build_criteria() {
        let cli = Cli::parse_from([
            "insights-dashboard",
            "views",
            "--topic",
            "oil",
            "--end-year",
            "2027",
            "--region",
            "",
        ]);
        let Commands::Views(filters) = cli.command else {
            panic!("expected views subcommand");
        };
        assert_eq!(
            filters.into_criteria(),
            FilterCriteria::default()
                .with(FilterKey::Topic, "oil")
                .with(FilterKey::EndYear, "2027")
        );
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "insights-dashboard",
            "records",
            "--data",
            "data.json",
            "--limit",
            "3",
            "--compact",
        ]);
        assert_eq!(cli.data, Some(PathBuf::from("data.json")));
        assert!(cli.compact);
        assert!(matches!(cli.command, Commands::Records { limit: Some(3), .. }));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
