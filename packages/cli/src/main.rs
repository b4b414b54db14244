#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for youth-detention statistics.
//!
//! Reads a file of already-normalized stay records (JSON array or CSV
//! with the canonical column headers), runs one aggregation and prints
//! the result as JSON on stdout. Logging goes to stderr and is controlled
//! by `RUST_LOG`.

mod input;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use detention_stats_analytics::{
    AggregationScope, Breakdown, outcomes, overrides, period, population,
    spatial::{self, DEFAULT_ZIP_PROPERTY, ZipCoverage},
    statistics, time_series,
};
use detention_stats_analytics_models::{
    BreakdownDimension, ChangeSummary, DateAxis, LosBand, LosStatistic, MetricKind,
};
use detention_stats_stay_models::{DetentionType, StayRecord};
use detention_stats_taxonomy::{
    AgeScheme,
    age::{self, INTAKE_SCHEME},
};

#[derive(Parser)]
#[command(name = "detention_stats", about = "Youth detention statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every report.
#[derive(Args)]
struct Common {
    /// Records file (`.csv`, otherwise a JSON array)
    #[arg(long)]
    input: PathBuf,
    /// `secure-detention` or `alternative-to-detention`
    #[arg(long, default_value = "secure-detention")]
    detention: DetentionType,
    /// Only include records from this facility or ATD program
    #[arg(long)]
    program: Option<String>,
}

/// Options for reports over one calendar year.
#[derive(Args)]
struct YearScope {
    #[command(flatten)]
    common: Common,
    /// Calendar year to report on
    #[arg(long)]
    year: i32,
}

/// Options selecting a breakdown dimension.
#[derive(Args)]
struct BreakdownArgs {
    /// Dimension to slice by (e.g. `offense_category`, `age_bracket`,
    /// `screened_status`, `disruption_type`)
    #[arg(long, default_value = "overall")]
    breakdown: BreakdownDimension,
    /// Built-in age scheme used by `age_bracket` (`intake` or `admission`)
    #[arg(long, default_value = INTAKE_SCHEME)]
    age_scheme: String,
    /// TOML file defining a custom age scheme; overrides `--age-scheme`
    #[arg(long)]
    age_scheme_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Admissions or releases by category and phase
    Counts {
        #[command(flatten)]
        scope: YearScope,
        #[command(flatten)]
        breakdown: BreakdownArgs,
        /// `entry` for admissions, `exit` for releases
        #[arg(long, default_value = "entry")]
        axis: DateAxis,
    },
    /// Mean or median length of stay by category and phase
    Los {
        #[command(flatten)]
        scope: YearScope,
        #[command(flatten)]
        breakdown: BreakdownArgs,
        /// `mean` or `median`
        #[arg(long, default_value = "mean")]
        statistic: LosStatistic,
    },
    /// Average daily population by category and phase
    Adp {
        #[command(flatten)]
        scope: YearScope,
        #[command(flatten)]
        breakdown: BreakdownArgs,
    },
    /// Releases per length-of-stay band
    Distribution {
        #[command(flatten)]
        scope: YearScope,
    },
    /// One metric per home ZIP code
    Zips {
        #[command(flatten)]
        scope: YearScope,
        /// Metric to map (e.g. `admissions`, `averageDailyPopulation`)
        #[arg(long, default_value = "admissions")]
        metric: MetricKind,
        /// `GeoJSON` `FeatureCollection` of the mapped ZIP codes
        #[arg(long)]
        coverage: PathBuf,
        /// Feature property holding the ZIP code
        #[arg(long, default_value = DEFAULT_ZIP_PROPERTY)]
        zip_property: String,
    },
    /// Yearly series of every metric family
    Trends {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        breakdown: BreakdownArgs,
        /// Axis whose years make up the series
        #[arg(long, default_value = "entry")]
        axis: DateAxis,
    },
    /// ATD exit outcomes by exit year
    Outcomes {
        /// Records file (`.csv`, otherwise a JSON array)
        #[arg(long)]
        input: PathBuf,
        /// Only include records from this ATD program
        #[arg(long)]
        program: Option<String>,
        #[command(flatten)]
        breakdown: BreakdownArgs,
    },
    /// Unsuccessful ATD exits by disruption type
    Disruptions {
        /// Records file (`.csv`, otherwise a JSON array)
        #[arg(long)]
        input: PathBuf,
        /// Only include records from this ATD program
        #[arg(long)]
        program: Option<String>,
        /// Exit year to report on
        #[arg(long)]
        year: i32,
    },
    /// Override rate of scored detention screenings by year
    Overrides {
        #[command(flatten)]
        common: Common,
    },
    /// Override reasons by year
    OverrideReasons {
        #[command(flatten)]
        common: Common,
    },
    /// Years present in the data on one axis
    Years {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value = "entry")]
        axis: DateAxis,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Counts {
            scope,
            breakdown,
            axis,
        } => {
            let (records, scope) = load_scope(&scope)?;
            let breakdown = resolve_breakdown(&breakdown, scope.detention_type)?;
            let result = period::count_by_category(&records, &scope, &breakdown, axis)?;
            #[allow(clippy::cast_precision_loss)]
            let change = ChangeSummary::new(
                result.total as f64,
                result.previous_period_baseline as f64,
            );
            serde_json::json!({ "result": result, "change": change })
        }
        Commands::Los {
            scope,
            breakdown,
            statistic,
        } => {
            let (records, scope) = load_scope(&scope)?;
            let breakdown = resolve_breakdown(&breakdown, scope.detention_type)?;
            let result =
                statistics::average_or_median_los(&records, &scope, &breakdown, statistic)?;
            let change = result
                .total
                .zip(result.previous_period_baseline)
                .map(|(current, previous)| ChangeSummary::new(current, previous));
            serde_json::json!({ "result": result, "change": change })
        }
        Commands::Adp { scope, breakdown } => {
            let (records, scope) = load_scope(&scope)?;
            let breakdown = resolve_breakdown(&breakdown, scope.detention_type)?;
            let result = population::average_daily_population(&records, &scope, &breakdown)?;
            let change = ChangeSummary::new(result.total, result.previous_period_baseline);
            serde_json::json!({ "result": result, "change": change })
        }
        Commands::Distribution { scope } => {
            let (records, scope) = load_scope(&scope)?;
            let bands = LosBand::defaults();
            serde_json::to_value(statistics::los_distribution(&records, &scope, &bands))?
        }
        Commands::Zips {
            scope,
            metric,
            coverage,
            zip_property,
        } => {
            let (records, scope) = load_scope(&scope)?;
            let coverage =
                ZipCoverage::from_geojson_str(&std::fs::read_to_string(coverage)?, &zip_property)?;
            serde_json::to_value(spatial::zip_metric(&records, &scope, &coverage, metric))?
        }
        Commands::Trends {
            common,
            breakdown,
            axis,
        } => {
            let records = input::load_records(&common.input)?;
            let breakdown = resolve_breakdown(&breakdown, common.detention)?;
            let series = time_series::analyze_by_year(
                &records,
                common.detention,
                &breakdown,
                axis,
                common.program.as_deref(),
            )?;
            serde_json::to_value(series)?
        }
        Commands::Outcomes {
            input,
            program,
            breakdown,
        } => {
            let records = input::load_records(&input)?;
            let breakdown = resolve_breakdown(&breakdown, DetentionType::AlternativeToDetention)?;
            serde_json::to_value(outcomes::exit_outcomes_by_year(
                &records,
                &breakdown,
                program.as_deref(),
            )?)?
        }
        Commands::Disruptions {
            input,
            program,
            year,
        } => {
            let records = input::load_records(&input)?;
            let scope =
                AggregationScope::calendar_year(year, DetentionType::AlternativeToDetention)?
                    .with_program(program.as_deref());
            let result = outcomes::exits_by_disruption_type(&records, &scope)?;
            #[allow(clippy::cast_precision_loss)]
            let change = ChangeSummary::new(
                result.total as f64,
                result.previous_period_baseline as f64,
            );
            serde_json::json!({ "result": result, "change": change })
        }
        Commands::Overrides { common } => {
            let records = input::load_records(&common.input)?;
            serde_json::to_value(overrides::overrides_by_year(
                &records,
                common.detention,
                common.program.as_deref(),
            )?)?
        }
        Commands::OverrideReasons { common } => {
            let records = input::load_records(&common.input)?;
            serde_json::to_value(overrides::override_reasons_by_year(
                &records,
                common.detention,
                common.program.as_deref(),
            )?)?
        }
        Commands::Years { common, axis } => {
            let records = input::load_records(&common.input)?;
            serde_json::to_value(time_series::years_present(
                &records,
                common.detention,
                axis,
                common.program.as_deref(),
            ))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Loads the records file and builds the aggregation scope.
fn load_scope(
    args: &YearScope,
) -> Result<(Vec<StayRecord>, AggregationScope), Box<dyn std::error::Error>> {
    let records = input::load_records(&args.common.input)?;
    let scope = AggregationScope::calendar_year(args.year, args.common.detention)?
        .with_program(args.common.program.as_deref());
    log::info!(
        "Reporting {} for {}{}",
        scope.detention_type,
        scope.window,
        scope
            .program
            .as_deref()
            .map_or_else(String::new, |p| format!(" ({p})"))
    );
    Ok((records, scope))
}

/// Builds the breakdown, loading the age scheme only when it is needed.
fn resolve_breakdown(
    args: &BreakdownArgs,
    detention_type: DetentionType,
) -> Result<Breakdown, Box<dyn std::error::Error>> {
    let scheme = if args.breakdown == BreakdownDimension::AgeBracket {
        Some(load_age_scheme(args)?)
    } else {
        None
    };

    let breakdown = Breakdown::from_dimension(args.breakdown, scheme)?;
    breakdown.ensure_supported(detention_type)?;
    Ok(breakdown)
}

fn load_age_scheme(args: &BreakdownArgs) -> Result<AgeScheme, Box<dyn std::error::Error>> {
    if let Some(path) = &args.age_scheme_file {
        log::info!("Loading age scheme from {}", path.display());
        return Ok(AgeScheme::from_toml(&std::fs::read_to_string(path)?)?);
    }
    Ok(age::scheme(&args.age_scheme)?)
}
