//! CLI adapter for the time-series store.

mod error;

use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use snafu::ResultExt;
use timeseries_store_core::{
    DomainUnit, SeriesCatalog, ServiceConfig, TimeseriesService, WireRecord, wire,
};

use crate::error::{
    CliResult, ListStoreSnafu, LoadConfigSnafu, MissingStoreSnafu, ParseInputSnafu,
    ReadInputSnafu, ServiceSnafu, WriteOutputSnafu,
};

type Service = TimeseriesService<SeriesCatalog>;

fn parse_bound_arg(s: &str) -> Result<DateTime<Utc>, String> {
    wire::parse_bound(s).map_err(|e| e.to_string())
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print raw rows of a series as JSON
    Get {
        #[arg(long)]
        id: String,

        /// Inclusive lower bound (ISO-8601; naive means UTC)
        #[arg(long, value_parser = parse_bound_arg)]
        start: Option<DateTime<Utc>>,

        /// Exclusive upper bound
        #[arg(long, value_parser = parse_bound_arg)]
        end: Option<DateTime<Utc>>,

        /// Convert values to this unit
        #[arg(long)]
        unit: Option<String>,
    },

    /// Upsert rows read from a JSON array of records
    Set {
        #[arg(long)]
        id: String,

        /// Records file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Unit the input values are expressed in
        #[arg(long)]
        unit: Option<String>,
    },

    /// Remove rows in a time range (whole series when unbounded)
    Delete {
        #[arg(long)]
        id: String,

        #[arg(long, value_parser = parse_bound_arg)]
        start: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_bound_arg)]
        end: Option<DateTime<Utc>>,
    },

    /// Resample one series to a coarser frequency
    Resample {
        #[arg(long)]
        id: String,

        /// e.g. 15min, 1h, 1d, 1mo
        #[arg(long)]
        freq: String,

        /// sum, mean, min or max
        #[arg(long, default_value = "mean")]
        agg: String,

        /// Bucket origin and inclusive lower bound
        #[arg(long, value_parser = parse_bound_arg)]
        start: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_bound_arg)]
        end: Option<DateTime<Utc>>,

        #[arg(long)]
        unit: Option<String>,
    },

    /// Resample several series and combine them bucket by bucket
    Aggregate {
        /// Repeatable; repeated ids count once per occurrence
        #[arg(long = "id")]
        ids: Vec<String>,

        #[arg(long)]
        freq: String,

        #[arg(long, default_value = "mean")]
        resampling: String,

        #[arg(long, default_value = "sum")]
        operation: String,

        #[arg(long, value_parser = parse_bound_arg)]
        start: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_bound_arg)]
        end: Option<DateTime<Utc>>,
    },

    /// Print count, first/last timestamp and latest write time
    Stats {
        #[arg(long)]
        id: String,

        #[arg(long, value_parser = parse_bound_arg)]
        start: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_bound_arg)]
        end: Option<DateTime<Utc>>,
    },

    /// List partitions, or the series keys of one partition
    Ls {
        #[arg(long)]
        partition: Option<String>,
    },

    /// List supported units
    Units,
}

#[derive(Debug, Parser)]
#[command(name = "tsstore", about = "Time-series store and analytics")]
struct Cli {
    /// Service configuration file
    #[arg(long, global = true, conflicts_with = "root")]
    config: Option<PathBuf>,

    /// Store root directory (instead of --config)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Series catalog file (with --root)
    #[arg(long, global = true, requires = "root")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn service_config(cli: &Cli) -> CliResult<ServiceConfig> {
    if let Some(path) = &cli.config {
        return ServiceConfig::from_path(path).context(LoadConfigSnafu);
    }
    let Some(root) = &cli.root else {
        return MissingStoreSnafu.fail();
    };
    let mut config = ServiceConfig::new(root);
    config.catalog = cli.catalog.clone();
    Ok(config)
}

fn open_service(cli: &Cli) -> CliResult<Service> {
    let config = service_config(cli)?;
    debug!("opening store at {}", config.storage.root.display());
    TimeseriesService::from_config(&config).context(ServiceSnafu)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let out = serde_json::to_string_pretty(value).context(WriteOutputSnafu)?;
    println!("{out}");
    Ok(())
}

fn read_records(input: &str) -> CliResult<Vec<WireRecord>> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context(ReadInputSnafu { path: "<stdin>" })?;
        buf
    } else {
        std::fs::read_to_string(input).context(ReadInputSnafu { path: input })?
    };
    serde_json::from_str(&text).context(ParseInputSnafu { path: input })
}

fn cmd_get(
    svc: &Service,
    id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    unit: Option<&str>,
) -> CliResult<()> {
    let records = svc.get(id, start, end, unit).context(ServiceSnafu)?;
    print_json(&records)
}

fn cmd_set(svc: &Service, id: &str, input: &str, unit: Option<&str>) -> CliResult<()> {
    let records = read_records(input)?;
    svc.set(id, &records, unit).context(ServiceSnafu)?;
    info!("stored {} record(s) for {id}", records.len());
    Ok(())
}

fn cmd_delete(
    svc: &Service,
    id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> CliResult<()> {
    let removed = svc.delete(id, start, end).context(ServiceSnafu)?;
    info!("removed {removed} record(s) from {id}");
    Ok(())
}

struct ResampleArgs {
    id: String,
    freq: String,
    agg: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    unit: Option<String>,
}

fn cmd_resample(svc: &Service, args: ResampleArgs) -> CliResult<()> {
    let records = svc
        .resample(
            &args.id,
            &args.freq,
            &args.agg,
            args.start,
            args.end,
            args.unit.as_deref(),
        )
        .context(ServiceSnafu)?;
    print_json(&records)
}

fn cmd_aggregate(
    svc: &Service,
    ids: &[String],
    freq: &str,
    resampling: &str,
    operation: &str,
    (start, end): (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
) -> CliResult<()> {
    let records = svc
        .aggregate(ids, freq, resampling, operation, start, end)
        .context(ServiceSnafu)?;
    print_json(&records)
}

fn cmd_stats(
    svc: &Service,
    id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> CliResult<()> {
    let stats = svc.stats(id, start, end).context(ServiceSnafu)?;
    print_json(&stats)
}

fn cmd_ls(svc: &Service, partition: Option<&str>) -> CliResult<()> {
    let store = svc.store();
    match partition {
        Some(p) => {
            for key in store.keys(p).context(ListStoreSnafu)? {
                println!("{key}");
            }
        }
        None => {
            for p in store.partitions().context(ListStoreSnafu)? {
                println!("{p}");
            }
        }
    }
    Ok(())
}

fn cmd_units() {
    for unit in DomainUnit::ALL {
        let physical = unit.physical();
        println!("{}\t{}\t{}", unit.name(), physical.symbol, physical.dimension);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if let Command::Units = cli.cmd {
        cmd_units();
        return Ok(());
    }

    let svc = open_service(&cli)?;
    match cli.cmd {
        Command::Get {
            id,
            start,
            end,
            unit,
        } => cmd_get(&svc, &id, start, end, unit.as_deref()),

        Command::Set { id, input, unit } => cmd_set(&svc, &id, &input, unit.as_deref()),

        Command::Delete { id, start, end } => cmd_delete(&svc, &id, start, end),

        Command::Resample {
            id,
            freq,
            agg,
            start,
            end,
            unit,
        } => cmd_resample(
            &svc,
            ResampleArgs {
                id,
                freq,
                agg,
                start,
                end,
                unit,
            },
        ),

        Command::Aggregate {
            ids,
            freq,
            resampling,
            operation,
            start,
            end,
        } => cmd_aggregate(&svc, &ids, &freq, &resampling, &operation, (start, end)),

        Command::Stats { id, start, end } => cmd_stats(&svc, &id, start, end),

        Command::Ls { partition } => cmd_ls(&svc, partition.as_deref()),

        Command::Units => {
            cmd_units();
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
