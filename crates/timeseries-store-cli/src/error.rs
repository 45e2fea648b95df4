use timeseries_store_core::{ConfigError, ServiceError, StoreError};

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("No store given. Pass --config FILE or --root DIR."))]
    MissingStore,

    #[snafu(display("Failed to load configuration: {source}"))]
    LoadConfig { source: ConfigError },

    #[snafu(display("{}: {source}", source.reason()))]
    Service { source: ServiceError },

    #[snafu(display("Failed to list store contents: {source}"))]
    ListStore { source: StoreError },

    #[snafu(display("Failed to read records from {path}: {source}"))]
    ReadInput {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display(
        "Records in {path} are not a JSON array of \
         {{timestamp, value, quality?, update_ts?}}: {source}"
    ))]
    ParseInput {
        path: String,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: serde_json::Error },
}
