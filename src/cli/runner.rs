//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{CustomerResolver, SyncEngine, SyncStats};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::output::{JsonLinesSink, RecordSink};
use crate::schema;
use crate::state::StateManager;
use crate::streams::StreamKind;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing its output to stdout
    pub async fn run(&self) -> Result<()> {
        self.run_with(std::io::stdout()).await?;
        Ok(())
    }

    /// Run the CLI command, writing its output to `out`
    pub async fn run_with<W: Write + Send>(&self, out: W) -> Result<W> {
        match &self.cli.command {
            Commands::Discover => self.discover(out),
            Commands::Read {
                streams,
                persist_state,
            } => self.read(out, streams.as_deref(), *persist_state).await,
            Commands::Streams => self.streams(out),
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        let config = if let Some(json_str) = &self.cli.config_json {
            TapConfig::from_json(json_str)?
        } else if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            TapConfig::from_json(&content)?
        } else {
            return Err(Error::config(
                "No configuration given, use --config or --config-json",
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path, false)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Print the catalog
    fn discover<W: Write>(&self, mut out: W) -> Result<W> {
        let catalog = schema::discover()?;
        let json = serde_json::to_string_pretty(&catalog)
            .map_err(|e| Error::output(format!("Failed to serialize catalog: {e}")))?;
        writeln!(out, "{json}").context("Failed to write catalog")?;
        Ok(out)
    }

    /// List stream names
    fn streams<W: Write>(&self, mut out: W) -> Result<W> {
        let names: Vec<&str> = StreamKind::ORDERED.iter().map(|k| k.name()).collect();
        writeln!(out, "{}", json!({ "type": "STREAMS", "streams": names }))?;
        Ok(out)
    }

    /// Read data
    async fn read<W: Write + Send>(
        &self,
        out: W,
        streams: Option<&str>,
        persist_state: bool,
    ) -> Result<W> {
        let sync_start = Instant::now();
        let config = self.load_config()?;
        let state = self.load_state()?;

        let selected = match streams {
            Some(list) => StreamKind::select(list.split(','))?,
            None => config.selected_streams()?,
        };
        let facilities = config.facilities()?;
        let start_date = config.start_date()?;

        let mut sink = JsonLinesSink::new(out);
        for entry in &schema::discover_streams(&selected)?.streams {
            sink.emit_schema(entry)?;
        }

        let client = HttpClient::from_tap_config(&config)?;
        let mut engine = SyncEngine::new(client, config.base_url()?, state.clone());

        // Customers are only reachable through bookings
        let mut resolver = selected
            .contains(&StreamKind::Customers)
            .then(|| CustomerResolver::new(config.customer_batch_size));
        if resolver.is_some() && !selected.contains(&StreamKind::Bookings) {
            warn!("The customers stream is only extracted together with bookings");
        }

        for facility in &facilities {
            for kind in &selected {
                let stream = kind.stream(start_date);
                if !stream.enumerable() {
                    continue;
                }

                let attached = match kind {
                    StreamKind::Bookings => resolver.as_mut(),
                    _ => None,
                };
                engine
                    .sync_stream(stream.as_ref(), facility, &mut sink, attached)
                    .await?;
                sink.emit_state(&state.snapshot().await)?;
            }
        }

        if persist_state {
            if state.is_in_memory() {
                warn!("--persist-state needs a --state file, bookmarks were not saved");
            } else {
                state.save().await?;
                info!("Bookmarks saved to {}", state.path().display());
            }
        }

        let mut stats = engine.stats().clone();
        stats.set_duration(u64::try_from(sync_start.elapsed().as_millis()).unwrap_or(u64::MAX));
        log_summary(&stats, facilities.len());

        sink.into_inner()
    }
}

fn log_summary(stats: &SyncStats, facilities: usize) {
    info!(
        "Sync finished in {} ms: {} facilities, {} walks, {} pages, {} records emitted, {} skipped, {} dropped",
        stats.duration_ms,
        facilities,
        stats.streams_synced,
        stats.pages_fetched,
        stats.records_emitted,
        stats.records_skipped,
        stats.records_dropped
    );
    if stats.customers.requested > 0 {
        info!(
            "Customers: {} requested, {} resolved, {} unresolved",
            stats.customers.requested, stats.customers.resolved, stats.customers.unresolved
        );
    }
}
