//! src/logging.rs
//! ============================================================================
//! # Logger: tracing setup for the reader
//!
//! One daily-rolling file under `logging.log_dir`, optionally mirrored to
//! stderr. `RUST_LOG` overrides the configured level.
//!
//! Line format: `[SEQ] LEVEL [file:line mod::path] message`

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tracing::Metadata;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    prelude::*,
};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "esfwee-read";

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`; keep the guard alive until
    /// exit so buffered lines reach the file.
    pub fn init_tracing(config: &LoggingConfig) -> Result<WorkerGuard> {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("cannot create log dir {}", config.log_dir.display())
        })?;

        // daily rolling file appender → <log_dir>/esfwee-read.YYYY-MM-DD
        let appender: RollingFileAppender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(&config.log_dir)
            .context("cannot create rolling log file")?;
        let (file, guard): (NonBlocking, WorkerGuard) = tracing_appender::non_blocking(appender);

        let file_layer = fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(file)
            .with_ansi(false)
            .with_filter(Self::filter(&config.level)?);

        // optional stderr layer for live debugging
        let stderr_layer = if config.stderr {
            Some(
                fmt::layer()
                    .event_format(SeqFileMod)
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_filter(Self::filter(&config.level)?),
            )
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init()
            .context("tracing subscriber already installed")?;

        Ok(guard)
    }

    fn filter(level: &str) -> Result<EnvFilter> {
        Ok(EnvFilter::builder()
            .with_default_directive(
                level
                    .parse()
                    .with_context(|| format!("invalid log level '{level}'"))?,
            )
            .from_env_lossy())
    }
}

static SEQ: AtomicUsize = AtomicUsize::new(1);

/// Custom formatter: `[SEQ] LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        // monotonically-increasing sequence number
        let seq: usize = SEQ.fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}
