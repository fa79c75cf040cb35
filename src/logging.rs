use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber: compact console output filtered by
/// `RUST_LOG` plus one CSV file per day under `log_dir`.
pub fn init(app_name: &str, log_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let initialised = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .with(CsvLayer::new(log_dir))
        .try_init();

    // Already installed (tests); keep the existing one.
    if initialised.is_ok() {
        tracing::info!(application = app_name, "logging initialized");
    }
}

pub struct CsvLayer {
    dir: PathBuf,
}

impl CsvLayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, now: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!("logs-{}.csv", now.format("%Y-%m-%d")))
    }

    pub fn append(&self, now: DateTime<Utc>, level: &Level, message: &str) {
        if fs::create_dir_all(&self.dir).is_err() {
            eprintln!("No se pudo crear el directorio de logs.");
            return;
        }
        let Ok(file) = OpenOptions::new().append(true).create(true).open(self.file_for(now)) else {
            eprintln!("No se pudo abrir el archivo de logs.");
            return;
        };

        let mut writer = csv::Writer::from_writer(file);
        if writer
            .write_record([now.to_rfc3339(), level.to_string(), message.to_string()])
            .is_ok()
        {
            let _ = writer.flush();
        }
    }
}

impl<S: Subscriber> Layer<S> for CsvLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.append(Utc::now(), event.metadata().level(), &visitor.finish());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
