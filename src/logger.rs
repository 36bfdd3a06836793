use std::fs::File;
use std::sync::Once;

use time::{
    format_description::{self, parse},
    OffsetDateTime, UtcOffset,
};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

static INIT: Once = Once::new();

/// Installs a file subscriber for the whole process. Idempotent across
/// matches; will panic if the log file cannot be created.
pub(crate) fn init_file_logger() {
    INIT.call_once(|| {
        let file = File::create(log_file_name()).unwrap();
        let writer = BoxMakeWriter::new(file);
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        let timer = tracing_subscriber::fmt::time::OffsetTime::new(
            offset,
            format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]").unwrap(),
        );

        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer)
            .finish();

        let _ = set_global_default(subscriber);
    });
}

fn log_file_name() -> String {
    let format = parse("[year]-[month]-[day]_[hour]:[minute]:[second]_matches.log").unwrap();
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).unwrap()
}
