use std::fmt::Display;

use chrono::{DateTime, Local};
use fern::colors::{Color, ColoredLevelConfig};

use crate::config::LogLevel;

pub const DEFAULT_LOGS_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn format_line(now: DateTime<Local>, level: impl Display, target: &str, message: impl Display) -> String {
    format!(
        "[{}] [{}] [{}] {}",
        now.format(DEFAULT_LOGS_DATETIME_FORMAT),
        level,
        target,
        message
    )
}

/// Install the global logger, writing to stdout.
pub fn setup_logger(level: LogLevel, disable_colors: bool) -> Result<(), log::SetLoggerError> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Magenta)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let line = if disable_colors {
                format_line(Local::now(), record.level(), record.target(), message)
            } else {
                format_line(Local::now(), colors.color(record.level()), record.target(), message)
            };
            out.finish(format_args!("{}", line))
        })
        .level(level.into())
        .chain(std::io::stdout())
        .apply()
}
