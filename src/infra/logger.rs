use env_logger::Builder;
use log::Level;
use std::io::Write;

pub const LOG_LEVEL_ENV: &str = "CODE_COMBINER_LOG_LEVEL";

pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

/// ANSI foreground code used for the level tag.
fn level_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31,
        Level::Warn => 33,
        Level::Info => 32,
        Level::Debug => 36,
        Level::Trace => 35,
    }
}

pub fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let env = env_logger::Env::default().filter_or(LOG_LEVEL_ENV, level_for_verbosity(verbosity));

    Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "\x1B[{}m[{}]\x1B[0m [{}] {}: {}",
                level_color_code(record.level()),
                record.level(),
                buf.timestamp(),
                record.target(),
                record.args()
            )
        })
        .format_timestamp_secs()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    #[test]
    fn test_setup_logger() {
        INIT.call_once(|| {
            assert!(setup_logger(0).is_ok());
        });
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), "error");
        assert_eq!(level_for_verbosity(2), "info");
        assert_eq!(level_for_verbosity(9), "debug");
    }

    #[test]
    fn test_errors_and_warnings_stand_out() {
        assert_eq!(level_color_code(Level::Error), 31);
        assert_eq!(level_color_code(Level::Warn), 33);
        assert_ne!(level_color_code(Level::Info), level_color_code(Level::Debug));
    }
}
