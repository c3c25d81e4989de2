//! Logger setup for the browser console and native terminals.

use crate::config::LogLevel;

/// Install the global logger at `level`. Later calls are ignored.
pub fn init(level: LogLevel) {
    let filter = level.to_level_filter();

    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(filter.to_level().unwrap_or(log::Level::Error));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::new()
            .filter_level(filter)
            .parse_default_env()
            .try_init();
    }

    log::debug!("Logging initialized at {:?}", filter);
}
