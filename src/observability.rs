//! This module provides the crate's logging hooks.
//!
//! The library itself only talks to the `log` facade. A host application that
//! already installs a logger needs nothing from here; one that does not can call
//! [`enable_logging`] once to get `env_logger` output on stderr.
//!
//! The `log_metric!` macro emits one structured key/value line at `debug` level,
//! used for per-stream statistics.

use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at `level`.
///
/// Only the first call has any effect. If another logger was installed by the
/// host first, this is a no-op.
pub fn enable_logging(level: LevelFilter) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level, the module and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )?;
            buf.flush()?;
            Ok(())
        });

        let _ = builder.try_init();
    });
}

/// Logs a structured key-value metric line at `debug` level.
///
/// # Example
/// ```ignore
/// log_metric!("event" = "encode", "nvoxels" = &nvoxels, "bytes" = &len);
/// ```
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("FPZK_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
