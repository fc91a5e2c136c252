//! Tracing setup for the binary.
//!
//! `TYPERANK_LOG` takes an `EnvFilter` directive (default `warn`), and
//! `TYPERANK_LOG_FORMAT=json` switches to JSON lines. Output goes to stderr so
//! it never mixes with the practice screen or CSV written to stdout.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TYPERANK_LOG";
pub const LOG_FORMAT_ENV: &str = "TYPERANK_LOG_FORMAT";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
