//! Diagnostic logging to stderr.
//!
//! Controlled by `DAIRYOPS_LOG` using `EnvFilter` directives, e.g.
//! `DAIRYOPS_LOG=dairyops_controller=debug`. Defaults to `warn`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub(crate) const LOG_ENV: &str = "DAIRYOPS_LOG";

pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();
}
