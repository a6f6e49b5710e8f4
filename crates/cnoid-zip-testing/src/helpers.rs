//! Helper utilities for cnoid-zip testing

use anyhow::Result;
use std::io::{Cursor, Write};
use std::sync::Once;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One entry of an archive built by [`build_zip`]
#[derive(Debug, Clone, Copy)]
pub enum ZipEntrySpec<'a> {
    /// A directory marker; the name should end with `/`
    Dir(&'a str),
    /// A file with its content
    File(&'a str, &'a [u8]),
}

/// Builds a zip archive in memory with the entries in the given order
///
/// Unlike packing a directory, this controls the exact entry order and
/// allows archives without a leading directory entry.
pub fn build_zip(entries: &[ZipEntrySpec<'_>]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match *entry {
            ZipEntrySpec::Dir(name) => zip.add_directory(name, SimpleFileOptions::default())?,
            ZipEntrySpec::File(name, content) => {
                zip.start_file(name, SimpleFileOptions::default())?;
                zip.write_all(content)?;
            }
        }
    }
    Ok(zip.finish()?.into_inner())
}

static TRACING: Once = Once::new();

/// Installs a tracing subscriber for tests, at most once per process
///
/// Honors `RUST_LOG`; defaults to debug output of the cnoid-zip crate.
pub fn init_tracing() {
    use tracing_subscriber::fmt::time::ChronoLocal;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    TRACING.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cnoid_zip=debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
            .with_target(false)
            .with_test_writer();

        // Another subscriber may already be installed by the harness.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}
