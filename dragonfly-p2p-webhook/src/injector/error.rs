use std::path::PathBuf;

use snafu::Snafu;

/// Errors raised while reading the injection policy file.
///
/// They never leave [`ConfigManager`](super::ConfigManager): a policy that
/// cannot be read is replaced by the built-in default.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to open inject config from {}, error: {source}", filename.display()))]
    OpenConfig { filename: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse inject config from {}, error: {source}", filename.display()))]
    ParseConfig { filename: PathBuf, source: serde_yaml::Error },
}
