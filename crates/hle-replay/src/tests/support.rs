//! Configuration loaders and trace helpers shared by the replay tests.

use std::ffi::OsString;
use std::sync::Arc;

use hle_config::{Config, OrthoConfig};
use mockall::mock;
use ortho_config::OrthoError;

use crate::{ConfigLoader, ReplayEvent};

mock! {
    pub Loader {}

    impl ConfigLoader for Loader {
        fn load(&self) -> Result<Config, Arc<OrthoError>>;
    }
}

/// Loader returning `config` once.
pub(crate) fn loader_for(config: Config) -> MockLoader {
    let mut loader = MockLoader::new();
    loader.expect_load().times(1).return_once(move || Ok(config));
    loader
}

/// Loader resolving the layered configuration from `args`.
pub(crate) fn command_line_loader(args: &[&str]) -> MockLoader {
    let argv: Vec<OsString> = std::iter::once("hle-replay")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut loader = MockLoader::new();
    loader
        .expect_load()
        .times(1)
        .return_once(move || Config::load_from_iter(argv));
    loader
}

/// Loader failing the way an invalid command line does.
pub(crate) fn failing_loader() -> MockLoader {
    command_line_loader(&["--no-such-flag"])
}

pub(crate) fn events(output: &[u8]) -> Vec<ReplayEvent> {
    std::str::from_utf8(output)
        .expect("utf-8 output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("one event per line"))
        .collect()
}
