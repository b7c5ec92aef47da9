use std::io;

use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io failed for {record}: {source}")]
    Io {
        record: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {record}: {source}")]
    Json {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
