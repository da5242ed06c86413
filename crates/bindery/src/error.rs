//! CLI error types.

use bindery_config::ConfigError;
use bindery_corpus::CorpusError;
use bindery_epub::EpubError;
use bindery_html::HtmlError;
use bindery_output::OutputError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Corpus(#[from] CorpusError),

    #[error("{0}")]
    Html(#[from] HtmlError),

    #[error("{0}")]
    Epub(#[from] EpubError),

    #[error("{0}")]
    Output(#[from] OutputError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse nodes file: {0}")]
    Nodes(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
