use thiserror::Error;

use metaforge_core::postmeta::MetaStoreError;
use metaforge_core::types::TaskType;
use metaforge_providers::ConnectorError;

#[derive(Debug, Error)]
pub enum SeoError {
    /// Nothing usable left after cleaning the model output.
    #[error("model returned no usable {0} output")]
    EmptyOutput(TaskType),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Store(#[from] MetaStoreError),
}
