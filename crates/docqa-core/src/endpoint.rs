//! Catalogue of backend paths.

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::request::Method;

/// A backend path, rendered relative to the origin without a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    /// Lists the wrapper kinds the backend can instantiate.
    GetAllModelWrapper,
    /// Lists the names of configured models.
    GetAllUnmodifiedModels,
    /// Persists a model configuration.
    InsertModel,
    /// Deletes model configurations by name.
    DeleteModels,
    /// Lists models usable for embeddings.
    GetEmbeddingModels,
    /// Lists models usable as the LLM.
    GetLlmModels,
    /// Builds the index pipeline for an embedding model.
    BuildIndexPipeline,
    /// Builds the query pipeline.
    BuildQueryPipeline,
    /// Runs the index pipeline over an uploaded document.
    RunIndexPipeline,
    /// Asks a question against the indexed documents.
    QueryPipeline,
}

impl Endpoint {
    /// Returns the HTTP method the backend expects on this path.
    pub const fn method(self) -> Method {
        match self {
            Self::GetAllModelWrapper
            | Self::GetAllUnmodifiedModels
            | Self::GetEmbeddingModels
            | Self::GetLlmModels => Method::Get,
            Self::InsertModel
            | Self::DeleteModels
            | Self::BuildIndexPipeline
            | Self::BuildQueryPipeline
            | Self::RunIndexPipeline
            | Self::QueryPipeline => Method::Post,
        }
    }

    /// Returns the path as a static string.
    pub fn path(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_paths_are_snake_case() {
        assert_eq!(Endpoint::GetAllModelWrapper.path(), "get_all_model_wrapper");
        assert_eq!(Endpoint::GetLlmModels.path(), "get_llm_models");
        assert_eq!(Endpoint::QueryPipeline.to_string(), "query_pipeline");
        assert_eq!(
            Endpoint::from_str("run_index_pipeline").unwrap(),
            Endpoint::RunIndexPipeline
        );
    }

    #[test]
    fn test_methods() {
        let gets: Vec<_> = Endpoint::iter()
            .filter(|e| e.method() == Method::Get)
            .map(Endpoint::path)
            .collect();

        assert_eq!(
            gets,
            [
                "get_all_model_wrapper",
                "get_all_unmodified_models",
                "get_embedding_models",
                "get_llm_models",
            ]
        );
    }
}
