//! Model configuration management.

mod config;

use std::collections::BTreeSet;

use docqa_core::{Endpoint, Error, Gateway, Payload, Result};
use serde_json::json;

pub use self::config::{HubSource, MAX_CONTEXT_TOKENS, ModelConfig, ModelForm, WrapperKind};
use crate::{Ack, TRACING_TARGET_MODELS};

/// Lists, persists and deletes model configurations.
///
/// Wrapper kinds are fetched once when the manager is loaded and stay fixed
/// for the session. The configured-model set is refreshed after every
/// mutation.
#[derive(Debug)]
pub struct ModelConfigManager {
    gateway: Gateway,
    wrapper_kinds: Vec<String>,
    configured: BTreeSet<String>,
}

impl ModelConfigManager {
    /// Fetches the wrapper kinds and configured models.
    pub async fn load(gateway: Gateway) -> Result<Self> {
        let wrapper_kinds: Vec<String> = gateway.get_json(Endpoint::GetAllModelWrapper).await?;
        let configured: BTreeSet<String> =
            gateway.get_json(Endpoint::GetAllUnmodifiedModels).await?;

        tracing::info!(
            target: TRACING_TARGET_MODELS,
            wrapper_kinds = ?wrapper_kinds,
            configured_models = configured.len(),
            "Model configuration loaded"
        );

        Ok(Self {
            gateway,
            wrapper_kinds,
            configured,
        })
    }

    /// Returns the wrapper kinds, in their current order.
    pub fn list_wrapper_kinds(&self) -> &[String] {
        &self.wrapper_kinds
    }

    /// Returns the names of the configured models.
    pub fn list_configured_models(&self) -> &BTreeSet<String> {
        &self.configured
    }

    /// Returns `true` if `name` is a configured model.
    pub fn is_configured(&self, name: &str) -> bool {
        self.configured.contains(name)
    }

    /// Re-fetches the configured-model set.
    pub async fn refresh_configured_models(&mut self) -> Result<&BTreeSet<String>> {
        self.configured = self
            .gateway
            .get_json(Endpoint::GetAllUnmodifiedModels)
            .await?;
        Ok(&self.configured)
    }

    /// Moves `default_kind` to the front of the cached kind list, if present.
    ///
    /// The cached list itself is reordered, so later calls to
    /// [`list_wrapper_kinds`](Self::list_wrapper_kinds) see the new order.
    /// Reordering with the kind that is already first changes nothing.
    pub fn reorder_with_default(&mut self, default_kind: Option<&str>) -> &[String] {
        if let Some(kind) = default_kind
            && let Some(position) = self.wrapper_kinds.iter().position(|k| k == kind)
        {
            self.wrapper_kinds[..=position].rotate_right(1);
        }
        &self.wrapper_kinds
    }

    /// Rejects a configuration the backend could not instantiate.
    pub fn validate(&self, name: &str, config: &ModelConfig) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation().with_message("A model name is required"));
        }

        let kind = config.wrapper_kind();
        if !self.wrapper_kinds.iter().any(|k| k == kind.as_str()) {
            return Err(Error::validation()
                .with_message(format!("Unknown model wrapper kind '{kind}'"))
                .with_context(format!("model {name}")));
        }

        Ok(())
    }

    /// Persists the configuration under `name` and refreshes the configured set.
    ///
    /// Saving a name that is already configured updates it.
    pub async fn save_configuration(&mut self, name: &str, config: &ModelConfig) -> Result<Ack> {
        self.validate(name, config)?;

        tracing::debug!(
            target: TRACING_TARGET_MODELS,
            model_name = name,
            wrapper_kind = %config.wrapper_kind(),
            existing = self.is_configured(name),
            "Saving model configuration"
        );

        let payload = Payload::Json(json!({
            "model_name": name,
            "config_dict": config.to_config_dict(),
        }));
        self.gateway.post(Endpoint::InsertModel, payload).await?;
        self.refresh_configured_models().await?;

        tracing::info!(
            target: TRACING_TARGET_MODELS,
            model_name = name,
            "Model configuration saved"
        );

        Ok(Ack::new(Endpoint::InsertModel))
    }

    /// Deletes the named configurations and refreshes the configured set.
    ///
    /// Names that are not configured are still sent; the backend decides.
    /// The returned ack asks the collaborator to reload its view.
    pub async fn delete_configurations(&mut self, names: &BTreeSet<String>) -> Result<Ack> {
        if names.is_empty() {
            return Err(Error::validation().with_message("No models selected for deletion"));
        }

        let unknown: Vec<&String> = names.difference(&self.configured).collect();
        tracing::debug!(
            target: TRACING_TARGET_MODELS,
            models = ?names,
            not_configured = ?unknown,
            "Deleting model configurations"
        );

        let payload = Payload::Json(json!(names));
        self.gateway.post(Endpoint::DeleteModels, payload).await?;
        self.refresh_configured_models().await?;

        tracing::info!(
            target: TRACING_TARGET_MODELS,
            deleted = names.len(),
            remaining = self.configured.len(),
            "Model configurations deleted"
        );

        Ok(Ack::with_reload(Endpoint::DeleteModels))
    }
}
