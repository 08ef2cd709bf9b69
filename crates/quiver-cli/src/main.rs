use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quiver_core::domain::{Artifact, ResolvedAlias};
use quiver_core::impls::{InMemoryBlobStore, InMemoryMetadataStore};
use quiver_core::{AliasInput, ArtifactInput, Repository, RepositoryConfig, Version};

/// Printable view of an artifact (content shown as UTF-8 when possible).
#[derive(Debug, Serialize)]
struct ArtifactView<'a> {
    name: &'a str,
    version: String,
    content: String,
    content_type: Option<&'a str>,
    metadata: &'a quiver_core::domain::ArtifactMetadata,
    content_hash: &'a str,
    storage_locator: &'a str,
}

impl<'a> From<&'a Artifact> for ArtifactView<'a> {
    fn from(a: &'a Artifact) -> Self {
        Self {
            name: &a.name,
            version: a.version.to_string(),
            content: String::from_utf8_lossy(&a.content).into_owned(),
            content_type: a.content_type.as_deref(),
            metadata: &a.metadata,
            content_hash: a.content_hash.as_str(),
            storage_locator: &a.storage_locator,
        }
    }
}

fn log_artifact(label: &str, artifact: &Artifact) -> anyhow::Result<()> {
    let view = serde_json::to_string(&ArtifactView::from(artifact))?;
    info!(%view, "{label}");
    Ok(())
}

fn log_resolution(resolved: &ResolvedAlias) -> anyhow::Result<()> {
    let alias = serde_json::to_string(&resolved.alias)?;
    info!(%alias, "resolved alias");
    log_artifact("primary", &resolved.primary)?;
    if let Some(canary) = &resolved.secondary {
        log_artifact(
            &format!("secondary ({}%)", canary.weight.percent()),
            &canary.artifact,
        )?;
    }
    Ok(())
}

fn load_config() -> anyhow::Result<RepositoryConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let source =
                std::fs::read_to_string(&path).with_context(|| format!("read config {path}"))?;
            RepositoryConfig::from_toml_str(&source).with_context(|| format!("parse config {path}"))
        }
        None => Ok(RepositoryConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) 設定とストアを用意（サンプルなので in-memory）
    let config = load_config()?;
    let blobs = InMemoryBlobStore::new();
    let repo = Repository::builder()
        .config(config.clone())
        .blob_store(Arc::new(blobs.clone()))
        .metadata_store(Arc::new(InMemoryMetadataStore::new()))
        .build()?;
    repo.bootstrap().await?;

    // (B) LATEST を書いて 2 回 publish
    let name = "deploy";
    repo.put_artifact(name, ArtifactInput::new("v1").with_metadata([("foo", "bar")]))
        .await?;
    log_artifact("published", &repo.publish_artifact_version(name).await?)?;
    repo.put_artifact(name, ArtifactInput::new("v2")).await?;
    log_artifact("published", &repo.publish_artifact_version(name).await?)?;

    for artifact in repo.list_artifact_versions(name).await? {
        log_artifact("listed", &artifact)?;
    }

    // (C) canary alias: 80% → 1, 20% → 2
    repo.put_alias(name, "LIVE", AliasInput::new(1u64).with_secondary(2u64, 20u8))
        .await?;
    log_resolution(&repo.resolve_alias(name, "LIVE").await?)?;

    // (D) 不正な alias は書き込み前に拒否される
    if let Err(err) = repo
        .put_alias(name, "BAD", AliasInput::new(1u64).with_secondary(1u64, 20u8))
        .await
    {
        warn!(kind = ?err.kind(), %err, "rejected alias");
    }

    // (E) soft delete は Blob を残し、purge はすべて消す
    repo.delete_artifact_version(name, Version::Number(1)).await?;
    info!(
        versions = repo.list_artifact_versions(name).await?.len(),
        blobs = blobs.object_count(&config.blob_container).await,
        "after soft delete"
    );
    let report = repo.purge_artifact(name).await?;
    info!(
        records_removed = report.records_removed,
        blobs_removed = report.blobs_removed,
        blobs = blobs.object_count(&config.blob_container).await,
        "after purge"
    );

    Ok(())
}
