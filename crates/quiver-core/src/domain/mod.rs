//! Domain model (versions, artifacts, aliases, errors).
//!
//! ストアにもネットワークにも依存しない純粋な型と検証ロジックのみを置く。

pub mod alias;
pub mod artifact;
pub mod errors;
pub mod version;

pub use self::alias::{
    AliasInput, AliasRecord, CanaryTarget, CanaryWeight, ResolvedAlias, WeightInput,
    validate_alias_name,
};
pub use self::artifact::{
    Artifact, ArtifactInput, ArtifactMetadata, ContentHash, VersionRecord,
    validate_artifact_name,
};
pub use self::errors::{
    ErrorKind, Operation, RepoError, StoreError, ValidationError, ValidationKind,
};
pub use self::version::{LATEST_TOKEN, MAX_PAD_WIDTH, Version};
