//! Blob key / record id layout.
//!
//! Blob keys are `{name}/{version_token}{suffix}`; the token is `LATEST` or the
//! zero-padded version number, so a prefix listing comes back in version order.

use crate::domain::Version;
use crate::ports::RecordKey;

use super::config::RepositoryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    container: String,
    suffix: String,
    width: usize,
}

impl KeyLayout {
    pub fn new(config: &RepositoryConfig) -> Self {
        Self {
            container: config.blob_container.clone(),
            suffix: config.file_suffix.clone(),
            width: config.version_zero_pad_width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `None` if the version number does not fit in the configured width.
    pub fn token(&self, version: Version) -> Option<String> {
        version.token(self.width)
    }

    /// Every blob of `name` lives under this prefix.
    pub fn prefix(&self, name: &str) -> String {
        format!("{name}/")
    }

    pub fn blob_key(&self, name: &str, token: &str) -> String {
        format!("{name}/{token}{}", self.suffix)
    }

    /// Where the blob lives, as reported on an `Artifact`.
    pub fn locator(&self, blob_key: &str) -> String {
        format!("{}/{blob_key}", self.container)
    }

    pub fn version_record(&self, name: &str, token: &str) -> RecordKey {
        RecordKey::version(name, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(suffix: &str) -> KeyLayout {
        KeyLayout::new(&RepositoryConfig {
            file_suffix: suffix.to_string(),
            ..RepositoryConfig::default()
        })
    }

    #[test]
    fn blob_keys_follow_layout() {
        let layout = layout(".bin");
        let token = layout.token(Version::Number(3)).unwrap();
        assert_eq!(layout.blob_key("deploy", &token), "deploy/00000003.bin");
        assert_eq!(layout.blob_key("deploy", "LATEST"), "deploy/LATEST.bin");
        assert_eq!(layout.locator("deploy/LATEST.bin"), "artifacts/deploy/LATEST.bin");
        assert_eq!(layout.prefix("deploy"), "deploy/");
    }

    #[test]
    fn empty_suffix_is_default() {
        assert_eq!(layout("").blob_key("deploy", "LATEST"), "deploy/LATEST");
    }

    #[test]
    fn version_records_use_tokens() {
        let layout = layout("");
        let token = layout.token(Version::Number(12)).unwrap();
        assert_eq!(
            layout.version_record("deploy", &token).record_id,
            "version#00000012"
        );
    }
}
