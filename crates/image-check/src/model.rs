//! Data model shared by the scanner, loader, fetcher and reconciler.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Opaque key of one object in the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ObjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// An instance group that declares the image it boots from.
///
/// The image reference is never empty: [`InstanceGroupRecord::new`] refuses
/// to build a record without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceGroupRecord {
    name: String,
    image_reference: String,
}

impl InstanceGroupRecord {
    /// Create a record, rejecting a blank image reference.
    pub fn new(
        name: impl Into<String>,
        image_reference: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let name = name.into();
        let image_reference = image_reference.into();

        if image_reference.trim().is_empty() {
            return Err(RecordError::MissingImage(name));
        }

        Ok(Self {
            name,
            image_reference,
        })
    }

    /// Instance group name. Used for logging only.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference exactly as declared in the manifest.
    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }
}

/// One image description returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Image name.
    #[serde(default)]
    pub name: Option<String>,

    /// Image location, usually `owner/name`.
    #[serde(default)]
    pub location: Option<String>,
}

impl CatalogEntry {
    /// Entry with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            location: None,
        }
    }

    /// Entry with only a location.
    pub fn located(location: impl Into<String>) -> Self {
        Self {
            name: None,
            location: Some(location.into()),
        }
    }

    /// Best label for log lines.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.location.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Human-readable description of one failed match or invalid record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostic(String);

impl Diagnostic {
    /// No catalog entry matched the declared reference.
    pub fn unmatched(image_reference: &str) -> Self {
        Self(format!("could not find image matching {}", image_reference))
    }

    /// Free-form diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Message text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the message text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<RecordError> for Diagnostic {
    fn from(err: RecordError) -> Self {
        Self(err.to_string())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored instance group manifest, as written by the cluster tooling.
///
/// Only `metadata.name` and `spec.image` matter to the check; the other
/// fields are kept for log context. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupManifest {
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: InstanceGroupSpec,
}

/// Object metadata block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub name: String,
}

/// Instance group spec block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupSpec {
    /// Image reference, `owner/name` or a bare name.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub machine_type: Option<String>,

    #[serde(default)]
    pub min_size: Option<u32>,

    #[serde(default)]
    pub max_size: Option<u32>,
}

impl InstanceGroupManifest {
    /// Decode a YAML manifest body.
    pub fn from_yaml(body: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(body)
    }

    /// Turn the manifest into a record.
    pub fn into_record(self) -> Result<InstanceGroupRecord, RecordError> {
        InstanceGroupRecord::new(self.metadata.name, self.spec.image.unwrap_or_default())
    }
}
