//! Image name extraction and catalog matching.

use tracing::debug;

use crate::error::RecordError;
use crate::model::CatalogEntry;

/// Image name a reference should be matched by.
///
/// `owner/name` yields `name`. Only the first two segments count, so
/// `owner/name/extra` also yields `name`. A reference without `/` is
/// returned as is.
pub fn extract_target_name(image_reference: &str) -> Result<&str, RecordError> {
    if image_reference.is_empty() {
        return Err(RecordError::EmptyReference);
    }

    let mut segments = image_reference.split('/');
    let first = segments.next().unwrap_or(image_reference);
    Ok(segments.next().unwrap_or(first))
}

/// Whether `entry` provides the image `target_name`.
///
/// The trimmed name is checked before the trimmed location; either
/// containing the trimmed target is a match. A missing entry or a blank
/// target never matches.
pub fn entry_matches(entry: Option<&CatalogEntry>, target_name: &str) -> bool {
    let Some(entry) = entry else {
        return false;
    };

    let target = target_name.trim();
    if target.is_empty() {
        return false;
    }

    if let Some(name) = entry.name.as_deref() {
        if name.trim().contains(target) {
            debug!(image = %name, "Found instance group image by name");
            return true;
        }
    }

    if let Some(location) = entry.location.as_deref() {
        if location.trim().contains(target) {
            debug!(image = %location, "Found instance group image by location");
            return true;
        }
    }

    false
}

/// First catalog entry, in catalog order, that provides `target_name`.
pub fn find_match<'a>(catalog: &'a [CatalogEntry], target_name: &str) -> Option<&'a CatalogEntry> {
    catalog
        .iter()
        .find(|entry| entry_matches(Some(entry), target_name))
}
