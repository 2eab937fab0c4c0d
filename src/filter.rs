//! Selection filter over service metadata.
//!
//! A service is *selected* when its metadata contains every required key; the
//! values do not matter. Endpoints are visible only through a selected owner.

use crate::Error;
use crate::Metadata;
use crate::MetadataEntry;
use crate::Result;
use crate::Service;

/// Ordered, non-empty set of metadata keys a service must carry to be observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredKeys(Vec<String>);

impl RequiredKeys {
    /// Builds the set, dropping blanks and duplicates while keeping the
    /// first-seen order.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for key in keys {
            let key = key.as_ref().trim();
            if key.is_empty() || ordered.iter().any(|k| k == key) {
                continue;
            }
            ordered.push(key.to_string());
        }

        if ordered.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one required metadata key must be provided".into(),
            ));
        }

        Ok(Self(ordered))
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn is_selected(
        &self,
        metadata: &Metadata,
    ) -> bool {
        self.0.iter().all(|k| metadata.contains_key(k))
    }

    pub fn is_service_selected(
        &self,
        service: &Service,
    ) -> bool {
        self.is_selected(&service.metadata)
    }

    /// Required entries present on the service, in required-key order
    pub fn filter_metadata(
        &self,
        service: &Service,
    ) -> Vec<MetadataEntry> {
        self.0
            .iter()
            .filter_map(|k| service.metadata.get(k).map(|v| MetadataEntry::new(k, v)))
            .collect()
    }

    /// Filtered metadata of `service` if it is present and selected
    pub fn visible_metadata(
        &self,
        service: Option<&Service>,
    ) -> Option<Vec<MetadataEntry>> {
        service
            .filter(|s| self.is_service_selected(s))
            .map(|s| self.filter_metadata(s))
    }
}
