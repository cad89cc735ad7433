//! Corporate link records as they move between stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record linking a third-party platform identity to a corporate identity.
///
/// `third_party_id` is the natural key: destination conflict lookups are
/// made by it. Field names serialize in camelCase so the record round-trips
/// unchanged between every store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateLink {
    /// Stable identifier on the third-party platform.
    pub third_party_id: String,
    /// Username on the third-party platform (may change over time).
    pub third_party_username: String,
    /// Corporate directory identifier; empty when unknown.
    #[serde(default)]
    pub corporate_id: String,
    /// Corporate username (user principal name).
    pub corporate_username: String,
    /// Whether the link belongs to a service account.
    #[serde(default)]
    pub is_service_account: bool,
}

impl CorporateLink {
    /// Returns `true` when the corporate id is missing and must be resolved
    /// before the link can be written to a destination.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.corporate_id.trim().is_empty()
    }
}

impl fmt::Display for CorporateLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> {}",
            self.third_party_id, self.third_party_username, self.corporate_username
        )?;
        if !self.is_incomplete() {
            write!(f, " [{}]", self.corporate_id)?;
        }
        Ok(())
    }
}

/// A link as held by a store, together with the store-generated id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLink {
    /// Identifier assigned by the store on creation.
    pub id: String,
    /// The link itself.
    #[serde(flatten)]
    pub link: CorporateLink,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(corporate_id: &str) -> CorporateLink {
        CorporateLink {
            third_party_id: "42".into(),
            third_party_username: "octocat".into(),
            corporate_id: corporate_id.into(),
            corporate_username: "octo@corp".into(),
            is_service_account: false,
        }
    }

    #[test]
    fn empty_or_blank_corporate_id_is_incomplete() {
        assert!(link("").is_incomplete());
        assert!(link("   ").is_incomplete());
        assert!(!link("C1").is_incomplete());
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(link("C1")).unwrap();
        assert_eq!(json["thirdPartyId"], "42");
        assert_eq!(json["corporateUsername"], "octo@corp");
        assert_eq!(json["isServiceAccount"], false);
    }

    #[test]
    fn missing_optional_fields_default() {
        let parsed: CorporateLink = serde_json::from_str(
            r#"{"thirdPartyId":"7","thirdPartyUsername":"u","corporateUsername":"u@corp"}"#,
        )
        .unwrap();
        assert!(parsed.is_incomplete());
        assert!(!parsed.is_service_account);
    }

    #[test]
    fn stored_link_flattens_fields() {
        let stored = StoredLink { id: "abc".into(), link: link("C1") };
        let yaml = serde_yaml::to_string(&stored).unwrap();
        assert!(yaml.contains("id: abc"));
        assert!(yaml.contains("thirdPartyId:"));
        assert!(!yaml.contains("link:"));
    }

    #[test]
    fn display_includes_corporate_id_when_known() {
        assert_eq!(link("C1").to_string(), "42 (octocat) -> octo@corp [C1]");
        assert_eq!(link("").to_string(), "42 (octocat) -> octo@corp");
    }
}
