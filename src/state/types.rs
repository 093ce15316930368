//! Core value types for packages reported by the package service.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

/// Classification code attached to every package the service reports.
///
/// Carried through unmodified; the panel never branches on it except to
/// render it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PackageInfo {
    /// Package is installed.
    Installed,
    /// Package is available for installation.
    Available,
    /// Low priority update.
    Low,
    /// Enhancement update.
    Enhancement,
    /// Normal update.
    Normal,
    /// Bugfix update.
    Bugfix,
    /// Important update.
    Important,
    /// Security update.
    Security,
    /// Update is blocked.
    Blocked,
    /// Package is being removed by the current transaction.
    Removing,
    /// Package is being installed by the current transaction.
    Installing,
    /// Any other label, kept verbatim.
    Unknown(String),
}

impl PackageInfo {
    /// What: Map a service label (e.g. `"Installed"`) onto a known code.
    ///
    /// Inputs:
    /// - `label`: Raw label, possibly padded.
    ///
    /// Output:
    /// - Matching variant, or `Unknown` holding the trimmed label.
    ///
    /// Details:
    /// - Matching is case-insensitive.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "installed" => Self::Installed,
            "available" => Self::Available,
            "low" => Self::Low,
            "enhancement" => Self::Enhancement,
            "normal" => Self::Normal,
            "bugfix" | "bug fix" => Self::Bugfix,
            "important" => Self::Important,
            "security" => Self::Security,
            "blocked" => Self::Blocked,
            "removing" | "removed" => Self::Removing,
            "installing" => Self::Installing,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    /// Stable lowercase name of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Installed => "installed",
            Self::Available => "available",
            Self::Low => "low",
            Self::Enhancement => "enhancement",
            Self::Normal => "normal",
            Self::Bugfix => "bugfix",
            Self::Important => "important",
            Self::Security => "security",
            Self::Blocked => "blocked",
            Self::Removing => "removing",
            Self::Installing => "installing",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Serialize for PackageInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One streamed result of a service transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageFound {
    /// Classification code.
    pub info: PackageInfo,
    /// Composite `name;version;arch;origin` identifier.
    pub package_id: String,
    /// Human description, possibly multi-line.
    pub summary: String,
}

impl PackageFound {
    /// Convenience constructor used by backends and tests.
    #[must_use]
    pub fn new(info: PackageInfo, package_id: &str, summary: &str) -> Self {
        Self {
            info,
            package_id: package_id.to_string(),
            summary: summary.to_string(),
        }
    }
}

/// A package as known to the package manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// Raw composite identifier; unique within a snapshot.
    pub id: String,
    /// Display name (first `;` field of `id`).
    pub name: String,
    /// Version (second field).
    pub version: String,
    /// Architecture (third field).
    pub arch: String,
    /// Human description as reported.
    pub summary: String,
    /// Classification code, unmodified.
    pub info: PackageInfo,
}

impl PackageRecord {
    /// What: Build a record from a streamed service result.
    ///
    /// Inputs:
    /// - `found`: Result carrying the composite id.
    ///
    /// Output:
    /// - Record whose `name`/`version`/`arch` are the first three `;` fields.
    ///
    /// Details:
    /// - Missing fields become empty strings; the raw id is kept as `id`.
    #[must_use]
    pub fn from_found(found: PackageFound) -> Self {
        let mut fields = found.package_id.split(';');
        let name = fields.next().unwrap_or_default().to_string();
        let version = fields.next().unwrap_or_default().to_string();
        let arch = fields.next().unwrap_or_default().to_string();
        Self {
            id: found.package_id,
            name,
            version,
            arch,
            summary: found.summary,
            info: found.info,
        }
    }

    /// First line of the summary; the only part shown in listings.
    #[must_use]
    pub fn summary_line(&self) -> &str {
        self.summary.lines().next().unwrap_or_default()
    }
}

/// Installed-package snapshot contents, keyed by package id.
pub type PackageMap = HashMap<String, PackageRecord>;

/// A remote search result annotated with its installed state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// The package found.
    #[serde(flatten)]
    pub record: PackageRecord,
    /// Whether the same id is present in the installed store.
    pub is_installed: bool,
}

/// Remote search results keyed by package id.
pub type HitMap = HashMap<String, SearchHit>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Ensure composite ids split into name, version and arch while the raw id is kept.
    ///
    /// Inputs:
    /// - `PackageFound` with id `vim;8.2;x86_64;fedora`.
    ///
    /// Output:
    /// - Record fields match the first three segments; `id` is unchanged.
    fn record_splits_composite_id() {
        let rec = PackageRecord::from_found(PackageFound::new(
            PackageInfo::Installed,
            "vim;8.2;x86_64;fedora",
            "Vi IMproved\nlonger text",
        ));
        assert_eq!(rec.id, "vim;8.2;x86_64;fedora");
        assert_eq!(rec.name, "vim");
        assert_eq!(rec.version, "8.2");
        assert_eq!(rec.arch, "x86_64");
        assert_eq!(rec.summary_line(), "Vi IMproved");
    }

    #[test]
    /// What: Short ids leave the missing fields empty instead of failing.
    fn record_tolerates_short_ids() {
        let rec = PackageRecord::from_found(PackageFound::new(PackageInfo::Available, "bare", ""));
        assert_eq!(rec.name, "bare");
        assert!(rec.version.is_empty());
        assert!(rec.arch.is_empty());
        assert_eq!(rec.summary_line(), "");
    }

    #[test]
    /// What: Labels map case-insensitively and unknown labels survive verbatim.
    fn info_labels_round_trip_through_known_codes() {
        assert_eq!(PackageInfo::from_label(" Installed "), PackageInfo::Installed);
        assert_eq!(PackageInfo::from_label("SECURITY"), PackageInfo::Security);
        let odd = PackageInfo::from_label("Obsoleting");
        assert_eq!(odd, PackageInfo::Unknown("Obsoleting".into()));
        assert_eq!(odd.as_str(), "Obsoleting");
    }

    #[test]
    /// What: Search hits serialize flat with the installed marker alongside record fields.
    fn hit_serializes_flat() {
        let hit = SearchHit {
            record: PackageRecord::from_found(PackageFound::new(
                PackageInfo::Available,
                "htop;3.3;x86_64;updates",
                "Interactive process viewer",
            )),
            is_installed: false,
        };
        let v = serde_json::to_value(&hit).expect("serialize");
        assert_eq!(v["name"], "htop");
        assert_eq!(v["info"], "available");
        assert_eq!(v["is_installed"], false);
    }
}
