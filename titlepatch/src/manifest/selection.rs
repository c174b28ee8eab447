//! Choosing which packages of a manifest to download.

use super::record::UpdateRecord;

/// Which records of a manifest to download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageSelection {
    /// Every package, in manifest order.
    #[default]
    All,
    /// Only the last package listed, which is the newest.
    Latest,
    /// Packages with this version. Leading zeros in each dotted component
    /// are ignored, so `1.2` matches `01.02`.
    Version(String),
}

impl PackageSelection {
    /// Apply the selection, preserving manifest order.
    pub fn apply(&self, records: Vec<UpdateRecord>) -> Vec<UpdateRecord> {
        match self {
            PackageSelection::All => records,
            PackageSelection::Latest => records.into_iter().last().into_iter().collect(),
            PackageSelection::Version(wanted) => {
                let wanted = version_key(wanted);
                records
                    .into_iter()
                    .filter(|r| version_key(&r.version) == wanted)
                    .collect()
            }
        }
    }
}

fn version_key(version: &str) -> Vec<String> {
    version
        .trim()
        .split('.')
        .map(|part| {
            let stripped = part.trim_start_matches('0');
            if stripped.is_empty() && !part.is_empty() {
                "0".to_string()
            } else {
                stripped.to_string()
            }
        })
        .collect()
}
