//! Supported install distributions and where their images come from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::QvmError;

/// A distribution qvm knows how to fetch an installer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Distribution {
    Debian,
    Ubuntu,
}

impl Distribution {
    pub const ALL: [Distribution; 2] = [Distribution::Debian, Distribution::Ubuntu];

    pub fn name(self) -> &'static str {
        match self {
            Distribution::Debian => "debian",
            Distribution::Ubuntu => "ubuntu",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Distribution {
    type Err = QvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Distribution::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| QvmError::UnsupportedDistribution {
                name: s.to_string(),
            })
    }
}

/// Local cache filename and download URL for one distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub filename: &'static str,
    pub url: &'static str,
}

/// Immutable distribution lookup table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<Distribution, CatalogEntry>,
}

impl Catalog {
    /// The built-in table. The download URLs do not point at the exact
    /// releases named by the filenames; both are kept as shipped.
    pub fn builtin() -> Self {
        let entries = BTreeMap::from([
            (
                Distribution::Debian,
                CatalogEntry {
                    filename: "debian-10.13.0-amd64-xfce-CD-1.iso",
                    url: "https://cdimage.debian.org/cdimage/archive/10.4.0-live/amd64/iso-hybrid/debian-live-10.4.0-amd64-standard.iso",
                },
            ),
            (
                Distribution::Ubuntu,
                CatalogEntry {
                    filename: "ubuntu-20.04.3-live-server-amd64.iso",
                    url: "https://releases.ubuntu.com/focal/ubuntu-20.04.6-desktop-amd64.iso",
                },
            ),
        ]);
        Self { entries }
    }

    pub fn entry(&self, dist: Distribution) -> Option<&CatalogEntry> {
        self.entries.get(&dist)
    }

    /// Look up a distribution by its user-supplied name.
    pub fn lookup(&self, name: &str) -> Result<(Distribution, &CatalogEntry), QvmError> {
        let dist = name.parse::<Distribution>()?;
        self.entry(dist)
            .map(|e| (dist, e))
            .ok_or_else(|| QvmError::UnsupportedDistribution {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Distribution, &CatalogEntry)> {
        self.entries.iter().map(|(d, e)| (*d, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("debian".parse::<Distribution>().unwrap(), Distribution::Debian);
        assert_eq!("ubuntu".parse::<Distribution>().unwrap(), Distribution::Ubuntu);
    }

    #[test]
    fn test_parse_is_exact() {
        for bad in ["Debian", "fedora", "", " ubuntu"] {
            let err = bad.parse::<Distribution>().unwrap_err();
            assert_eq!(err.to_string(), "Distribution not supported");
        }
    }

    #[test]
    fn test_builtin_covers_every_distribution() {
        let catalog = Catalog::builtin();
        for dist in Distribution::ALL {
            let entry = catalog.entry(dist).unwrap();
            assert!(entry.filename.ends_with(".iso"));
            assert!(entry.url.starts_with("https://"));
        }
        assert_eq!(catalog.iter().count(), Distribution::ALL.len());
    }

    #[test]
    fn test_lookup_filenames() {
        let catalog = Catalog::builtin();
        let (_, debian) = catalog.lookup("debian").unwrap();
        assert_eq!(debian.filename, "debian-10.13.0-amd64-xfce-CD-1.iso");
        let (_, ubuntu) = catalog.lookup("ubuntu").unwrap();
        assert_eq!(ubuntu.filename, "ubuntu-20.04.3-live-server-amd64.iso");
        assert_eq!(
            catalog.lookup("arch").unwrap_err(),
            QvmError::UnsupportedDistribution {
                name: "arch".to_string()
            }
        );
    }
}
