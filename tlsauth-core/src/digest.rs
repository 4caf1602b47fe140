use core::fmt;
use core::str::FromStr;

use crate::ConfigError;

/// Hash function paired with the signature scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DigestAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 4] = [
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    /// Names are matched case-insensitively, so both `sha256` and `SHA256` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnsupportedDigest(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::DigestAlgorithm;
    use crate::ConfigError;

    #[test]
    fn parse_names() {
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("SHA512".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha512);
        for d in DigestAlgorithm::ALL {
            assert_eq!(d.to_string().parse::<DigestAlgorithm>().unwrap(), d);
        }
    }

    #[test]
    fn unsupported() {
        for name in ["md5", "sha1", "sha3-256", "", "sha 256"] {
            let err = name.parse::<DigestAlgorithm>().unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedDigest(n) if n == name));
        }
    }

    #[test]
    fn default_is_sha256() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha256);
    }
}
