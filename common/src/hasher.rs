// Bcrypt password hashing and verification
// Hashes are self-describing: $<version>$<cost>$<22-char salt><31-char digest>

use crate::config::HasherConfig;
use crate::errors::HashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Lowest work factor accepted by bcrypt
pub const MIN_COST: u32 = 4;

/// Highest work factor accepted by bcrypt
pub const MAX_COST: u32 = 31;

/// Work factor used when nothing else is configured
pub const DEFAULT_COST: u32 = 10;

/// Bcrypt only mixes the first 72 bytes of the password into the digest
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Length of the encoded salt in the bcrypt base-64 alphabet
pub const SALT_LEN: usize = 22;

/// Length of the encoded digest in the bcrypt base-64 alphabet
pub const DIGEST_LEN: usize = 31;

/// Total length of an encoded hash string
pub const ENCODED_HASH_LEN: usize = 7 + SALT_LEN + DIGEST_LEN;

/// Bcrypt version tag written into the encoded hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashVersion {
    #[serde(rename = "2a")]
    TwoA,
    #[default]
    #[serde(rename = "2b")]
    TwoB,
    #[serde(rename = "2y")]
    TwoY,
}

impl HashVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashVersion::TwoA => "2a",
            HashVersion::TwoB => "2b",
            HashVersion::TwoY => "2y",
        }
    }

    fn to_bcrypt(self) -> bcrypt::Version {
        match self {
            HashVersion::TwoA => bcrypt::Version::TwoA,
            HashVersion::TwoB => bcrypt::Version::TwoB,
            HashVersion::TwoY => bcrypt::Version::TwoY,
        }
    }
}

impl fmt::Display for HashVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2a" => Ok(HashVersion::TwoA),
            "2b" => Ok(HashVersion::TwoB),
            "2y" => Ok(HashVersion::TwoY),
            other => Err(format!("unsupported bcrypt version '{}'", other)),
        }
    }
}

/// What to do with passwords longer than [`MAX_PASSWORD_BYTES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Fail with `HashError::InvalidInput`
    #[default]
    Reject,
    /// Cut to the limit on a UTF-8 character boundary
    Truncate,
}

impl FromStr for TruncationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(TruncationPolicy::Reject),
            "truncate" => Ok(TruncationPolicy::Truncate),
            other => Err(format!("unknown truncation policy '{}'", other)),
        }
    }
}

/// The parsed components of an encoded bcrypt hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedHash {
    pub version: HashVersion,
    pub cost: u32,
    pub salt: String,
    pub digest: String,
}

impl EncodedHash {
    /// Parse an encoded hash string, rejecting anything that is not a well-formed
    /// `$2a$`, `$2b$` or `$2y$` hash
    pub fn parse(encoded: &str) -> Result<Self, HashError> {
        let rest = encoded
            .strip_prefix('$')
            .ok_or_else(|| HashError::MalformedHash("missing leading '$'".to_string()))?;

        let mut parts = rest.splitn(3, '$');

        let version = parts
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| HashError::MalformedHash("missing version tag".to_string()))?
            .parse::<HashVersion>()
            .map_err(HashError::MalformedHash)?;

        let cost_field = parts
            .next()
            .ok_or_else(|| HashError::MalformedHash("missing cost field".to_string()))?;
        if cost_field.len() != 2 || !cost_field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HashError::MalformedHash(format!(
                "cost field '{}' is not two digits",
                cost_field
            )));
        }
        let cost: u32 = cost_field
            .parse()
            .map_err(|e| HashError::MalformedHash(format!("cost field: {}", e)))?;
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(HashError::MalformedHash(format!(
                "cost {} outside {}..={}",
                cost, MIN_COST, MAX_COST
            )));
        }

        let payload = parts
            .next()
            .ok_or_else(|| HashError::MalformedHash("missing salt and digest".to_string()))?;
        if payload.len() != SALT_LEN + DIGEST_LEN {
            return Err(HashError::MalformedHash(format!(
                "salt and digest must be {} characters, got {}",
                SALT_LEN + DIGEST_LEN,
                payload.len()
            )));
        }
        if let Some(bad) = payload.chars().find(|c| !is_bcrypt_base64(*c)) {
            return Err(HashError::MalformedHash(format!(
                "invalid character '{}' in salt or digest",
                bad
            )));
        }

        Ok(Self {
            version,
            cost,
            salt: payload[..SALT_LEN].to_string(),
            digest: payload[SALT_LEN..].to_string(),
        })
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${:02}${}{}",
            self.version, self.cost, self.salt, self.digest
        )
    }
}

impl FromStr for EncodedHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_bcrypt_base64(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '/'
}

/// Check that a work factor is within the range bcrypt supports
pub fn validate_cost(cost: u32) -> Result<u32, HashError> {
    if (MIN_COST..=MAX_COST).contains(&cost) {
        Ok(cost)
    } else {
        Err(HashError::InvalidCost {
            cost,
            min: MIN_COST,
            max: MAX_COST,
        })
    }
}

/// Stateless bcrypt hasher
///
/// Holds only the work factor, output version and truncation policy, so a single
/// instance can be shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
    version: HashVersion,
    truncation: TruncationPolicy,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
            version: HashVersion::default(),
            truncation: TruncationPolicy::default(),
        }
    }
}

impl PasswordHasher {
    /// Create a hasher, validating the work factor up front
    pub fn new(
        cost: u32,
        version: HashVersion,
        truncation: TruncationPolicy,
    ) -> Result<Self, HashError> {
        Ok(Self {
            cost: validate_cost(cost)?,
            version,
            truncation,
        })
    }

    /// Create a hasher with the default version and truncation policy
    pub fn with_cost(cost: u32) -> Result<Self, HashError> {
        Self::new(cost, HashVersion::default(), TruncationPolicy::default())
    }

    pub fn from_config(config: &HasherConfig) -> Result<Self, HashError> {
        Self::new(config.cost, config.version, config.truncation)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn version(&self) -> HashVersion {
        self.version
    }

    pub fn truncation(&self) -> TruncationPolicy {
        self.truncation
    }

    /// Hash a plaintext with a freshly generated random salt
    ///
    /// # Errors
    /// - `HashError::InvalidInput` if the plaintext contains a NUL byte or exceeds
    ///   72 bytes under the `reject` policy
    /// - `HashError::DependencyUnavailable` if the random source fails
    #[instrument(skip(self, plaintext), fields(cost = self.cost, version = %self.version))]
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let input = self.prepare(plaintext)?;
        if input.len() < plaintext.len() {
            warn!(
                original_len = plaintext.len(),
                truncated_len = input.len(),
                "Password truncated to bcrypt limit"
            );
        }

        let parts = bcrypt::hash_with_result(input, self.cost)?;
        let encoded = parts.format_for_version(self.version.to_bcrypt());

        debug!(len = encoded.len(), "Password hashed");
        Ok(encoded)
    }

    /// Hash raw bytes, which must be valid UTF-8
    pub fn hash_bytes(&self, plaintext: &[u8]) -> Result<String, HashError> {
        let text = std::str::from_utf8(plaintext)
            .map_err(|e| HashError::InvalidInput(format!("password is not valid UTF-8: {}", e)))?;
        self.hash(text)
    }

    /// Check a candidate plaintext against an encoded hash
    ///
    /// The salt and cost come from the hash itself; the digest comparison is
    /// constant-time.
    ///
    /// # Errors
    /// - `HashError::MalformedHash` if `encoded` does not parse
    /// - `HashError::InvalidInput` under the same rules as [`PasswordHasher::hash`]
    #[instrument(skip(self, plaintext, encoded))]
    pub fn verify(&self, plaintext: &str, encoded: &str) -> Result<bool, HashError> {
        let parsed = EncodedHash::parse(encoded)?;
        let input = self.prepare(plaintext)?;

        let matches = bcrypt::verify(input, encoded)?;

        debug!(
            cost = parsed.cost,
            version = %parsed.version,
            matches,
            "Password verified"
        );
        Ok(matches)
    }

    /// True if `encoded` was produced with a different cost or version than this
    /// hasher would use now
    pub fn needs_rehash(&self, encoded: &str) -> Result<bool, HashError> {
        let parsed = EncodedHash::parse(encoded)?;
        Ok(parsed.cost != self.cost || parsed.version != self.version)
    }

    fn prepare<'a>(&self, plaintext: &'a str) -> Result<&'a str, HashError> {
        if plaintext.contains('\0') {
            return Err(HashError::InvalidInput(
                "password must not contain NUL bytes".to_string(),
            ));
        }

        if plaintext.len() <= MAX_PASSWORD_BYTES {
            return Ok(plaintext);
        }

        match self.truncation {
            TruncationPolicy::Reject => Err(HashError::InvalidInput(format!(
                "password is {} bytes, bcrypt accepts at most {}",
                plaintext.len(),
                MAX_PASSWORD_BYTES
            ))),
            TruncationPolicy::Truncate => {
                let mut end = MAX_PASSWORD_BYTES;
                while !plaintext.is_char_boundary(end) {
                    end -= 1;
                }
                Ok(&plaintext[..end])
            }
        }
    }
}

/// Hash with the given cost using default version and truncation policy
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, HashError> {
    PasswordHasher::with_cost(cost)?.hash(plaintext)
}

/// Verify a plaintext against an encoded hash using the default truncation policy
pub fn verify_password(plaintext: &str, encoded: &str) -> Result<bool, HashError> {
    PasswordHasher::default().verify(plaintext, encoded)
}
