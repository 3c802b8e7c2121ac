use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::counter::decode_base36;
use crate::date::{self, leading_digits};
use crate::error::{Error, Result};
use crate::resource::Resources;
use crate::verify::{Verifier, VerifierConfig};
use crate::{digest, leading_zero_bits, Minter, STAMP_VERSION};

const FIELDS: usize = 7;

/// A parsed or freshly minted hashcash stamp.
///
/// The stamp keeps the exact line it was built from; `text()` returns it
/// unchanged, so a parsed stamp hashes the same bytes that were received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stamp {
    version: u32,
    bits: u32,
    date: DateTime<Utc>,
    resource: String,
    extension: String,
    random: String,
    counter: String,
    text: String,
}

impl Stamp {
    /// Mint a stamp for `resource` dated now, worth `bits` (default 20) zero bits.
    pub fn mint(resource: impl Into<String>, bits: Option<u32>) -> Result<Self> {
        let minter = Minter::builder()
            .bits(bits.unwrap_or(crate::DEFAULT_BITS))
            .build_validated()?;
        let resource: String = resource.into();
        minter.mint(&resource)
    }

    /// Mint a stamp carrying an explicit issuance date.
    pub fn mint_at(
        resource: impl Into<String>,
        bits: Option<u32>,
        date: DateTime<Utc>,
    ) -> Result<Self> {
        let minter = Minter::builder()
            .bits(bits.unwrap_or(crate::DEFAULT_BITS))
            .build_validated()?;
        let resource: String = resource.into();
        minter.mint_at(&resource, date)
    }

    /// Assemble a stamp from its fields. The date must already be representable.
    pub(crate) fn from_parts(
        bits: u32,
        date: DateTime<Utc>,
        resource: String,
        extension: String,
        random: String,
        counter: String,
    ) -> Self {
        let text = format!(
            "{STAMP_VERSION}:{bits}:{}:{resource}:{extension}:{random}:{counter}",
            date::format_date(&date)
        );
        Stamp {
            version: STAMP_VERSION,
            bits,
            date,
            resource,
            extension,
            random,
            counter,
            text,
        }
    }

    /// Parse a stamp line received from an untrusted party.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(':').collect();
        if fields.len() != FIELDS {
            return Err(Error::Format(format!(
                "expected {FIELDS} fields, found {}",
                fields.len()
            )));
        }

        let version: u32 = fields[0]
            .parse()
            .map_err(|_| Error::Format(format!("version {:?} is not an integer", fields[0])))?;
        if version != STAMP_VERSION {
            return Err(Error::Version(version));
        }
        let bits = leading_digits(fields[1]);
        let date = date::parse_date(fields[2])?;

        Ok(Stamp {
            version,
            bits,
            date,
            resource: fields[3].to_owned(),
            extension: fields[4].to_owned(),
            random: fields[5].to_owned(),
            counter: fields[6].to_owned(),
            text: text.to_owned(),
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Difficulty the stamp claims. Not checked until verification.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn random(&self) -> &str {
        &self.random
    }

    pub fn counter(&self) -> &str {
        &self.counter
    }

    /// Numeric value of the counter, if it is valid base-36 that fits a `u64`.
    pub fn counter_value(&self) -> Option<u64> {
        decode_base36(&self.counter)
    }

    /// The canonical stamp line.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn digest(&self) -> [u8; 20] {
        digest(self.text.as_bytes())
    }

    /// Hex form of the digest for logs.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    /// Number of leading zero bits the stamp actually carries.
    pub fn zero_bits(&self) -> u32 {
        leading_zero_bits(&self.digest())
    }

    /// Whether the stamp carries at least the difficulty it claims.
    pub fn claimed_bits_met(&self) -> bool {
        self.zero_bits() >= self.bits
    }

    /// Verify against the system clock with the default two-day window.
    pub fn verify<'a>(&self, resources: impl Into<Resources<'a>>, bits: u32) -> Result<()> {
        self.verify_at(resources, bits, Utc::now())
    }

    /// Verify as of `now`.
    pub fn verify_at<'a>(
        &self,
        resources: impl Into<Resources<'a>>,
        bits: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let config = VerifierConfig {
            required_bits: bits,
            ..VerifierConfig::default()
        };
        Verifier::check(self, &resources.into(), &config, now)
    }
}

impl FromStr for Stamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stamp::parse(s)
    }
}

impl Display for Stamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Stamp {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Serialize for Stamp {
    /// Serialize as the stamp line, the only form stamps travel in.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Stamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Stamp::parse(&text).map_err(serde::de::Error::custom)
    }
}
