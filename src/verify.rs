use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::provider::{Clock, SystemClock};
use crate::resource::Resources;
use crate::{meets_leading_zero_bits, Stamp, DEFAULT_BITS, DEFAULT_MAX_SKEW, DIGEST_BITS};

/// Policy applied by a [`Verifier`].
///
/// `required_bits` is the verifier's own demand; the difficulty a stamp
/// claims for itself plays no part in verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub required_bits: u32,
    /// Largest accepted distance, in either direction, between stamp date and now.
    pub max_skew: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            required_bits: DEFAULT_BITS,
            max_skew: DEFAULT_MAX_SKEW,
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.required_bits > DIGEST_BITS {
            return Err(Error::InvalidConfig(format!(
                "required_bits must be <= {DIGEST_BITS}"
            )));
        }
        if self.max_skew < Duration::from_secs(1) {
            return Err(Error::InvalidConfig(
                "max_skew must be at least 1 second".into(),
            ));
        }
        // Stamp dates have second precision.
        if self.max_skew.subsec_nanos() != 0 {
            return Err(Error::InvalidConfig(
                "max_skew must be a whole number of seconds".into(),
            ));
        }
        Ok(())
    }
}

/// Stamp verifier with an injected clock and runtime-adjustable policy.
#[derive(Debug)]
pub struct Verifier {
    config: RwLock<VerifierConfig>,
    clock: Arc<dyn Clock>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            config: RwLock::new(VerifierConfig::default()),
            clock: Arc::new(SystemClock),
        }
    }
}

impl Verifier {
    pub fn new(config: VerifierConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
            clock,
        })
    }

    pub fn config(&self) -> VerifierConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Update verifier configuration at runtime.
    pub fn set_config(&self, new_config: VerifierConfig) -> Result<()> {
        new_config.validate()?;
        let mut guard = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = new_config;
        Ok(())
    }

    /// Verify a stamp against the accepted resources using this verifier's clock and policy.
    pub fn verify<'a>(&self, stamp: &Stamp, resources: impl Into<Resources<'a>>) -> Result<()> {
        let config = self.config();
        Self::check(stamp, &resources.into(), &config, self.clock.now())
    }

    /// Parse and verify a stamp line in one step.
    pub fn verify_text<'a>(
        &self,
        text: &str,
        resources: impl Into<Resources<'a>>,
    ) -> Result<Stamp> {
        let stamp = Stamp::parse(text)?;
        self.verify(&stamp, resources)?;
        Ok(stamp)
    }

    /// Resource, time-window and difficulty checks, in that order.
    pub(crate) fn check(
        stamp: &Stamp,
        resources: &Resources<'_>,
        config: &VerifierConfig,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !resources.contains(stamp.resource()) {
            trace!(resource = stamp.resource(), "stamp resource not accepted");
            return Err(Error::ResourceMismatch);
        }

        let skew = now.signed_duration_since(stamp.date()).num_seconds().unsigned_abs();
        if skew > config.max_skew.as_secs() {
            trace!(skew, date = %stamp.date(), "stamp outside time window");
            return Err(Error::Expired);
        }

        let digest = stamp.digest();
        if !meets_leading_zero_bits(&digest, config.required_bits) {
            trace!(
                required = config.required_bits,
                digest = %hex::encode(digest),
                "stamp lacks required zero bits"
            );
            return Err(Error::InsufficientWork {
                required: config.required_bits,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FixedClock, FixedRandomSource};
    use crate::Minter;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()
    }

    fn stamp(resource: &str, bits: u32) -> Stamp {
        Minter::builder()
            .bits(bits)
            .random(Arc::new(FixedRandomSource::new(b"verify".to_vec())))
            .clock(Arc::new(FixedClock(at())))
            .build_validated()
            .expect("build minter")
            .mint(resource)
            .expect("mint")
    }

    fn verifier(required_bits: u32) -> Verifier {
        let config = VerifierConfig {
            required_bits,
            ..VerifierConfig::default()
        };
        Verifier::new(config, Arc::new(FixedClock(at()))).expect("valid config")
    }

    #[test]
    fn default_config_is_twenty_bits_two_days() {
        let config = VerifierConfig::default();
        assert_eq!(config.required_bits, 20);
        assert_eq!(config.max_skew, Duration::from_secs(172_800));
        config.validate().expect("default config is valid");
    }

    #[test]
    fn config_validation() {
        let bad_skew = VerifierConfig {
            max_skew: Duration::from_millis(1500),
            ..VerifierConfig::default()
        };
        assert!(matches!(bad_skew.validate(), Err(Error::InvalidConfig(_))));
        let zero_skew = VerifierConfig {
            max_skew: Duration::ZERO,
            ..VerifierConfig::default()
        };
        assert!(matches!(zero_skew.validate(), Err(Error::InvalidConfig(_))));
        let too_many_bits = VerifierConfig {
            required_bits: 161,
            ..VerifierConfig::default()
        };
        assert!(matches!(too_many_bits.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn accepts_fresh_stamp_for_listed_resource() {
        let s = stamp("carol@example.org", 6);
        let v = verifier(6);
        v.verify(&s, "carol@example.org").expect("single resource");
        v.verify(&s, &["dave@example.org", "carol@example.org"])
            .expect("resource set");
    }

    #[test]
    fn resource_check_runs_first() {
        let s = stamp("carol@example.org", 1);
        let v = verifier(150);
        assert_eq!(v.verify(&s, "mallory@example.org"), Err(Error::ResourceMismatch));
    }

    #[test]
    fn time_check_runs_before_work_check() {
        let s = stamp("carol@example.org", 1);
        let later = at() + chrono::Duration::days(3);
        let v = Verifier::new(
            VerifierConfig {
                required_bits: 150,
                ..VerifierConfig::default()
            },
            Arc::new(FixedClock(later)),
        )
        .expect("valid config");
        assert_eq!(v.verify(&s, "carol@example.org"), Err(Error::Expired));
    }

    #[test]
    fn narrower_window_is_honoured() {
        let s = stamp("r", 1);
        let v = Verifier::new(
            VerifierConfig {
                required_bits: 1,
                max_skew: Duration::from_secs(60),
            },
            Arc::new(FixedClock(at() + chrono::Duration::seconds(61))),
        )
        .expect("valid config");
        assert_eq!(v.verify(&s, "r"), Err(Error::Expired));
    }

    #[test]
    fn set_config_changes_policy() {
        let s = stamp("r", 4);
        let v = verifier(4);
        v.verify(&s, "r").expect("meets 4 bits");
        let required = s.zero_bits() + 1;
        v.set_config(VerifierConfig {
            required_bits: required,
            ..VerifierConfig::default()
        })
        .expect("valid config");
        assert_eq!(v.verify(&s, "r"), Err(Error::InsufficientWork { required }));
        assert!(v
            .set_config(VerifierConfig {
                max_skew: Duration::ZERO,
                ..VerifierConfig::default()
            })
            .is_err());
        assert_eq!(v.config().required_bits, required);
    }

    #[test]
    fn verify_text_parses_then_checks() {
        let s = stamp("r", 3);
        let v = verifier(3);
        let parsed = v.verify_text(s.text(), "r").expect("verify text");
        assert_eq!(parsed, s);
        assert_eq!(v.verify_text("2:3:250110:r::x:0", "r"), Err(Error::Version(2)));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = VerifierConfig {
            required_bits: 24,
            max_skew: Duration::from_secs(3600),
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: VerifierConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
