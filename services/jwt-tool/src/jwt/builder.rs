//! Claim set composition.
//!
//! Stages run in a fixed order and later stages overwrite earlier ones:
//! template, expiry, claims document, random subject, policy, explicit
//! subject.

use crate::error::TokenError;
use crate::jwt::claims::{names, ClaimSet};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;
use uuid::Uuid;

/// Audience stamped by the default template.
pub const DEFAULT_AUDIENCE: &str = "jwt-tool";

/// How the template fills `sub`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectTemplate {
    /// Same subject on every token
    Fixed(String),
    /// Fresh UUID v4 per token
    #[default]
    Uuid,
    /// Build time in Unix nanoseconds
    UnixNanos,
}

/// Base claims every token starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTemplate {
    /// Subject rule
    pub subject: SubjectTemplate,
    /// `aud` value
    pub audience: String,
}

impl Default for ClaimTemplate {
    fn default() -> Self {
        Self {
            subject: SubjectTemplate::default(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

impl ClaimTemplate {
    /// Use a different subject rule.
    #[must_use]
    pub fn with_subject(mut self, subject: SubjectTemplate) -> Self {
        self.subject = subject;
        self
    }

    /// Use a different audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }
}

/// Explicit per-token overrides. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOverrides {
    /// Replaces `sub`, winning over the document and the random subject
    pub subject: Option<String>,
    /// Sets `pol`
    pub policy: Option<String>,
    /// Lifetime such as `1h` or `30m`; adds `exp`
    pub expiry: Option<String>,
    /// Seconds added to the issued-at time, may be negative
    pub iat_offset: i64,
    /// Replace `sub` with a fresh UUID
    pub random_subject: bool,
}

impl ClaimOverrides {
    /// Set the explicit subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    /// Set the expiry duration.
    #[must_use]
    pub fn with_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.expiry = Some(expiry.into());
        self
    }

    /// Shift the issued-at time.
    #[must_use]
    pub const fn with_iat_offset(mut self, seconds: i64) -> Self {
        self.iat_offset = seconds;
        self
    }

    /// Toggle the random subject.
    #[must_use]
    pub const fn with_random_subject(mut self, enabled: bool) -> Self {
        self.random_subject = enabled;
        self
    }
}

/// Composes claim sets from a template, a claims document and overrides.
#[derive(Debug, Clone, Default)]
pub struct ClaimSetBuilder {
    template: ClaimTemplate,
}

impl ClaimSetBuilder {
    /// Builder over the given template.
    #[must_use]
    pub const fn new(template: ClaimTemplate) -> Self {
        Self { template }
    }

    /// The template in use.
    #[must_use]
    pub const fn template(&self) -> &ClaimTemplate {
        &self.template
    }

    /// Build a claim set issued now.
    ///
    /// # Errors
    ///
    /// `InvalidExpiry` when the expiry override does not parse.
    pub fn build(
        &self,
        document: &ClaimSet,
        overrides: &ClaimOverrides,
    ) -> Result<ClaimSet, TokenError> {
        self.build_at(Utc::now(), document, overrides)
    }

    /// Build a claim set issued at `now`.
    ///
    /// # Errors
    ///
    /// `InvalidExpiry` when the expiry override does not parse or overflows.
    pub fn build_at(
        &self,
        now: DateTime<Utc>,
        document: &ClaimSet,
        overrides: &ClaimOverrides,
    ) -> Result<ClaimSet, TokenError> {
        let mut claims = ClaimSet::new();

        claims.insert(names::SUB, self.template_subject(now));
        claims.insert(names::AUD, self.template.audience.as_str());
        claims.insert(names::IAT, now.timestamp().saturating_add(overrides.iat_offset));
        claims.insert(names::JTI, Uuid::new_v4().to_string());

        if let Some(expiry) = non_empty(overrides.expiry.as_deref()) {
            let lifetime = parse_duration(expiry)?;
            let expires = now.checked_add_signed(lifetime).ok_or_else(|| TokenError::InvalidExpiry {
                value: expiry.to_string(),
                reason: "expiry out of range".to_string(),
            })?;
            debug!(expires_at = %expires, "Setting expiry");
            claims.insert(names::EXP, expires.timestamp());
        }

        claims.merge(document);

        if overrides.random_subject {
            claims.insert(names::SUB, Uuid::new_v4().to_string());
        }
        if let Some(policy) = non_empty(overrides.policy.as_deref()) {
            claims.insert(names::POL, policy);
        }
        if let Some(subject) = non_empty(overrides.subject.as_deref()) {
            claims.insert(names::SUB, subject);
        }

        Ok(claims)
    }

    fn template_subject(&self, now: DateTime<Utc>) -> String {
        match &self.template.subject {
            SubjectTemplate::Fixed(subject) => subject.clone(),
            SubjectTemplate::Uuid => Uuid::new_v4().to_string(),
            SubjectTemplate::UnixNanos => now
                .timestamp_nanos_opt()
                .map_or_else(|| now.timestamp().to_string(), |nanos| nanos.to_string()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;

// Longer suffixes first so "ms" is not read as "m".
const UNITS: &[(&str, i128)] = &[
    ("ns", 1),
    ("us", NANOS_PER_MICRO),
    ("µs", NANOS_PER_MICRO),
    ("μs", NANOS_PER_MICRO),
    ("ms", NANOS_PER_MILLI),
    ("s", NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("h", 3_600 * NANOS_PER_SECOND),
];

/// Parse a duration such as `90s`, `1h30m`, `1.5h` or `-10m`.
///
/// # Errors
///
/// `InvalidExpiry` for empty input, a missing or unknown unit, or overflow.
pub fn parse_duration(input: &str) -> Result<TimeDelta, TokenError> {
    let invalid = |reason: &str| TokenError::InvalidExpiry {
        value: input.to_string(),
        reason: reason.to_string(),
    };

    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);
        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let (unit, scale) = UNITS
            .iter()
            .find(|(suffix, _)| after_number.starts_with(suffix))
            .ok_or_else(|| invalid("missing or unknown unit"))?;
        rest = &after_number[unit.len()..];

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("number out of range"))?
        };
        let mut component = whole.checked_mul(*scale).ok_or_else(|| invalid("duration out of range"))?;

        // Digits past nanosecond precision cannot contribute.
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let frac: i128 = frac_digits.parse().map_err(|_| invalid("bad fraction"))?;
            let divisor = 10_i128.pow(u32::try_from(frac_digits.len()).unwrap_or(18));
            component += frac * scale / divisor;
        }

        total = total.checked_add(component).ok_or_else(|| invalid("duration out of range"))?;
    }

    if negative {
        total = -total;
    }
    let nanos = i64::try_from(total).map_err(|_| invalid("duration out of range"))?;
    Ok(TimeDelta::nanoseconds(nanos))
}
