use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::amounts;
use crate::error::AuditFeeError;
use crate::types::Rate;

/// Entity classification of the audit client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientType {
    Listed,
    Public,
    #[default]
    Private,
    Smc,
    Llp,
    /// Section 8 companies and trusts
    Section8,
}

impl ClientType {
    pub const ALL: [ClientType; 6] = [
        ClientType::Listed,
        ClientType::Public,
        ClientType::Private,
        ClientType::Smc,
        ClientType::Llp,
        ClientType::Section8,
    ];

    /// Canonical key written to persisted state.
    pub fn key(&self) -> &'static str {
        match self {
            ClientType::Listed => "listed",
            ClientType::Public => "public",
            ClientType::Private => "private",
            ClientType::Smc => "smc",
            ClientType::Llp => "llp",
            ClientType::Section8 => "section8",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClientType::Listed => "List Company",
            ClientType::Public => "Public Company",
            ClientType::Private => "Private Company",
            ClientType::Smc => "SMC Company",
            ClientType::Llp => "LLP",
            ClientType::Section8 => "Section 8 Company or Trust",
        }
    }

    /// Resolve every accepted spelling (canonical keys, legacy aliases such as
    /// `list` and `trust`, and directory display names) to one variant.
    pub fn normalize(text: &str) -> Option<ClientType> {
        let lowered = text.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        let norm = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
        let kind = match norm.as_str() {
            "list" | "listed" | "list company" | "listed company" => ClientType::Listed,
            "public" | "public company" => ClientType::Public,
            "private" | "private company" => ClientType::Private,
            "smc" | "smc company" => ClientType::Smc,
            "llp" => ClientType::Llp,
            "section8" | "section 8" | "trust" | "section 8 company"
            | "section 8 company or trust" | "section8 company or trust" => ClientType::Section8,
            _ => return None,
        };
        Some(kind)
    }

    /// Lenient boundary conversion: unknown values fall back to `Private`.
    pub fn coerce(text: &str) -> ClientType {
        if text.trim().is_empty() {
            return ClientType::Private;
        }
        ClientType::normalize(text).unwrap_or_else(|| {
            warn!(client_type = text, "invalid client type, defaulting to 'private'");
            ClientType::Private
        })
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ClientType {
    type Err = AuditFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientType::normalize(s).ok_or_else(|| AuditFeeError::InvalidInput {
            field: "client_type".into(),
            reason: format!(
                "unknown client type '{s}' (expected listed, public, private, smc, llp or section8)"
            ),
        })
    }
}

impl Serialize for ClientType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.key())
    }
}

/// Stored state may carry anything under `clientType`; whatever it is
/// becomes a client type, falling back to private.
struct ClientTypeVisitor;

impl ClientTypeVisitor {
    fn unrecognised(shape: &str) -> ClientType {
        warn!(shape, "non-text client type, defaulting to 'private'");
        ClientType::Private
    }
}

impl<'de> Visitor<'de> for ClientTypeVisitor {
    type Value = ClientType;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a client type")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ClientType::coerce(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ClientType::coerce(&v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ClientType::coerce(&v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ClientType::coerce(&v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ClientType::coerce(&v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ClientType::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ClientType::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(ClientTypeVisitor)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(ClientTypeVisitor::unrecognised("array"))
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map
            .next_entry::<de::IgnoredAny, de::IgnoredAny>()?
            .is_some()
        {}
        Ok(ClientTypeVisitor::unrecognised("object"))
    }
}

impl<'de> Deserialize<'de> for ClientType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ClientTypeVisitor)
    }
}

/// Client classification plus the qualitative complexity answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientProfile {
    pub client_type: ClientType,
    pub has_complex_group_structure: bool,
    pub has_international_transactions: bool,
    pub has_regulatory_changes: bool,
    pub has_multiple_branches: bool,
    #[serde(deserialize_with = "amounts::lenient_count::deserialize")]
    pub number_of_branches: u32,
    pub additional_notes: String,
    /// Inflation as entered, in percent (6 = 6%).
    #[serde(rename = "inflationRate", with = "amounts::lenient_opt")]
    pub inflation_rate_pct: Option<Rate>,
}

impl ClientProfile {
    pub fn new(client_type: ClientType) -> Self {
        Self {
            client_type,
            ..Default::default()
        }
    }

    /// Inflation as a decimal rate; blank or negative input counts as zero.
    pub fn inflation_rate(&self) -> Rate {
        match self.inflation_rate_pct {
            Some(pct) if pct > Decimal::ZERO => pct / Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        }
    }

    /// Accepts `None` (clear) or a percentage within 0..=100. Anything else
    /// is ignored and the previous value kept.
    pub fn set_inflation_rate_pct(&mut self, pct: Option<Rate>) -> bool {
        match pct {
            Some(p) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => {
                warn!(inflation_pct = %p, "inflation rate outside 0-100%, keeping previous value");
                false
            }
            _ => {
                self.inflation_rate_pct = pct;
                true
            }
        }
    }

    /// Branches that count towards complexity: zero unless the client
    /// reports multiple branches.
    pub fn effective_branches(&self) -> u32 {
        if self.has_multiple_branches {
            self.number_of_branches
        } else {
            0
        }
    }
}
