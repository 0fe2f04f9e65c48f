//! Consent signal aggregation.
//!
//! Consent reaches the adapter through two channels: the consent objects the
//! host's consent management modules populate (GDPR/TCF and GPP), and the
//! `regs` extension of the first-party request data, which infrastructure
//! fills in when the consent API was never called on the page. The direct
//! signal always wins; the extension is consulted per field.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

/// GDPR/TCF signal as reported by the host's consent module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GdprConsent {
    #[serde(default)]
    pub gdpr_applies: Option<bool>,
    #[serde(default)]
    pub consent_string: Option<String>,
}

/// GPP signal as reported by the host's consent module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GppConsent {
    #[serde(default)]
    pub gpp_string: Option<String>,
    #[serde(default)]
    pub applicable_sections: Option<Vec<i32>>,
}

/// GPP section ids carried by the regulatory extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GppSid {
    List(Vec<i32>),
    Text(String),
}

impl fmt::Display for GppSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GppSid::List(ids) => f.write_str(&join_section_ids(ids)),
            GppSid::Text(text) => f.write_str(text),
        }
    }
}

/// Regulatory extension (`ortb2.regs`) with fallback GPP values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegsExtension {
    #[serde(default)]
    pub gpp: Option<String>,
    #[serde(default)]
    pub gpp_sid: Option<GppSid>,
}

/// Consent and regulatory signals shared by every slot in one auction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionContext {
    #[serde(default)]
    pub gdpr_consent: Option<GdprConsent>,
    #[serde(default)]
    pub gpp_consent: Option<GppConsent>,
    #[serde(default)]
    pub regs: Option<RegsExtension>,
}

/// Whether GDPR applies to the auction.
///
/// On the wire `Applies` is the number `1`; both other states are the empty
/// string, which the ad server reads as "not asserted".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GdprApplies {
    #[default]
    Unknown,
    Applies,
    DoesNotApply,
}

impl GdprApplies {
    /// Value used in query strings, `None` when the flag is not asserted.
    #[must_use]
    pub fn as_query_value(self) -> Option<&'static str> {
        match self {
            GdprApplies::Applies => Some("1"),
            GdprApplies::Unknown | GdprApplies::DoesNotApply => None,
        }
    }
}

impl From<Option<bool>> for GdprApplies {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => GdprApplies::Applies,
            Some(false) => GdprApplies::DoesNotApply,
            None => GdprApplies::Unknown,
        }
    }
}

impl Serialize for GdprApplies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GdprApplies::Applies => serializer.serialize_u8(1),
            GdprApplies::Unknown | GdprApplies::DoesNotApply => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for GdprApplies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        let applies = match value {
            Json::Bool(true) => GdprApplies::Applies,
            Json::Bool(false) => GdprApplies::DoesNotApply,
            Json::Number(n) if n.as_f64() == Some(1.0) => GdprApplies::Applies,
            Json::Number(n) if n.as_f64() == Some(0.0) => GdprApplies::DoesNotApply,
            Json::String(s) if s == "1" => GdprApplies::Applies,
            Json::String(s) if s == "0" => GdprApplies::DoesNotApply,
            _ => GdprApplies::Unknown,
        };
        Ok(applies)
    }
}

/// Flattened consent fields placed on the outbound payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentFields {
    pub gdpr_applies: GdprApplies,
    pub gdpr_consent: String,
    pub gpp_string: String,
    pub gpp_sid: String,
}

/// Merge the auction's consent signals into payload fields.
pub fn aggregate_consent(ctx: &AuctionContext) -> ConsentFields {
    let gdpr = ctx.gdpr_consent.as_ref();
    let gpp = ctx.gpp_consent.as_ref();
    let regs = ctx.regs.as_ref();

    let gdpr_applies = gdpr.map_or(GdprApplies::Unknown, |g| g.gdpr_applies.into());

    let gdpr_consent = gdpr
        .and_then(|g| g.consent_string.clone())
        .unwrap_or_default();

    let gpp_string = gpp
        .and_then(|g| g.gpp_string.as_deref())
        .filter(|s| !s.is_empty())
        .or_else(|| regs.and_then(|r| r.gpp.as_deref()))
        .unwrap_or_default()
        .to_string();

    let gpp_sid = match gpp.and_then(|g| g.applicable_sections.as_deref()) {
        Some(sections) if !sections.is_empty() => join_section_ids(sections),
        _ => regs
            .and_then(|r| r.gpp_sid.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default(),
    };

    ConsentFields {
        gdpr_applies,
        gdpr_consent,
        gpp_string,
        gpp_sid,
    }
}

fn join_section_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
