//! Outbound bid request assembly.
//!
//! All valid slots of one auction round are folded into a single
//! [`OutboundPayload`]. The payload carries the normalized impressions, the
//! page's origin chain and the auction's consent fields, and is wrapped into
//! an [`OutboundRequest`] the host sends on the adapter's behalf.

use error_stack::{Report, ResultExt};
use http::{header, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use url::Url;

use crate::consent::{aggregate_consent, AuctionContext, GdprApplies};
use crate::constants::{CONTENT_TYPE_TEXT_PLAIN, PARAM_AD_UNIT_ID, PARAM_TARGETING, QUERY_BUILD_ID};
use crate::error::BidAdapterError;
use crate::origin::{derive_origin_chain, PageContext};
use crate::request_id::generate_request_id;
use crate::settings::AdapterConfig;
use crate::sizes::{normalize_sizes, AdSize};
use crate::targeting::{resolve_override, TargetingProvider};

/// One ad slot's bid intent as handed over by the host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBidRequest {
    /// Host-assigned bid identifier, echoed back by the server.
    pub bid_id: String,
    /// Page-side slot code, used only for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_unit_code: Option<String>,
    /// Raw size value: one `[w, h]` pair or a list of pairs.
    #[serde(default)]
    pub sizes: Json,
    /// Adapter parameters; must contain a truthy `adUnitId`.
    #[serde(default)]
    pub params: Map<String, Json>,
}

/// Normalized per-slot unit of the outbound payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impression {
    pub request_id: String,
    pub sizes: Vec<AdSize>,
    pub ad_unit_id: Json,
    pub options: Map<String, Json>,
}

/// Body of the request sent to the ad server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub request_id: String,
    pub impressions: Vec<Impression>,
    pub referer: Option<String>,
    pub origins: Vec<String>,
    #[serde(default)]
    pub gdpr_applies: GdprApplies,
    #[serde(default)]
    pub gdpr_consent: String,
    #[serde(default)]
    pub gpp_string: String,
    #[serde(default)]
    pub gpp_sid: String,
}

/// Transport description of the request the host sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub content_type: String,
    pub with_credentials: bool,
    /// Serialized [`OutboundPayload`].
    pub data: String,
}

impl OutboundRequest {
    /// Build an [`http::Request`] for hosts that send through an HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the method or URL is not valid HTTP.
    pub fn to_http_request(&self) -> Result<http::Request<String>, Report<BidAdapterError>> {
        let method = Method::from_bytes(self.method.as_bytes()).change_context(
            BidAdapterError::Request {
                message: format!("invalid method: {}", self.method),
            },
        )?;

        http::Request::builder()
            .method(method)
            .uri(self.url.as_str())
            .header(header::CONTENT_TYPE, self.content_type.as_str())
            .body(self.data.clone())
            .change_context(BidAdapterError::Request {
                message: format!("failed to build HTTP request for {}", self.url),
            })
    }
}

/// Whether a slot may be submitted: its `adUnitId` must be present and truthy.
pub fn is_bid_request_valid(params: &Map<String, Json>) -> bool {
    params.get(PARAM_AD_UNIT_ID).is_some_and(is_truthy)
}

fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

/// String form of an ad unit id, as passed to targeting providers.
pub(crate) fn ad_unit_key(ad_unit_id: &Json) -> String {
    match ad_unit_id {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize one slot into an impression. `None` when the slot is not valid.
pub fn build_impression(
    slot: &SlotBidRequest,
    targeting: Option<&dyn TargetingProvider>,
) -> Option<Impression> {
    if !is_bid_request_valid(&slot.params) {
        return None;
    }

    let mut options = slot.params.clone();
    let ad_unit_id = options.remove(PARAM_AD_UNIT_ID)?;

    if let Some(provider) = targeting {
        let key = ad_unit_key(&ad_unit_id);
        if let Some(overridden) = resolve_override(provider, &key, options.get(PARAM_TARGETING))
        {
            log::debug!("Targeting for ad unit {key} overridden by page provider");
            options.insert(PARAM_TARGETING.to_string(), Json::Object(overridden));
        }
    }

    Some(Impression {
        request_id: slot.bid_id.clone(),
        sizes: normalize_sizes(&slot.sizes),
        ad_unit_id,
        options,
    })
}

/// Fold every valid slot of one auction round into a single payload.
///
/// Slots without a truthy `adUnitId` are left out. Origin chain and consent
/// fields are computed once for the whole payload.
pub fn build_payload<P: PageContext + ?Sized>(
    slots: &[SlotBidRequest],
    auction: &AuctionContext,
    page: &P,
    targeting: Option<&dyn TargetingProvider>,
) -> OutboundPayload {
    let impressions: Vec<Impression> = slots
        .iter()
        .filter_map(|slot| {
            let impression = build_impression(slot, targeting);
            if impression.is_none() {
                log::warn!(
                    "Skipping bid {} ({}): missing {PARAM_AD_UNIT_ID}",
                    slot.bid_id,
                    slot.ad_unit_code.as_deref().unwrap_or("unknown slot")
                );
            }
            impression
        })
        .collect();

    let chain = derive_origin_chain(page);
    let consent = aggregate_consent(auction);

    OutboundPayload {
        request_id: generate_request_id(),
        impressions,
        referer: chain.referer,
        origins: chain.origins,
        gdpr_applies: consent.gdpr_applies,
        gdpr_consent: consent.gdpr_consent,
        gpp_string: consent.gpp_string,
        gpp_sid: consent.gpp_sid,
    }
}

/// Endpoint URL with the build identifier query parameter.
///
/// # Errors
///
/// Returns an error if the configured endpoint is not a valid URL.
pub fn endpoint_url(config: &AdapterConfig) -> Result<Url, Report<BidAdapterError>> {
    let mut url = Url::parse(&config.endpoint).change_context(BidAdapterError::Configuration {
        message: format!("invalid endpoint URL: {}", config.endpoint),
    })?;
    url.query_pairs_mut()
        .append_pair(QUERY_BUILD_ID, &config.build_id);
    Ok(url)
}

/// Wrap a payload into the request the host sends.
///
/// # Errors
///
/// Returns an error if the endpoint is invalid or the payload cannot be serialized.
pub fn build_outbound_request(
    payload: &OutboundPayload,
    config: &AdapterConfig,
) -> Result<OutboundRequest, Report<BidAdapterError>> {
    let url = endpoint_url(config)?;
    let data = serde_json::to_string(payload).change_context(BidAdapterError::Request {
        message: "failed to serialize outbound payload".to_string(),
    })?;

    Ok(OutboundRequest {
        method: Method::POST.to_string(),
        url: url.to_string(),
        content_type: CONTENT_TYPE_TEXT_PLAIN.to_string(),
        with_credentials: false,
        data,
    })
}
