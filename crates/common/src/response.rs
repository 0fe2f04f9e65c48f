//! Server response interpretation.
//!
//! The ad server answers with a `bidResponses` list whose numeric fields may
//! arrive as numbers or numeric strings and whose optional fields may be
//! missing. Each entry becomes a [`BidResult`] with defaults applied, in the
//! order the server returned them.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::constants::{CONSENT_PARAM_KEYS, DEFAULT_MEDIA_TYPE, RESPONSE_BIDS_KEY};
use crate::request::OutboundRequest;
use crate::settings::AdapterConfig;

/// One bid as returned by the ad server.
///
/// Every field is read loosely so a wrong type or `null` in one field
/// defaults that field instead of discarding the bid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBidEntry {
    #[serde(default)]
    pub request_id: Json,
    #[serde(default)]
    pub cpm: Json,
    #[serde(default)]
    pub width: Json,
    #[serde(default)]
    pub height: Json,
    #[serde(default)]
    pub creative_id: Json,
    #[serde(default)]
    pub deal_id: Json,
    #[serde(default)]
    pub currency: Json,
    #[serde(default)]
    pub media_type: Json,
    #[serde(default)]
    pub ttl: Json,
    #[serde(default)]
    pub ad: Json,
    #[serde(default)]
    pub meta: Json,
}

/// Normalized bid handed back to the host auction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResult {
    pub request_id: String,
    pub cpm: f64,
    pub width: u32,
    pub height: u32,
    pub creative_id: String,
    pub deal_id: Option<String>,
    pub currency: String,
    pub media_type: String,
    pub net_revenue: bool,
    pub ttl: u32,
    pub ad: String,
    pub meta: BidMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_domains: Option<Vec<String>>,
}

/// Turn the server's response body into bid results, in server order.
///
/// `request` is the outbound request the host sent; its payload supplies the
/// consent values substituted into creative markup.
pub fn interpret_response(
    body: &Json,
    request: &OutboundRequest,
    config: &AdapterConfig,
) -> Vec<BidResult> {
    let Some(entries) = body.get(RESPONSE_BIDS_KEY).and_then(Json::as_array) else {
        log::debug!("Response has no {RESPONSE_BIDS_KEY} list; no bids");
        return Vec::new();
    };

    let consent_query = consent_query_from_request(request);

    entries
        .iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                log::warn!("Skipping bid entry that is not an object: {entry}");
                return None;
            }
            let entry = match ServerBidEntry::deserialize(entry) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping malformed bid entry: {e}");
                    return None;
                }
            };
            let Some(request_id) = bid_request_id(&entry.request_id) else {
                log::warn!("Skipping bid entry without requestId");
                return None;
            };
            Some(to_bid_result(request_id, entry, &consent_query, config))
        })
        .collect()
}

/// `requestId` as a string. Numbers are accepted; anything else is missing.
fn bid_request_id(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_bid_result(
    request_id: String,
    entry: ServerBidEntry,
    consent_query: &str,
    config: &AdapterConfig,
) -> BidResult {
    let markup = json_to_string(&entry.ad).unwrap_or_default();
    let ad = substitute_placeholder(&markup, &config.placeholder_token, consent_query);

    BidResult {
        cpm: coerce_f64(&entry.cpm).unwrap_or_else(|| {
            log::debug!("Bid {request_id} has non-numeric cpm {}", entry.cpm);
            0.0
        }),
        width: coerce_u32(&entry.width).unwrap_or(0),
        height: coerce_u32(&entry.height).unwrap_or(0),
        creative_id: json_to_string(&entry.creative_id).unwrap_or_default(),
        deal_id: json_to_string(&entry.deal_id),
        currency: json_to_string(&entry.currency)
            .unwrap_or_else(|| config.default_currency.clone()),
        media_type: json_to_string(&entry.media_type)
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        net_revenue: true,
        ttl: coerce_u32(&entry.ttl).unwrap_or(config.default_ttl),
        ad,
        meta: BidMeta {
            advertiser_domains: advertiser_domains(&entry.meta),
        },
        request_id,
    }
}

/// String domains from `meta.advertiserDomains`; `None` when there are none.
fn advertiser_domains(meta: &Json) -> Option<Vec<String>> {
    let domains: Vec<String> = meta
        .get("advertiserDomains")?
        .as_array()?
        .iter()
        .filter_map(|domain| domain.as_str().map(str::to_string))
        .collect();
    (!domains.is_empty()).then_some(domains)
}

/// Replace `token` in `markup` with the consent query string.
///
/// Markup without the token is returned unchanged.
pub fn substitute_placeholder(markup: &str, token: &str, consent_query: &str) -> String {
    if token.is_empty() || !markup.contains(token) {
        return markup.to_string();
    }
    markup.replace(token, consent_query)
}

/// `&key=value` pairs for the consent fields present in the echoed payload.
fn consent_query_from_request(request: &OutboundRequest) -> String {
    match serde_json::from_str::<Json>(&request.data) {
        Ok(payload) => build_consent_query(&payload),
        Err(e) => {
            log::warn!("Could not parse echoed request payload, dropping consent params: {e}");
            String::new()
        }
    }
}

/// Build `&gdprApplies=..&gdprConsent=..&gppString=..&gppSid=..` from a payload,
/// skipping keys that are absent or empty.
pub fn build_consent_query(payload: &Json) -> String {
    CONSENT_PARAM_KEYS
        .iter()
        .filter_map(|key| {
            let value = payload.get(*key).and_then(json_to_string)?;
            (!value.is_empty()).then(|| {
                format!(
                    "&{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&value)
                )
            })
        })
        .collect()
}

fn json_to_string(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

fn coerce_f64(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => parse_leading_float(s),
        _ => None,
    }
}

fn coerce_u32(value: &Json) -> Option<u32> {
    let parsed = match value {
        Json::Number(n) => n.as_f64().map(f64::trunc),
        Json::String(s) => parse_leading_int(s),
        _ => None,
    }?;
    (0.0..=f64::from(u32::MAX))
        .contains(&parsed)
        .then_some(parsed as u32)
}

/// Parse the longest numeric prefix of `s`, e.g. `"1.25USD"` is `1.25`.
fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Parse the leading integer of `s`, e.g. `"250px"` is `250`.
fn parse_leading_int(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tests::{echoed_request, test_adapter_config};
    use serde_json::json;

    const TOKEN: &str = "{{PRIVACY_PARAMS}}";

    fn server_body(entries: Json) -> Json {
        json!({ "bidResponses": entries })
    }

    #[test]
    fn test_interpret_applies_defaults_and_coercion() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([{
            "requestId": "bid-1",
            "cpm": "1.25",
            "width": "300",
            "height": "250",
            "creativeId": "cr-9",
            "ad": "<div>ad</div>"
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids.len(), 1);

        let bid = &bids[0];
        assert_eq!(bid.request_id, "bid-1");
        assert!((bid.cpm - 1.25).abs() < f64::EPSILON);
        assert_eq!(bid.width, 300);
        assert_eq!(bid.height, 250);
        assert_eq!(bid.creative_id, "cr-9");
        assert_eq!(bid.deal_id, None);
        assert_eq!(bid.currency, "USD");
        assert_eq!(bid.media_type, "banner");
        assert!(bid.net_revenue);
        assert_eq!(bid.ttl, 10);
        assert_eq!(bid.ad, "<div>ad</div>");
        assert_eq!(bid.meta, BidMeta::default());
    }

    #[test]
    fn test_interpret_keeps_server_values() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([{
            "requestId": "bid-1",
            "cpm": 2.5,
            "width": 728,
            "height": 90,
            "creativeId": 77,
            "dealId": "deal-1",
            "currency": "EUR",
            "mediaType": "video",
            "ttl": 300,
            "ad": "<vast/>",
            "meta": {"advertiserDomains": ["brand.example"]}
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        let bid = &bids[0];
        assert_eq!(bid.creative_id, "77");
        assert_eq!(bid.deal_id.as_deref(), Some("deal-1"));
        assert_eq!(bid.currency, "EUR");
        assert_eq!(bid.media_type, "video");
        assert_eq!(bid.ttl, 300);
        assert_eq!(
            bid.meta.advertiser_domains,
            Some(vec!["brand.example".to_string()])
        );
    }

    #[test]
    fn test_interpret_preserves_server_order() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([
            {"requestId": "c", "cpm": "1", "width": "1", "height": "1", "ad": ""},
            {"requestId": "a", "cpm": "3", "width": "1", "height": "1", "ad": ""},
            {"requestId": "b", "cpm": "2", "width": "1", "height": "1", "ad": ""}
        ]));

        let ids: Vec<String> = interpret_response(&body, &request, &test_adapter_config())
            .into_iter()
            .map(|bid| bid.request_id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_interpret_skips_malformed_entries() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([
            "not-an-object",
            ["bid-9", 1.0],
            {"cpm": "1.0"},
            {"requestId": null, "cpm": "1.0"},
            {"requestId": ["a"], "cpm": "1.0"},
            {"requestId": "bid-2", "cpm": "0.5", "width": "320", "height": "50", "ad": ""}
        ]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].request_id, "bid-2");
    }

    #[test]
    fn test_interpret_defaults_null_and_mistyped_fields() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([
            {"requestId": "null-ad", "cpm": "1", "width": "300", "height": "250", "ad": null},
            {"requestId": "num-deal", "cpm": "1", "width": "300", "height": "250", "ad": "", "dealId": 12345},
            {"requestId": "domains", "cpm": "1", "width": "300", "height": "250", "ad": "",
             "meta": {"advertiserDomains": ["x.com", null]}},
            {"requestId": 42, "cpm": "1", "width": "300", "height": "250", "ad": "",
             "currency": null, "mediaType": null, "meta": "oops"}
        ]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids.len(), 4, "no entry should be dropped for a bad optional field");

        assert_eq!(bids[0].ad, "");
        assert_eq!(bids[1].deal_id.as_deref(), Some("12345"));
        assert_eq!(
            bids[2].meta.advertiser_domains,
            Some(vec!["x.com".to_string()])
        );
        assert_eq!(bids[3].request_id, "42");
        assert_eq!(bids[3].currency, "USD");
        assert_eq!(bids[3].media_type, "banner");
        assert_eq!(bids[3].meta, BidMeta::default());
    }

    #[test]
    fn test_interpret_without_bid_list() {
        let request = echoed_request(json!({}));
        let config = test_adapter_config();
        assert!(interpret_response(&json!({}), &request, &config).is_empty());
        assert!(interpret_response(&json!({"bidResponses": null}), &request, &config).is_empty());
    }

    #[test]
    fn test_empty_advertiser_domains_leave_meta_empty() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "1", "width": "1", "height": "1", "ad": "",
            "meta": {"advertiserDomains": []}
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids[0].meta, BidMeta::default());
        let wire = serde_json::to_value(&bids[0]).expect("should serialize bid");
        assert_eq!(wire["meta"], json!({}));
        assert_eq!(wire["dealId"], json!(null));
        assert_eq!(wire["netRevenue"], json!(true));
    }

    #[test]
    fn test_placeholder_with_only_gdpr_consent() {
        let request = echoed_request(json!({
            "gdprApplies": "",
            "gdprConsent": "CONSENT123",
            "gppString": "",
            "gppSid": null
        }));
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "1", "width": "1", "height": "1",
            "ad": format!("<img src=\"https://track.example/i?x=1{TOKEN}\">")
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(
            bids[0].ad,
            "<img src=\"https://track.example/i?x=1&gdprConsent=CONSENT123\">"
        );
    }

    #[test]
    fn test_placeholder_with_all_consent_fields_in_order() {
        let payload = json!({
            "gppSid": "7,8",
            "gppString": "DBA~1",
            "gdprConsent": "CO+/=",
            "gdprApplies": 1
        });
        assert_eq!(
            build_consent_query(&payload),
            "&gdprApplies=1&gdprConsent=CO%2B%2F%3D&gppString=DBA~1&gppSid=7%2C8"
        );
    }

    #[test]
    fn test_placeholder_removed_when_no_consent() {
        let request = echoed_request(json!({
            "gdprApplies": "",
            "gdprConsent": "",
            "gppString": "",
            "gppSid": ""
        }));
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "1", "width": "1", "height": "1",
            "ad": format!("<script src=\"https://cdn.example/a.js?id=3{TOKEN}\"></script>")
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(
            bids[0].ad,
            "<script src=\"https://cdn.example/a.js?id=3\"></script>"
        );
    }

    #[test]
    fn test_markup_without_token_is_unchanged() {
        assert_eq!(
            substitute_placeholder("<div>plain</div>", TOKEN, "&gdprConsent=x"),
            "<div>plain</div>"
        );
    }

    #[test]
    fn test_unparseable_echo_drops_consent_params() {
        let request = OutboundRequest {
            data: "not json".to_string(),
            ..echoed_request(json!({}))
        };
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "1", "width": "1", "height": "1",
            "ad": format!("<p>{TOKEN}</p>")
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids[0].ad, "<p></p>");
    }

    #[test]
    fn test_custom_placeholder_token() {
        let mut config = test_adapter_config();
        config.placeholder_token = "%%CONSENT%%".to_string();
        let request = echoed_request(json!({"gppString": "DBA"}));
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "1", "width": "1", "height": "1",
            "ad": "<p>%%CONSENT%%{{PRIVACY_PARAMS}}</p>"
        }]));

        let bids = interpret_response(&body, &request, &config);
        assert_eq!(bids[0].ad, "<p>&gppString=DBA{{PRIVACY_PARAMS}}</p>");
    }

    #[test]
    fn test_interpret_is_idempotent() {
        let request = echoed_request(json!({"gdprApplies": 1, "gdprConsent": "CO"}));
        let body = server_body(json!([
            {"requestId": "a", "cpm": "1.5", "width": "300", "height": "250", "ad": TOKEN},
            {"requestId": "b", "cpm": "0.7", "width": "728", "height": "90", "ad": "x"}
        ]));
        let config = test_adapter_config();

        let first = interpret_response(&body, &request, &config);
        let second = interpret_response(&body, &request, &config);
        assert_eq!(first, second);
        assert_eq!(first[0].ad, "&gdprApplies=1&gdprConsent=CO");
    }

    #[test]
    fn test_numeric_coercion_is_lenient() {
        assert_eq!(coerce_f64(&json!("1.5USD")), Some(1.5));
        assert_eq!(coerce_f64(&json!(" 2e2")), Some(200.0));
        assert_eq!(coerce_f64(&json!(".5")), Some(0.5));
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_f64(&json!(null)), None);

        assert_eq!(coerce_u32(&json!("250px")), Some(250));
        assert_eq!(coerce_u32(&json!("300.9")), Some(300));
        assert_eq!(coerce_u32(&json!(90.4)), Some(90));
        assert_eq!(coerce_u32(&json!("-5")), None);
        assert_eq!(coerce_u32(&json!("wide")), None);
    }

    #[test]
    fn test_non_numeric_cpm_defaults_to_zero() {
        let request = echoed_request(json!({}));
        let body = server_body(json!([{
            "requestId": "bid-1", "cpm": "n/a", "width": "x", "height": null, "ad": ""
        }]));

        let bids = interpret_response(&body, &request, &test_adapter_config());
        assert_eq!(bids[0].cpm, 0.0);
        assert_eq!(bids[0].width, 0);
        assert_eq!(bids[0].height, 0);
    }
}
