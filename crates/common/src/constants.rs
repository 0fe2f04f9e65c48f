/// Bidder code the adapter registers under unless configured otherwise.
pub const DEFAULT_BIDDER_CODE: &str = "bidbridge";

/// Required slot parameter naming the ad server's ad unit.
pub const PARAM_AD_UNIT_ID: &str = "adUnitId";

/// Slot parameter holding per-slot targeting key/values.
pub const PARAM_TARGETING: &str = "targeting";

/// Query parameter carrying the build identifier on the endpoint URL.
pub const QUERY_BUILD_ID: &str = "v";

/// Content type of the outbound request. Plain text avoids a CORS preflight.
pub const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain";

/// Key of the bid list in the server response body.
pub const RESPONSE_BIDS_KEY: &str = "bidResponses";

/// Appended to the origin chain when ancestors exist beyond what can be observed.
pub const UNKNOWN_ANCESTOR_ORIGIN: &str = "unknown";

/// Literal token in creative markup replaced by consent query parameters.
pub const DEFAULT_PLACEHOLDER_TOKEN: &str = "{{PRIVACY_PARAMS}}";

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_MEDIA_TYPE: &str = "banner";
pub const DEFAULT_TTL_SECS: u32 = 10;
pub const DEFAULT_BUILD_ID: &str = "1";

/// Consent keys forwarded into creative markup, in wire order.
pub const CONSENT_PARAM_KEYS: [&str; 4] = ["gdprApplies", "gdprConsent", "gppString", "gppSid"];
