//! The bidder the host auction registers.

use std::sync::Arc;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::consent::AuctionContext;
use crate::error::BidAdapterError;
use crate::log_with_request_id;
use crate::origin::PageContext;
use crate::request::{
    build_outbound_request, build_payload, is_bid_request_valid, OutboundRequest, SlotBidRequest,
};
use crate::response::{interpret_response, BidResult};
use crate::settings::{AdapterConfig, Settings};
use crate::targeting::TargetingProvider;

/// Media type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Banner,
    Video,
    Native,
}

/// Trait implemented by bidders the host auction can register.
pub trait BidderAdapter: Send + Sync {
    /// Bidder code the host registers this adapter under.
    fn code(&self) -> &str;

    /// Media types this bidder accepts.
    fn supported_media_types(&self) -> &'static [MediaType] {
        &[MediaType::Banner]
    }

    /// Whether the host should submit this slot at all.
    fn is_bid_request_valid(&self, slot: &SlotBidRequest) -> bool;

    /// Build the single request covering every valid slot of one auction round.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the payload cannot be serialized.
    fn build_requests(
        &self,
        slots: &[SlotBidRequest],
        auction: &AuctionContext,
        page: &dyn PageContext,
    ) -> Result<OutboundRequest, Report<BidAdapterError>>;

    /// Turn the server's reply to `request` into bid results.
    fn interpret_response(&self, body: &Json, request: &OutboundRequest) -> Vec<BidResult>;
}

/// Ad server bidder backed by [`AdapterConfig`].
pub struct BidAdapter {
    config: AdapterConfig,
    targeting: Option<Arc<dyn TargetingProvider>>,
}

impl BidAdapter {
    #[must_use]
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            targeting: None,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.adapter.clone())
    }

    /// Install a page-level targeting provider consulted on every build.
    #[must_use]
    pub fn with_targeting(mut self, provider: Arc<dyn TargetingProvider>) -> Self {
        self.targeting = Some(provider);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

impl BidderAdapter for BidAdapter {
    fn code(&self) -> &str {
        &self.config.bidder_code
    }

    fn is_bid_request_valid(&self, slot: &SlotBidRequest) -> bool {
        is_bid_request_valid(&slot.params)
    }

    fn build_requests(
        &self,
        slots: &[SlotBidRequest],
        auction: &AuctionContext,
        page: &dyn PageContext,
    ) -> Result<OutboundRequest, Report<BidAdapterError>> {
        let payload = build_payload(slots, auction, page, self.targeting.as_deref());

        log_with_request_id!(
            info,
            payload.request_id,
            "{}: built request with {} of {} slots",
            self.code(),
            payload.impressions.len(),
            slots.len()
        );

        build_outbound_request(&payload, &self.config)
    }

    fn interpret_response(&self, body: &Json, request: &OutboundRequest) -> Vec<BidResult> {
        let bids = interpret_response(body, request, &self.config);
        log::info!("{}: interpreted {} bids", self.code(), bids.len());
        bids
    }
}
