//! Offline auction round trip.
//!
//! `build` turns JSON fixtures describing slots, consent and page context into
//! the outbound request. `interpret` feeds a saved request and a server reply
//! back through the adapter and prints the resulting bids.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bid_adapter_common::adapter::{BidAdapter, BidderAdapter};
use bid_adapter_common::consent::AuctionContext;
use bid_adapter_common::origin::StaticPageContext;
use bid_adapter_common::request::{OutboundRequest, SlotBidRequest};
use bid_adapter_common::targeting::StaticTargeting;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::config::load_settings;
use crate::error::CliError;

/// Fixture inputs for [`build`].
pub struct BuildInputs<'a> {
    pub slots: &'a Path,
    pub auction: Option<&'a Path>,
    pub page: &'a Path,
    pub targeting: Option<&'a Path>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Json(format!("{}: {}", path.display(), e)))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Build the outbound request for one auction round.
pub fn build(
    inputs: &BuildInputs<'_>,
    config: Option<&Path>,
    output: Option<&Path>,
    verbose: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config, verbose)?;
    let slots: Vec<SlotBidRequest> = read_json(inputs.slots)?;
    let auction: AuctionContext = match inputs.auction {
        Some(path) => read_json(path)?,
        None => AuctionContext::default(),
    };
    let page: StaticPageContext = read_json(inputs.page)?;

    let mut adapter = BidAdapter::from_settings(&settings);
    if let Some(path) = inputs.targeting {
        let targeting: StaticTargeting = read_json(path)?;
        adapter = adapter.with_targeting(Arc::new(targeting));
    }

    if verbose {
        let valid = slots
            .iter()
            .filter(|slot| adapter.is_bid_request_valid(slot))
            .count();
        log::info!("{} of {} slots carry an ad unit id", valid, slots.len());
    }

    let request = adapter.build_requests(&slots, &auction, &page)?;
    emit(&request, output)
}

/// Interpret a saved server reply against the request that produced it.
pub fn interpret(
    request: &Path,
    response: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    verbose: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config, verbose)?;
    let request: OutboundRequest = read_json(request)?;
    let body: Json = read_json(response)?;

    let adapter = BidAdapter::from_settings(&settings);
    let bids = adapter.interpret_response(&body, &request);
    emit(&bids, output)
}
