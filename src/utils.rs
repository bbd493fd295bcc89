//! Identifier generation

use anyhow::Context;
use bech32::Bech32m;
use uuid7::uuid7;

pub const USER_HRP: &str = "user_";

/// A fresh uuid7 encoded as bech32m under the `hrp` prefix, e.g. `sale_1...`.
pub fn new_id(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp).with_context(|| format!("invalid id prefix {hrp:?}"))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes()).context("failed to encode id as bech32")
}
