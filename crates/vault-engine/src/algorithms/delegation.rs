//! # Proxy Delegation
//!
//! Filters the chain's proxy definitions down to accounts with full control.

use super::address_codec;
use crate::domain::{Address, DataQualityWarning, RawProxyDefinition};
use vault_telemetry::log_event;

/// Proxy type granting unrestricted control.
pub const PROXY_TYPE_ANY: &str = "Any";

/// Delegates found for one proxy account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delegatees {
    /// `Any`-type delegates, in chain order, deduplicated.
    pub delegatees: Vec<Address>,
    /// Delegates that were excluded because they did not decode.
    pub warnings: Vec<DataQualityWarning>,
}

/// Extract the `Any`-type delegates from `definitions`.
///
/// Undecodable delegate text is excluded and reported, never zero-filled.
pub fn any_delegatees(definitions: &[RawProxyDefinition]) -> Delegatees {
    let mut out = Delegatees::default();
    for definition in definitions {
        if definition.proxy_type != PROXY_TYPE_ANY {
            continue;
        }
        match address_codec::decode(&definition.delegate) {
            Ok(address) => {
                if !out.delegatees.contains(&address) {
                    out.delegatees.push(address);
                }
            }
            Err(e) => {
                log_event!(
                    warn,
                    "delegation",
                    "chain returned a proxy delegate that is not a valid address",
                    raw = %definition.delegate,
                    error = %e
                );
                out.warnings.push(DataQualityWarning::UndecodableDelegate {
                    raw: definition.delegate.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    out
}
