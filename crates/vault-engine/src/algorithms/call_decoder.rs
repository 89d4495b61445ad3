//! # Call Decoding
//!
//! Turns SCALE-encoded call bytes into a [`DecodedCall`].
//!
//! Only a handful of extrinsics are understood (transfers, utility batches,
//! proxy calls). Anything else is still a valid call: it decodes to
//! [`DecodedCall::Advanced`] as long as its boundaries can be found. An unknown
//! call can only be delimited when it is the last thing in the buffer, so an
//! unknown call inside a batch makes the whole batch `Advanced`.

use super::multisig_account::derive_multisig_address;
use crate::domain::{
    Address, Balance, CallData, CallIndex, CallIndexTable, ChangeConfigDetails, DecodedCall,
    EngineError, Multisig, TransactionRecipient,
};
use parity_scale_codec::{Compact, Decode};

/// Deepest call nesting the decoder follows.
pub const MAX_CALL_DEPTH: usize = 4;

/// Outcome of interpreting resolved call bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallInterpretation {
    /// Call understood.
    Decoded(DecodedCall),
    /// Bytes are not a valid call; details must be shown as unavailable.
    Malformed(String),
}

/// Decoded call tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCall {
    /// Pallet and call index.
    pub index: CallIndex,
    /// Arguments.
    pub kind: RawCallKind,
}

/// Arguments of the calls the decoder understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawCallKind {
    /// balances.transfer_*
    Transfer {
        /// Destination
        dest: Address,
        /// Amount in minimal units
        value: u128,
    },
    /// utility.batch*
    Batch {
        /// Inner calls
        calls: Vec<RawCall>,
    },
    /// proxy.proxy
    Proxy {
        /// Proxied account
        real: Address,
        /// Forced proxy type
        force_proxy_type: Option<u8>,
        /// Dispatched call
        call: Box<RawCall>,
    },
    /// proxy.add_proxy
    AddProxy {
        /// New delegate
        delegate: Address,
        /// Proxy type
        proxy_type: u8,
        /// Announcement delay
        delay: u32,
    },
    /// proxy.remove_proxy
    RemoveProxy {
        /// Removed delegate
        delegate: Address,
        /// Proxy type
        proxy_type: u8,
        /// Announcement delay
        delay: u32,
    },
    /// Unknown call occupying the rest of the buffer.
    Opaque {
        /// Length of the argument bytes
        args_len: usize,
    },
}

#[derive(Debug)]
enum DecodeFailure {
    Malformed(String),
    Unknown(CallIndex),
}

impl From<parity_scale_codec::Error> for DecodeFailure {
    fn from(e: parity_scale_codec::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

fn decode_multi_address(input: &mut &[u8]) -> Result<Address, DecodeFailure> {
    match u8::decode(input)? {
        0 => Ok(Address::from_public_key(<[u8; 32]>::decode(input)?)),
        variant => Err(DecodeFailure::Malformed(format!(
            "unsupported MultiAddress variant {}",
            variant
        ))),
    }
}

fn decode_inner(
    input: &mut &[u8],
    table: &CallIndexTable,
    tail: bool,
    depth: usize,
) -> Result<RawCall, DecodeFailure> {
    if depth > MAX_CALL_DEPTH {
        return Err(DecodeFailure::Malformed(format!(
            "call nesting deeper than {}",
            MAX_CALL_DEPTH
        )));
    }

    let index: CallIndex = (u8::decode(input)?, u8::decode(input)?);

    let kind = if index == table.transfer_keep_alive || index == table.transfer_allow_death {
        let dest = decode_multi_address(input)?;
        let value = Compact::<u128>::decode(input)?.0;
        RawCallKind::Transfer { dest, value }
    } else if index == table.batch || index == table.batch_all || index == table.force_batch {
        let len = Compact::<u32>::decode(input)?.0;
        let mut calls = Vec::new();
        for _ in 0..len {
            calls.push(decode_inner(input, table, false, depth + 1)?);
        }
        RawCallKind::Batch { calls }
    } else if index == table.proxy {
        let real = decode_multi_address(input)?;
        let force_proxy_type = Option::<u8>::decode(input)?;
        let call = decode_inner(input, table, tail, depth + 1)?;
        RawCallKind::Proxy {
            real,
            force_proxy_type,
            call: Box::new(call),
        }
    } else if index == table.add_proxy || index == table.remove_proxy {
        let delegate = decode_multi_address(input)?;
        let proxy_type = u8::decode(input)?;
        let delay = u32::decode(input)?;
        if index == table.add_proxy {
            RawCallKind::AddProxy {
                delegate,
                proxy_type,
                delay,
            }
        } else {
            RawCallKind::RemoveProxy {
                delegate,
                proxy_type,
                delay,
            }
        }
    } else if tail {
        let args_len = input.len();
        *input = &input[args_len..];
        RawCallKind::Opaque { args_len }
    } else {
        return Err(DecodeFailure::Unknown(index));
    };

    Ok(RawCall { index, kind })
}

fn decode_tree(bytes: &[u8], table: &CallIndexTable) -> Result<RawCall, DecodeFailure> {
    let mut input = bytes;
    let call = decode_inner(&mut input, table, true, 0)?;
    if !input.is_empty() {
        return Err(DecodeFailure::Malformed(format!(
            "{} trailing bytes after call",
            input.len()
        )));
    }
    Ok(call)
}

/// Decode call bytes into a call tree.
///
/// Fails with [`EngineError::CallDecode`] when the bytes are not a call, or when
/// an unknown call appears somewhere it cannot be delimited.
pub fn decode_call(bytes: &[u8], table: &CallIndexTable) -> Result<RawCall, EngineError> {
    decode_tree(bytes, table).map_err(|failure| match failure {
        DecodeFailure::Malformed(reason) => EngineError::CallDecode(reason),
        DecodeFailure::Unknown((pallet, call)) => EngineError::CallDecode(format!(
            "unknown call {}.{} inside a batch",
            pallet, call
        )),
    })
}

fn find_add_proxy(call: &RawCall) -> Option<Address> {
    match &call.kind {
        RawCallKind::AddProxy { delegate, .. } => Some(*delegate),
        RawCallKind::Batch { calls } => calls.iter().find_map(find_add_proxy),
        RawCallKind::Proxy { call, .. } => find_add_proxy(call),
        _ => None,
    }
}

fn recipient(multisig: &Multisig, dest: Address, value: u128) -> TransactionRecipient {
    TransactionRecipient {
        address: dest,
        balance: Balance::new(multisig.chain.native_token.clone(), value),
    }
}

/// Interpret resolved call bytes for `multisig`.
///
/// `change_config` is the off-chain config-change payload, when present.
/// Returns [`EngineError::UnimplementedPath`] for nested proxy or batch calls.
pub fn interpret_call(
    call_data: &CallData,
    multisig: &Multisig,
    change_config: Option<&ChangeConfigDetails>,
) -> Result<CallInterpretation, EngineError> {
    let bytes = call_data.as_bytes();
    let root = match decode_tree(bytes, &multisig.chain.calls) {
        Ok(call) => call,
        Err(DecodeFailure::Malformed(reason)) => return Ok(CallInterpretation::Malformed(reason)),
        Err(DecodeFailure::Unknown(_)) => {
            // Valid framing we cannot walk; the outer call is still known.
            return Ok(CallInterpretation::Decoded(DecodedCall::Advanced {
                pallet_index: bytes[0],
                call_index: bytes[1],
            }));
        }
    };

    let inner = match &root.kind {
        RawCallKind::Proxy { call, .. } => {
            if matches!(call.kind, RawCallKind::Proxy { .. }) {
                return Err(EngineError::UnimplementedPath(
                    "decoding nested proxy calls".to_string(),
                ));
            }
            call.as_ref()
        }
        _ => &root,
    };

    if let Some(details) = change_config {
        let expected = derive_multisig_address(&details.signers, details.threshold);
        return Ok(match find_add_proxy(inner) {
            Some(delegate) if delegate == expected => {
                CallInterpretation::Decoded(DecodedCall::ChangeConfig {
                    details: details.clone(),
                })
            }
            Some(delegate) => CallInterpretation::Malformed(format!(
                "add_proxy delegate {} does not match proposed configuration {}",
                delegate.short(),
                expected.short()
            )),
            None => CallInterpretation::Malformed(
                "config change payload without an add_proxy call".to_string(),
            ),
        });
    }

    let decoded = match &inner.kind {
        RawCallKind::Transfer { dest, value } => DecodedCall::Transfer {
            recipient: recipient(multisig, *dest, *value),
        },
        RawCallKind::Batch { calls } => {
            if calls.iter().any(|c| matches!(c.kind, RawCallKind::Batch { .. })) {
                return Err(EngineError::UnimplementedPath(
                    "decoding nested batch calls".to_string(),
                ));
            }
            let transfers: Vec<TransactionRecipient> = calls
                .iter()
                .filter_map(|c| match &c.kind {
                    RawCallKind::Transfer { dest, value } => Some(recipient(multisig, *dest, *value)),
                    _ => None,
                })
                .collect();
            if !calls.is_empty() && transfers.len() == calls.len() {
                DecodedCall::MultiSend {
                    recipients: transfers,
                }
            } else {
                DecodedCall::Advanced {
                    pallet_index: inner.index.0,
                    call_index: inner.index.1,
                }
            }
        }
        _ => DecodedCall::Advanced {
            pallet_index: inner.index.0,
            call_index: inner.index.1,
        },
    };

    Ok(CallInterpretation::Decoded(decoded))
}
