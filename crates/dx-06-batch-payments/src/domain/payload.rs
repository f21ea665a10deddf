//! # Delta-Encoded Payout Payload
//!
//! Compact list of `(recipient, amount)` pairs sent with a batch transfer.
//!
//! ```text
//! varint(count) || { varint(delta) || varint(amount) } × count
//! ```
//!
//! Varints are unsigned LEB128 (7 bits per byte, low group first, high bit
//! set on every byte but the last). The first delta is the absolute
//! recipient id; every later delta is the distance to the previous recipient
//! and must be at least 1, so recipients are strictly ascending.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Amount};
use thiserror::Error;

/// One payout of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEntry {
    /// Recipient account.
    pub recipient: AccountId,
    /// Amount owed.
    pub amount: Amount,
}

impl PayoutEntry {
    /// Build an entry.
    pub fn new(recipient: u64, amount: Amount) -> Self {
        Self {
            recipient: AccountId(recipient),
            amount,
        }
    }
}

/// Payload decoding and encoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// Count of zero.
    #[error("Payload carries no payouts")]
    Empty,

    /// Input ended inside a varint or before `count` pairs were read.
    #[error("Payload truncated at byte {offset}")]
    Truncated {
        /// Offset of the varint being read.
        offset: usize,
    },

    /// Varint does not fit its target width.
    #[error("Varint overflow at byte {offset}")]
    VarintOverflow {
        /// Offset of the varint.
        offset: usize,
    },

    /// Varint has a redundant trailing zero group.
    #[error("Non-canonical varint at byte {offset}")]
    NonCanonical {
        /// Offset of the varint.
        offset: usize,
    },

    /// A later delta of zero, or entries given out of order to `encode`.
    #[error("Recipient at position {position} not ascending")]
    NotAscending {
        /// Entry position.
        position: usize,
    },

    /// Entry with amount zero.
    #[error("Zero amount at position {position}")]
    ZeroAmount {
        /// Entry position.
        position: usize,
    },

    /// Recipient id overflowed `u64`.
    #[error("Recipient id overflow at position {position}")]
    RecipientOverflow {
        /// Entry position.
        position: usize,
    },

    /// Bytes left after `count` pairs.
    #[error("{count} trailing bytes after payload")]
    TrailingBytes {
        /// Leftover byte count.
        count: usize,
    },

    /// More entries than a batch may hold.
    #[error("Payload declares {count} payouts, limit is {max}")]
    TooManyEntries {
        /// Declared count.
        count: u64,
        /// Limit.
        max: u64,
    },
}

/// Encode `entries`. They must be non-empty, strictly ascending by
/// recipient and carry non-zero amounts.
pub fn encode(entries: &[PayoutEntry]) -> Result<Vec<u8>, PayloadError> {
    if entries.is_empty() {
        return Err(PayloadError::Empty);
    }
    let mut out = Vec::with_capacity(2 + entries.len() * 4);
    write_varint(&mut out, entries.len() as u128);

    let mut previous: Option<u64> = None;
    for (position, entry) in entries.iter().enumerate() {
        if entry.amount == 0 {
            return Err(PayloadError::ZeroAmount { position });
        }
        let id = entry.recipient.0;
        let delta = match previous {
            None => id,
            Some(prev) if id > prev => id - prev,
            Some(_) => return Err(PayloadError::NotAscending { position }),
        };
        write_varint(&mut out, u128::from(delta));
        write_varint(&mut out, entry.amount);
        previous = Some(id);
    }
    Ok(out)
}

/// Decode a payload holding at most `max_entries` payouts.
pub fn decode(bytes: &[u8], max_entries: u64) -> Result<Vec<PayoutEntry>, PayloadError> {
    let mut offset = 0usize;
    let count = read_varint(bytes, &mut offset, 64)? as u64;
    if count == 0 {
        return Err(PayloadError::Empty);
    }
    if count > max_entries {
        return Err(PayloadError::TooManyEntries {
            count,
            max: max_entries,
        });
    }

    // Every pair takes at least two bytes.
    let capacity = (count as usize).min(bytes.len() / 2);
    let mut entries = Vec::with_capacity(capacity);
    let mut previous: Option<u64> = None;

    for position in 0..count as usize {
        let delta = read_varint(bytes, &mut offset, 64)? as u64;
        let amount = read_varint(bytes, &mut offset, 128)?;

        let recipient = match previous {
            None => delta,
            Some(_) if delta == 0 => return Err(PayloadError::NotAscending { position }),
            Some(prev) => prev
                .checked_add(delta)
                .ok_or(PayloadError::RecipientOverflow { position })?,
        };
        if amount == 0 {
            return Err(PayloadError::ZeroAmount { position });
        }

        entries.push(PayoutEntry {
            recipient: AccountId(recipient),
            amount,
        });
        previous = Some(recipient);
    }

    if offset != bytes.len() {
        return Err(PayloadError::TrailingBytes {
            count: bytes.len() - offset,
        });
    }
    Ok(entries)
}

fn write_varint(out: &mut Vec<u8>, mut value: u128) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(bytes: &[u8], offset: &mut usize, bits: u32) -> Result<u128, PayloadError> {
    let start = *offset;
    let mut value: u128 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*offset)
            .ok_or(PayloadError::Truncated { offset: start })?;
        *offset += 1;

        let group = u128::from(byte & 0x7f);
        if shift >= bits || (shift > 0 && group >> (bits - shift) != 0) {
            return Err(PayloadError::VarintOverflow { offset: start });
        }
        value |= group << shift;

        if byte & 0x80 == 0 {
            if byte == 0 && shift > 0 {
                return Err(PayloadError::NonCanonical { offset: start });
            }
            return Ok(value);
        }
        shift += 7;
    }
}
