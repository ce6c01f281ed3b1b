//! SMS segment estimation for cost and throughput planning.

use serde::{Deserialize, Serialize};

/// Characters in a single GSM 7-bit message.
pub const GSM7_SINGLE_SEGMENT: usize = 160;
/// Characters per part once a GSM 7-bit message is concatenated.
pub const GSM7_CONCAT_SEGMENT: usize = 153;
/// Characters per part for Unicode (UCS-2) messages.
pub const UCS2_SEGMENT: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEstimate {
    pub encoding: Encoding,
    pub characters: usize,
    pub segments: u32,
}

/// Number of billable segments for `message`. Always at least one.
pub fn estimate_segments(message: &str) -> u32 {
    estimate(message).segments
}

/// Full estimate for `message`.
///
/// `characters` is the scalar count. Unicode messages are split on UTF-16
/// code units, which is what UCS-2 carriers bill, so a character outside
/// the Basic Multilingual Plane (most emoji) fills two of the 70 slots.
pub fn estimate(message: &str) -> SegmentEstimate {
    let characters = message.chars().count();
    let (encoding, segments) = if message.is_ascii() {
        let segments = if characters <= GSM7_SINGLE_SEGMENT {
            1
        } else {
            characters.div_ceil(GSM7_CONCAT_SEGMENT)
        };
        (Encoding::Gsm7, segments)
    } else {
        let code_units = message.encode_utf16().count();
        (Encoding::Ucs2, code_units.div_ceil(UCS2_SEGMENT))
    };

    SegmentEstimate {
        encoding,
        characters,
        segments: segments.max(1) as u32,
    }
}
