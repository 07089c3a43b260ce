//! The victim wheel.
//!
//! The wheel itself is spun by the spinner's browser; the server only
//! knows which values exist so that it can optionally refuse a reported
//! multiplier that no segment carries.

/// One slice of the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelSegment {
    pub value: u32,
    pub label: &'static str,
}

/// The segments in wheel order. Every segment is equally likely.
pub const WHEEL_SEGMENTS: [WheelSegment; 6] = [
    WheelSegment { value: 2, label: "DOUBLE UP" },
    WheelSegment { value: 4, label: "THE 4 IS MORE!" },
    WheelSegment { value: 5, label: "ALL BONUS" },
    WheelSegment { value: 1, label: "BAD IS GOOD" },
    WheelSegment { value: 3, label: "TRIPLE HIT" },
    WheelSegment { value: 8, label: "CRAZY 8" },
];

/// Returns `true` if some segment carries `multiplier`.
pub fn is_wheel_value(multiplier: u32) -> bool {
    WHEEL_SEGMENTS.iter().any(|s| s.value == multiplier)
}

/// The label of the segment carrying `multiplier`, if any.
pub fn wheel_label(multiplier: u32) -> Option<&'static str> {
    WHEEL_SEGMENTS
        .iter()
        .find(|s| s.value == multiplier)
        .map(|s| s.label)
}
