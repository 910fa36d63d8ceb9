//! HEVC SEI message descriptors and HDR static metadata payloads.

/// Location of one SEI message within an emulation-cleared RBSP buffer.
///
/// Offsets are byte positions into the buffer the message was parsed from,
/// so the payload can be revisited or excised later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeiMessage {
    pub payload_type: u32,
    pub payload_size: usize,
    pub msg_offset: usize,
    pub payload_offset: usize,
}

/// CIE 1931 chromaticity coordinate in 0.00002 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayPrimary {
    pub x: u16,
    pub y: u16,
}

/// Mastering display colour volume (SEI payload type 137).
///
/// Primaries are stored in signalled order, which is not necessarily RGB.
/// Luminance bounds are converted from 0.0001 cd/m2 units to nits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MasteringDisplayColourVolume {
    pub display_primaries: [DisplayPrimary; 3],
    pub white_point: DisplayPrimary,
    pub max_luminance: f64,
    pub min_luminance: f64,
}

/// Content light level information (SEI payload type 144).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentLightLevel {
    pub max_content_light_level: u16,
    pub max_frame_average_light_level: u16,
}
