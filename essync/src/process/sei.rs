//! HEVC SEI message enumeration and HDR metadata extraction.
//!
//! Operates on prefix SEI NAL units. Messages are located within the
//! emulation-cleared RBSP so payloads can be decoded in place or excised
//! and the remainder re-escaped.

use crate::structs::hdr10plus::Hdr10PlusMetadata;
use crate::structs::sei::{
    ContentLightLevel, DisplayPrimary, MasteringDisplayColourVolume, SeiMessage,
};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::SeiError;
use crate::utils::nal::{add_emulation_prevention, clear_emulation_prevention};

// ITU-T T.35: United States, Samsung Electronics America, ST 2094-40
const T35_COUNTRY_CODE_US: u8 = 0xB5;
const T35_PROVIDER_CODE_SAMSUNG: u16 = 0x003C;
const T35_PROVIDER_ORIENTED_CODE_ST2094_40: u16 = 0x0001;

// G, B, R, W chromaticity pairs in signalling units
const KNOWN_COLOUR_VOLUMES: [(u8, [u16; 8]); 4] = [
    (1, [15000, 30000, 7500, 3000, 32000, 16500, 15635, 16450]), // BT.709
    (9, [8500, 39850, 6550, 2300, 35400, 14600, 15635, 16450]),  // BT.2020
    (11, [13250, 34500, 7500, 3000, 34000, 16000, 15700, 17550]), // DCI P3
    (12, [13250, 34500, 7500, 3000, 34000, 16000, 15635, 16450]), // Display P3
];

/// Parses a single SEI message header and skips over its payload.
fn parse_sei_message(br: &mut BsIoSliceReader) -> Result<SeiMessage, SeiError> {
    let mut message = SeiMessage {
        msg_offset: (br.position()? / 8) as usize,
        ..Default::default()
    };

    let mut byte: u8 = br.get_n(8)?;
    while byte == 0xFF {
        message.payload_type += 255;
        byte = br.get_n(8)?;
    }
    message.payload_type += byte as u32;

    let mut byte: u8 = br.get_n(8)?;
    while byte == 0xFF {
        message.payload_size += 255;
        byte = br.get_n(8)?;
    }
    message.payload_size += byte as usize;

    message.payload_offset = (br.position()? / 8) as usize;

    let remaining = br.available()?;
    if message.payload_size as u64 > remaining {
        return Err(SeiError::PayloadTooLarge {
            size: message.payload_size as u64,
            remaining,
        });
    }

    let payload_bits = (message.payload_size as u64 * 8).min(remaining);
    br.skip_n(payload_bits as u32)?;

    Ok(message)
}

/// Enumerates the SEI messages of an RBSP without emulation prevention bytes.
///
/// The 2-byte NAL unit header is skipped; the caller is expected to have
/// verified the NAL unit type.
pub fn parse_sei_rbsp(buf: &[u8]) -> Vec<SeiMessage> {
    let mut messages = Vec::new();

    if buf.len() > 4 {
        let mut br = BsIoSliceReader::from_slice(buf);

        // forbidden_zero_bit, nal_type, nuh_layer_id, temporal_id
        if br.skip_n(16).is_err() {
            return messages;
        }

        loop {
            match parse_sei_message(&mut br) {
                Ok(message) => messages.push(message),
                Err(_) => break,
            }

            match br.available() {
                Ok(avail) if avail > 8 => {}
                _ => break,
            }
        }
    }

    messages
}

/// Clears emulation prevention bytes, then enumerates the SEI messages.
///
/// Returns the cleared buffer alongside the messages, whose offsets refer
/// to that buffer.
pub fn parse_sei_rbsp_uncleared_emulation(data: &[u8]) -> (Vec<u8>, Vec<SeiMessage>) {
    let buf = clear_emulation_prevention(data);
    let messages = parse_sei_rbsp(&buf);

    (buf, messages)
}

/// Finds an HDR10+ (ST 2094-40) user data registered message, if present.
pub fn find_hdr10plus_sei<'a>(
    buf: &[u8],
    messages: &'a [SeiMessage],
) -> Option<&'a SeiMessage> {
    for sei in messages {
        if let Some(payload) = t35_hdr10plus_payload(buf, sei) {
            let mut br = BsIoSliceReader::from_slice(payload);
            if identify_hdr10plus(&mut br).unwrap_or(false) {
                return Some(sei);
            }
        }
    }

    None
}

/// Decodes the HDR10+ dynamic metadata from the message list, if present.
pub fn extract_hdr10plus(
    messages: &[SeiMessage],
    buf: &[u8],
) -> Option<Hdr10PlusMetadata> {
    for sei in messages {
        if let Some(payload) = t35_hdr10plus_payload(buf, sei) {
            let mut br = BsIoSliceReader::from_slice(payload);
            if identify_hdr10plus(&mut br).unwrap_or(false) {
                let mut br = BsIoSliceReader::from_slice(payload);
                return Hdr10PlusMetadata::read(&mut br).ok();
            }
        }
    }

    None
}

/// Decodes the mastering display colour volume (payload type 137), if present.
pub fn extract_mastering_display(
    messages: &[SeiMessage],
    buf: &[u8],
) -> Option<MasteringDisplayColourVolume> {
    for sei in messages {
        if sei.payload_type == 137 && sei.payload_size >= 24 {
            let payload = buf.get(sei.payload_offset..sei.payload_offset + sei.payload_size)?;
            return read_mastering_display(payload).ok();
        }
    }

    None
}

/// Decodes the content light level information (payload type 144), if present.
pub fn extract_content_light_level(
    messages: &[SeiMessage],
    buf: &[u8],
) -> Option<ContentLightLevel> {
    for sei in messages {
        if sei.payload_type == 144 && sei.payload_size >= 4 {
            let payload = buf.get(sei.payload_offset..sei.payload_offset + sei.payload_size)?;
            let mut br = BsIoSliceReader::from_slice(payload);

            let read = |br: &mut BsIoSliceReader| -> std::io::Result<ContentLightLevel> {
                Ok(ContentLightLevel {
                    max_content_light_level: br.get_n(16)?,
                    max_frame_average_light_level: br.get_n(16)?,
                })
            };

            return read(&mut br).ok();
        }
    }

    None
}

/// Removes the HDR10+ SEI message from a prefix SEI NAL unit.
///
/// Returns the re-escaped NAL unit with the message excised, or an empty
/// vector when the unit held only the HDR10+ message (or none at all) and
/// can be discarded.
pub fn remove_hdr10plus_from_sei_nalu(data: &[u8]) -> Vec<u8> {
    let (mut buf, messages) = parse_sei_rbsp_uncleared_emulation(data);

    match find_hdr10plus_sei(&buf, &messages).copied() {
        Some(msg) if messages.len() > 1 => {
            buf.drain(msg.msg_offset..msg.payload_offset + msg.payload_size);
            add_emulation_prevention(&mut buf);
        }
        _ => buf.clear(),
    }

    buf
}

/// Describes the mastering display primaries, matching well-known colour
/// volumes by tolerance before falling back to raw coordinates.
pub fn mastering_display_text(mdcv: &MasteringDisplayColourVolume) -> String {
    let mut r = None;
    let mut g = None;
    let mut b = None;

    for (c, p) in mdcv.display_primaries.iter().enumerate() {
        if p.x < 17500 && p.y < 17500 {
            b = Some(c); // x and y small then blue
        } else if p.y >= p.x {
            g = Some(c); // y > x then green
        } else {
            r = Some(c);
        }
    }

    // order not detected, assume GBR
    let (g, b, r) = match (g, b, r) {
        (Some(g), Some(b), Some(r)) => (g, b, r),
        _ => (0, 1, 2),
    };

    let gp = mdcv.display_primaries[g];
    let bp = mdcv.display_primaries[b];
    let rp = mdcv.display_primaries[r];
    let wp = mdcv.white_point;

    for (code, v) in &KNOWN_COLOUR_VOLUMES {
        // primaries within +/- 0.0005, white point within -0.0001/+0.00015
        let matches = within(gp.x, v[0], 25)
            && within(gp.y, v[1], 25)
            && within(bp.x, v[2], 25)
            && within(bp.y, v[3], 25)
            && within(rp.x, v[4], 25)
            && within(rp.y, v[5], 25)
            && wp.x >= v[6] - 2
            && wp.x < v[6] + 3
            && wp.y >= v[7] - 2
            && wp.y < v[7] + 3;

        if matches {
            return colour_primaries_name(*code).to_string();
        }
    }

    format!(
        "R:{},{} G:{},{} B:{},{} W:{},{}",
        rp.x, rp.y, gp.x, gp.y, bp.x, bp.y, wp.x, wp.y
    )
}

fn within(p: u16, v: u16, tolerance: u16) -> bool {
    p >= v - tolerance && p < v + tolerance
}

fn colour_primaries_name(code: u8) -> &'static str {
    match code {
        1 => "BT.709",
        4 => "BT.470 System M",
        5 => "BT.601 PAL",
        6 => "BT.601 NTSC",
        7 => "SMPTE 240M",
        8 => "Generic film",
        9 => "BT.2020",
        10 => "XYZ",
        11 => "DCI P3",
        12 => "Display P3",
        22 => "EBU Tech 3213",
        _ => "",
    }
}

fn t35_hdr10plus_payload<'a>(buf: &'a [u8], sei: &SeiMessage) -> Option<&'a [u8]> {
    if sei.payload_type == 4 && sei.payload_size >= 7 {
        buf.get(sei.payload_offset..sei.payload_offset + sei.payload_size)
    } else {
        None
    }
}

fn identify_hdr10plus(br: &mut BsIoSliceReader) -> std::io::Result<bool> {
    let itu_t_t35_country_code: u8 = br.get_n(8)?;
    let itu_t_t35_terminal_provider_code: u16 = br.get_n(16)?;
    let itu_t_t35_terminal_provider_oriented_code: u16 = br.get_n(16)?;

    if itu_t_t35_country_code != T35_COUNTRY_CODE_US
        || itu_t_t35_terminal_provider_code != T35_PROVIDER_CODE_SAMSUNG
        || itu_t_t35_terminal_provider_oriented_code != T35_PROVIDER_ORIENTED_CODE_ST2094_40
    {
        return Ok(false);
    }

    let application_identifier: u8 = br.get_n(8)?;
    let application_version: u8 = br.get_n(8)?;

    Ok(application_identifier == 4 && application_version <= 1)
}

fn read_mastering_display(payload: &[u8]) -> std::io::Result<MasteringDisplayColourVolume> {
    let mut br = BsIoSliceReader::from_slice(payload);
    let mut mdcv = MasteringDisplayColourVolume::default();

    for primary in &mut mdcv.display_primaries {
        primary.x = br.get_n(16)?;
        primary.y = br.get_n(16)?;
    }

    mdcv.white_point = DisplayPrimary {
        x: br.get_n(16)?,
        y: br.get_n(16)?,
    };

    // signalled in units of 0.0001 cd/m2
    mdcv.max_luminance = br.get_n::<u32>(32)? as f64 / 10000.0;
    mdcv.min_luminance = br.get_n::<u32>(32)? as f64 / 10000.0;

    Ok(mdcv)
}
