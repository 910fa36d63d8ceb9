//! Dolby Vision profile 8.1 RPU serialization.
//!
//! Produces a fixed-layout RPU data record carrying only display management
//! metadata: the base layer is passed through untouched (no residual, no
//! composer curve beyond identity polynomials), so the record varies only in
//! the six L1/L6 luminance fields.

use std::io;

use crate::utils::bitstream_io::BsIoWriter;
use crate::utils::crc::{CRC_RPU_ALG, Crc32};
use crate::utils::errors::RpuError;
use crate::utils::nal::add_emulation_prevention;

const RPU_DATA_PREFIX: u8 = 0x19;
const RPU_FINAL_BYTE: u8 = 0x80;

const CRC_RPU: Crc32 = Crc32::new(&CRC_RPU_ALG);

/// Display management values carried in the L1 and L6 extension blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VdrDmData {
    pub min_pq: u16,
    pub max_pq: u16,
    pub avg_pq: u16,

    pub max_display_mastering_luminance: u16,
    pub min_display_mastering_luminance: u16,
    pub max_content_light_level: u16,
    pub max_frame_average_light_level: u16,
}

fn write_rpu(bw: &mut BsIoWriter, vdr: &VdrDmData) -> io::Result<()> {
    bw.put_n(6, 2u8)?; // rpu_type, BDA Option-A HDR coding system
    bw.put_n(11, 18u16)?; // rpu_format
    bw.put_n(4, 1u8)?; // vdr_rpu_profile
    bw.put_n(4, 0u8)?; // vdr_rpu_level
    bw.put(true)?; // vdr_seq_info_present_flag
    bw.put(false)?; // chroma_resampling_explicit_filter_flag
    bw.put_n(2, 0u8)?; // coefficient_data_type
    bw.put_ue(23)?; // coefficient_log2_denom
    bw.put_n(2, 1u8)?; // vdr_rpu_normalized_idc

    bw.put(false)?; // bl_video_full_range_flag
    bw.put_ue(2)?; // bl_bit_depth_minus8
    bw.put_ue(2)?; // el_bit_depth_minus8
    bw.put_ue(4)?; // vdr_bit_depth_minus8
    bw.put(false)?; // spatial_resampling_filter_flag
    bw.put_n(3, 0u8)?; // reserved_zero_3bits

    bw.put(false)?; // el_spatial_resampling_filter_flag
    bw.put(true)?; // disable_residual_flag

    bw.put(true)?; // vdr_dm_metadata_present_flag
    bw.put(false)?; // use_prev_vdr_rpu_flag

    bw.put_ue(0)?; // vdr_rpu_id
    bw.put_ue(0)?; // mapping_color_space
    bw.put_ue(0)?; // mapping_chroma_format_idc

    // identity pivots per component
    for _ in 0..3 {
        bw.put_ue(0)?; // num_pivots_minus2
        bw.put_n(10, 0u16)?;
        bw.put_n(10, 1023u16)?;
    }

    bw.put_ue(0)?; // num_x_partitions_minus1
    bw.put_ue(0)?; // num_y_partitions_minus1

    // first order polynomial y = x per component
    for _ in 0..3 {
        bw.put_ue(0)?; // mapping_idc, polynomial
        bw.put_ue(0)?; // poly_order_minus1
        bw.put(false)?; // linear_interp_flag
        bw.put_se(0)?; // poly_coef_int
        bw.put_n(23, 0u32)?; // poly_coef
        bw.put_se(1)?; // poly_coef_int
        bw.put_n(23, 0u32)?; // poly_coef
    }

    bw.put_ue(0)?; // affected_dm_metadata_id
    bw.put_ue(0)?; // current_dm_metadata_id
    bw.put_ue(1)?; // scene_refresh_flag

    // BT.2020 YCbCr to RGB
    for coef in [9574i16, 0, 13802, 9574, -1540, -5348, 9574, 17610, 0] {
        bw.put_s(16, coef)?;
    }
    for offset in [16777216u32, 134217728, 134217728] {
        bw.put_n(32, offset)?;
    }

    // RGB to LMS
    for coef in [7222i16, 8771, 390, 2654, 12430, 1300, 0, 422, 15962] {
        bw.put_s(16, coef)?;
    }

    // Ultra HD Blu-ray signal description
    bw.put_n(16, 65535u16)?; // signal_eotf
    bw.put_n(16, 0u16)?; // signal_eotf_param0
    bw.put_n(16, 0u16)?; // signal_eotf_param1
    bw.put_n(32, 0u32)?; // signal_eotf_param2

    bw.put_n(5, 12u8)?; // signal_bit_depth
    bw.put_n(2, 0u8)?; // signal_color_space, YCbCr
    bw.put_n(2, 0u8)?; // signal_chroma_format
    bw.put_n(2, 1u8)?; // signal_full_range_flag

    bw.put_n(12, vdr.min_pq)?;
    bw.put_n(12, vdr.max_pq)?;

    bw.put_n(10, 42u16)?; // source_diagonal

    bw.put_ue(3)?; // num_ext_blocks
    bw.byte_align()?; // dm_alignment_zero_bit

    // L1, content luminance range
    bw.put_ue(5)?; // ext_block_length
    bw.put_n(8, 1u8)?; // ext_block_level
    bw.put_n(12, vdr.min_pq)?;
    bw.put_n(12, vdr.max_pq)?;
    bw.put_n(12, vdr.avg_pq)?;
    bw.put_n(4, 0u8)?;

    // L5, active area offsets
    bw.put_ue(7)?;
    bw.put_n(8, 5u8)?;
    for _ in 0..4 {
        bw.put_n(13, 0u16)?;
    }
    bw.put_n(4, 0u8)?;

    // L6, static mastering display and content light levels
    bw.put_ue(8)?;
    bw.put_n(8, 6u8)?;
    bw.put_n(16, vdr.max_display_mastering_luminance)?;
    bw.put_n(16, vdr.min_display_mastering_luminance)?;
    bw.put_n(16, vdr.max_content_light_level)?;
    bw.put_n(16, vdr.max_frame_average_light_level)?;

    bw.byte_align()?; // ext_dm_alignment_zero_bit

    Ok(())
}

/// Serializes `vdr` into a complete, escaped RPU NAL unit.
pub fn create_rpu_nalu(vdr: &VdrDmData) -> Result<Vec<u8>, RpuError> {
    let mut bw = BsIoWriter::with_capacity(133);

    bw.put_n(8, RPU_DATA_PREFIX)?;
    write_rpu(&mut bw, vdr)?;

    if !bw.is_aligned() {
        return Err(RpuError::Misaligned);
    }

    let mut out = bw.into_inner()?;

    // checksum covers the record body, not the prefix byte
    let crc = CRC_RPU.update(CRC_RPU.init, &out[1..]);
    out.extend_from_slice(&crc.to_be_bytes());
    out.push(RPU_FINAL_BYTE);

    add_emulation_prevention(&mut out);
    out.splice(0..0, [0x7C, 0x01]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vdr() -> VdrDmData {
        VdrDmData {
            min_pq: 7,
            max_pq: 3079,
            avg_pq: 1229,
            max_display_mastering_luminance: 1000,
            min_display_mastering_luminance: 1,
            max_content_light_level: 1000,
            max_frame_average_light_level: 400,
        }
    }

    #[test]
    fn nalu_framing() {
        let nalu = create_rpu_nalu(&sample_vdr()).unwrap();

        // unspecified NAL type 62, then the DM data payload
        assert_eq!(&nalu[..3], &[0x7C, 0x01, 0x19]);
        // rpu_type 2 and the head of rpu_format
        assert_eq!(nalu[3], 0x08);
        assert_eq!(*nalu.last().unwrap(), 0x80);

        // 133 byte record before escaping
        let record = crate::utils::nal::clear_emulation_prevention(&nalu[2..]);
        assert_eq!(record.len(), 133);
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = create_rpu_nalu(&sample_vdr()).unwrap();
        let b = create_rpu_nalu(&sample_vdr()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn luminance_fields_change_the_record() {
        let base = create_rpu_nalu(&sample_vdr()).unwrap();

        let mut vdr = sample_vdr();
        vdr.avg_pq += 1;
        let changed = create_rpu_nalu(&vdr).unwrap();

        assert_ne!(base, changed);
    }

    #[test]
    fn crc_validates_record_body() {
        let nalu = create_rpu_nalu(&sample_vdr()).unwrap();

        // undo the NAL header and escaping to inspect the raw record
        let record = crate::utils::nal::clear_emulation_prevention(&nalu[2..]);
        let body_end = record.len() - 5;

        let crc = CRC_RPU.update(CRC_RPU.init, &record[1..body_end]);
        assert_eq!(&record[body_end..body_end + 4], &crc.to_be_bytes());
    }
}
