//! ST 2094-40 (HDR10+) dynamic metadata.

use std::io;

use crate::utils::bitstream_io::BsIoSliceReader;

/// Elliptical processing window for windows beyond the first.
///
/// The first window always covers the whole picture and carries no
/// geometry of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingWindow {
    pub window_upper_left_corner_x: u16,
    pub window_upper_left_corner_y: u16,
    pub window_lower_right_corner_x: u16,
    pub window_lower_right_corner_y: u16,

    pub center_of_ellipse_x: u16,
    pub center_of_ellipse_y: u16,
    pub rotation_angle: u8,

    pub semimajor_axis_internal_ellipse: u16,
    pub semimajor_axis_external_ellipse: u16,
    pub semiminor_axis_external_ellipse: u16,

    pub overlap_process_option: bool,
}

/// One bucket of the maxRGB distribution histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistributionMaxRgb {
    pub percentage: u8,
    pub percentile: u32,
}

/// Targeted system display actual peak luminance matrix, 4-bit cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActualTargetedSystemDisplay {
    pub peak_luminance: Vec<Vec<u8>>,
}

/// Mastering display actual peak luminance matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActualMasteringDisplay {
    pub num_rows: u8,
    pub num_cols: u8,
    pub peak_luminance: Vec<u8>,
}

/// Tone mapping curve as a knee point plus Bezier anchors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BezierCurve {
    pub knee_point_x: u16,
    pub knee_point_y: u16,
    pub bezier_curve_anchors: Vec<u16>,
}

/// Per-window luminance statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Luminance {
    pub maxscl: [u32; 3],
    pub average_maxrgb: u32,
    pub distribution_maxrgb: Vec<DistributionMaxRgb>,
    pub fraction_bright_pixels: u16,
}

/// HDR10+ metadata as carried in a user data registered ITU-T T.35 SEI
/// message, including the T.35 preamble.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hdr10PlusMetadata {
    pub itu_t_t35_country_code: u8,
    pub itu_t_t35_terminal_provider_code: u16,
    pub itu_t_t35_terminal_provider_oriented_code: u16,

    pub application_identifier: u8,
    pub application_version: u8,

    pub num_windows: u8,
    /// Geometry for windows 1.., absent for a single-window frame.
    pub processing_windows: Vec<ProcessingWindow>,

    pub targeted_system_display_maximum_luminance: u32,
    pub targeted_system_display_actual_peak_luminance_flag: bool,
    pub actual_targeted_system_display: ActualTargetedSystemDisplay,

    /// One entry per window.
    pub luminance: Vec<Luminance>,

    pub mastering_display_actual_peak_luminance_flag: bool,
    pub actual_mastering_display: ActualMasteringDisplay,

    pub tone_mapping_flag: bool,
    pub bezier_curve: BezierCurve,

    pub color_saturation_mapping_flag: bool,
    pub color_saturation_weight: u8,
}

impl Hdr10PlusMetadata {
    pub fn read(br: &mut BsIoSliceReader) -> io::Result<Self> {
        let mut meta = Self {
            itu_t_t35_country_code: br.get_n(8)?,
            itu_t_t35_terminal_provider_code: br.get_n(16)?,
            itu_t_t35_terminal_provider_oriented_code: br.get_n(16)?,
            application_identifier: br.get_n(8)?,
            application_version: br.get_n(8)?,
            num_windows: br.get_n(2)?,
            ..Default::default()
        };

        for _ in 1..meta.num_windows {
            meta.processing_windows.push(ProcessingWindow::read(br)?);
        }

        meta.targeted_system_display_maximum_luminance = br.get_n(27)?;
        meta.targeted_system_display_actual_peak_luminance_flag = br.get()?;

        if meta.targeted_system_display_actual_peak_luminance_flag {
            let num_rows: u8 = br.get_n(5)?;
            let num_cols: u8 = br.get_n(5)?;

            for _ in 0..num_rows {
                let mut row = Vec::with_capacity(num_cols as usize);
                for _ in 0..num_cols {
                    row.push(br.get_n(4)?);
                }
                meta.actual_targeted_system_display.peak_luminance.push(row);
            }
        }

        for _ in 0..meta.num_windows {
            meta.luminance.push(Luminance::read(br)?);
        }

        meta.mastering_display_actual_peak_luminance_flag = br.get()?;
        if meta.mastering_display_actual_peak_luminance_flag {
            let display = &mut meta.actual_mastering_display;
            display.num_rows = br.get_n(5)?;
            display.num_cols = br.get_n(5)?;

            let cells = display.num_rows as usize * display.num_cols as usize;
            for _ in 0..cells {
                display.peak_luminance.push(br.get_n(4)?);
            }
        }

        meta.tone_mapping_flag = br.get()?;
        if meta.tone_mapping_flag {
            let curve = &mut meta.bezier_curve;
            curve.knee_point_x = br.get_n(12)?;
            curve.knee_point_y = br.get_n(12)?;

            let num_anchors: u8 = br.get_n(4)?;
            for _ in 0..num_anchors {
                curve.bezier_curve_anchors.push(br.get_n(10)?);
            }
        }

        meta.color_saturation_mapping_flag = br.get()?;
        if meta.color_saturation_mapping_flag {
            meta.color_saturation_weight = br.get_n(6)?;
        }

        Ok(meta)
    }
}

impl ProcessingWindow {
    fn read(br: &mut BsIoSliceReader) -> io::Result<Self> {
        Ok(Self {
            window_upper_left_corner_x: br.get_n(16)?,
            window_upper_left_corner_y: br.get_n(16)?,
            window_lower_right_corner_x: br.get_n(16)?,
            window_lower_right_corner_y: br.get_n(16)?,
            center_of_ellipse_x: br.get_n(16)?,
            center_of_ellipse_y: br.get_n(16)?,
            rotation_angle: br.get_n(8)?,
            semimajor_axis_internal_ellipse: br.get_n(16)?,
            semimajor_axis_external_ellipse: br.get_n(16)?,
            semiminor_axis_external_ellipse: br.get_n(16)?,
            overlap_process_option: br.get()?,
        })
    }
}

impl Luminance {
    fn read(br: &mut BsIoSliceReader) -> io::Result<Self> {
        let mut luminance = Self::default();

        for maxscl in &mut luminance.maxscl {
            *maxscl = br.get_n(17)?;
        }
        luminance.average_maxrgb = br.get_n(17)?;

        let num_percentiles: u8 = br.get_n(4)?;
        for _ in 0..num_percentiles {
            luminance.distribution_maxrgb.push(DistributionMaxRgb {
                percentage: br.get_n(7)?,
                percentile: br.get_n(17)?,
            });
        }

        luminance.fraction_bright_pixels = br.get_n(10)?;

        Ok(luminance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoWriter;

    fn write_preamble(bw: &mut BsIoWriter) {
        bw.put_n(8, 0xB5u8).unwrap();
        bw.put_n(16, 0x003Cu16).unwrap();
        bw.put_n(16, 0x0001u16).unwrap();
        bw.put_n(8, 4u8).unwrap();
        bw.put_n(8, 1u8).unwrap();
    }

    #[test]
    fn reads_single_window_metadata() {
        let mut bw = BsIoWriter::default();
        write_preamble(&mut bw);

        bw.put_n(2, 1u8).unwrap(); // num_windows
        bw.put_n(27, 400u32).unwrap();
        bw.put(false).unwrap();

        for maxscl in [99000u32, 98000, 64000] {
            bw.put_n(17, maxscl).unwrap();
        }
        bw.put_n(17, 11000u32).unwrap(); // average_maxrgb

        bw.put_n(4, 9u8).unwrap();
        let percentages = [1u8, 5, 10, 25, 50, 75, 90, 95, 99];
        for (i, pct) in percentages.into_iter().enumerate() {
            bw.put_n(7, pct).unwrap();
            bw.put_n(17, 1000 * (i as u32 + 1)).unwrap();
        }
        bw.put_n(10, 7u16).unwrap(); // fraction_bright_pixels

        bw.put(false).unwrap(); // mastering_display_actual_peak_luminance_flag

        bw.put(true).unwrap(); // tone_mapping_flag
        bw.put_n(12, 2048u16).unwrap();
        bw.put_n(12, 1024u16).unwrap();
        bw.put_n(4, 2u8).unwrap();
        bw.put_n(10, 512u16).unwrap();
        bw.put_n(10, 768u16).unwrap();

        bw.put(true).unwrap(); // color_saturation_mapping_flag
        bw.put_n(6, 33u8).unwrap();
        bw.byte_align().unwrap();

        let payload = bw.into_inner().unwrap();
        let mut br = BsIoSliceReader::from_slice(&payload);
        let meta = Hdr10PlusMetadata::read(&mut br).unwrap();

        assert_eq!(meta.itu_t_t35_country_code, 0xB5);
        assert_eq!(meta.application_identifier, 4);
        assert_eq!(meta.num_windows, 1);
        assert!(meta.processing_windows.is_empty());
        assert_eq!(meta.targeted_system_display_maximum_luminance, 400);

        let luminance = &meta.luminance[0];
        assert_eq!(luminance.maxscl, [99000, 98000, 64000]);
        assert_eq!(luminance.average_maxrgb, 11000);
        assert_eq!(luminance.distribution_maxrgb.len(), 9);
        assert_eq!(luminance.distribution_maxrgb[1].percentage, 5);
        assert_eq!(luminance.distribution_maxrgb[8].percentile, 9000);
        assert_eq!(luminance.fraction_bright_pixels, 7);

        assert!(meta.tone_mapping_flag);
        assert_eq!(meta.bezier_curve.knee_point_x, 2048);
        assert_eq!(meta.bezier_curve.bezier_curve_anchors, vec![512, 768]);

        assert!(meta.color_saturation_mapping_flag);
        assert_eq!(meta.color_saturation_weight, 33);
    }

    #[test]
    fn reads_multi_window_metadata_with_peak_matrices() {
        let mut bw = BsIoWriter::default();
        write_preamble(&mut bw);

        bw.put_n(2, 2u8).unwrap(); // num_windows

        // window 1 geometry
        for corner in [0u16, 0, 1919, 1079, 960, 540] {
            bw.put_n(16, corner).unwrap();
        }
        bw.put_n(8, 90u8).unwrap();
        for axis in [100u16, 200, 150] {
            bw.put_n(16, axis).unwrap();
        }
        bw.put(true).unwrap();

        bw.put_n(27, 1000u32).unwrap();
        bw.put(true).unwrap();
        bw.put_n(5, 2u8).unwrap(); // rows
        bw.put_n(5, 3u8).unwrap(); // cols
        for cell in [1u8, 2, 3, 4, 5, 6] {
            bw.put_n(4, cell).unwrap();
        }

        for _ in 0..2 {
            for maxscl in [50000u32, 40000, 30000] {
                bw.put_n(17, maxscl).unwrap();
            }
            bw.put_n(17, 9000u32).unwrap();
            bw.put_n(4, 0u8).unwrap();
            bw.put_n(10, 0u16).unwrap();
        }

        bw.put(true).unwrap(); // mastering_display_actual_peak_luminance_flag
        bw.put_n(5, 1u8).unwrap();
        bw.put_n(5, 2u8).unwrap();
        bw.put_n(4, 8u8).unwrap();
        bw.put_n(4, 9u8).unwrap();

        bw.put(false).unwrap(); // tone_mapping_flag
        bw.put(false).unwrap(); // color_saturation_mapping_flag
        bw.byte_align().unwrap();

        let payload = bw.into_inner().unwrap();
        let mut br = BsIoSliceReader::from_slice(&payload);
        let meta = Hdr10PlusMetadata::read(&mut br).unwrap();

        assert_eq!(meta.num_windows, 2);
        assert_eq!(meta.processing_windows.len(), 1);

        let window = &meta.processing_windows[0];
        assert_eq!(window.window_lower_right_corner_x, 1919);
        assert_eq!(window.rotation_angle, 90);
        assert!(window.overlap_process_option);

        assert_eq!(
            meta.actual_targeted_system_display.peak_luminance,
            vec![vec![1, 2, 3], vec![4, 5, 6]]
        );

        assert_eq!(meta.luminance.len(), 2);

        assert_eq!(meta.actual_mastering_display.num_rows, 1);
        assert_eq!(meta.actual_mastering_display.num_cols, 2);
        assert_eq!(meta.actual_mastering_display.peak_luminance, vec![8, 9]);
    }

    #[test]
    fn truncated_payload_fails() {
        let mut bw = BsIoWriter::default();
        write_preamble(&mut bw);
        bw.put_n(2, 1u8).unwrap();
        bw.put_n(6, 0u8).unwrap(); // cut off inside the luminance field

        let payload = bw.into_inner().unwrap();
        let mut br = BsIoSliceReader::from_slice(&payload);

        assert!(Hdr10PlusMetadata::read(&mut br).is_err());
    }
}
