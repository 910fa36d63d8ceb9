//! HDR10+ dynamic metadata to Dolby Vision display management conversion.
//!
//! Derives per-frame L1 luminance statistics from the HDR10+ histogram and
//! wraps them in a profile 8.1 RPU NAL unit. Consecutive frames with
//! identical derived values reuse the previously serialized unit.

use log::info;

use crate::structs::hdr10plus::Hdr10PlusMetadata;
use crate::structs::rpu::{VdrDmData, create_rpu_nalu};
use crate::utils::errors::RpuError;

// SMPTE ST 2084 perceptual quantizer
const ST2084_Y_MAX: f64 = 10000.0;
const ST2084_M1: f64 = 2610.0 / 16384.0;
const ST2084_M2: f64 = 2523.0 / 4096.0 * 128.0;
const ST2084_C1: f64 = 3424.0 / 4096.0;
const ST2084_C2: f64 = 2413.0 / 4096.0 * 32.0;
const ST2084_C3: f64 = 2392.0 / 4096.0 * 32.0;

const L1_MAX_PQ_MIN_VALUE: u16 = 2081;
const L1_MAX_PQ_MAX_VALUE: u16 = 4095;
const L1_AVG_PQ_MIN_VALUE: u16 = 819;

/// Strategy for deriving the frame peak brightness from the HDR10+
/// luminance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakBrightnessSource {
    /// Largest value across all histogram buckets.
    #[default]
    Histogram,
    /// Last histogram bucket, the 99th percentile in conforming streams.
    Histogram99,
    /// Largest of the three MaxSCL components.
    MaxScl,
    /// MaxSCL components weighted with the BT.2100 luminance coefficients.
    MaxSclLuminance,
    /// Blend of the top histogram buckets, falling back to their mean when
    /// the histogram does not use the standard 9-bucket layout.
    HistogramPlus,
}

/// Maps display luminance in cd/m2 to a normalized PQ signal value.
pub fn nits_to_pq(nits: f64) -> f64 {
    let y = nits / ST2084_Y_MAX;

    ((ST2084_C1 + ST2084_C2 * y.powf(ST2084_M1)) / (1.0 + ST2084_C3 * y.powf(ST2084_M1)))
        .powf(ST2084_M2)
}

/// Peak brightness of the first processing window in nits.
pub fn peak_brightness_nits(meta: &Hdr10PlusMetadata, source: PeakBrightnessSource) -> f64 {
    let Some(luminance) = meta.luminance.first() else {
        return 0.0;
    };

    match source {
        PeakBrightnessSource::Histogram => luminance
            .distribution_maxrgb
            .iter()
            .map(|d| d.percentile)
            .max()
            .map_or(0.0, |max| max as f64 / 10.0),

        PeakBrightnessSource::Histogram99 => luminance
            .distribution_maxrgb
            .last()
            .map_or(0.0, |d| d.percentile as f64 / 10.0),

        PeakBrightnessSource::MaxScl => {
            luminance.maxscl.iter().copied().max().unwrap_or(0) as f64 / 10.0
        }

        PeakBrightnessSource::MaxSclLuminance => {
            let [r, g, b] = luminance.maxscl.map(f64::from);
            (0.2627 * r + 0.678 * g + 0.0593 * b) / 10.0
        }

        PeakBrightnessSource::HistogramPlus => {
            let d = &luminance.distribution_maxrgb;
            if d.is_empty() {
                return 0.0;
            }

            // standard 9-bucket layout blends the 90/95/99th percentiles
            if d.len() == 9 && d[1].percentage == 5 && d[2].percentage == 10 {
                (0.5 * d[8].percentile as f64
                    + 0.25 * d[7].percentile as f64
                    + 0.25 * d[6].percentile as f64)
                    / 10.0
            } else {
                let sum: f64 = d.iter().map(|d| d.percentile as f64).sum();
                sum / d.len() as f64 / 10.0
            }
        }
    }
}

/// Converts HDR10+ metadata into profile 8.1 RPU NAL units, caching the
/// last serialized unit across frames.
#[derive(Debug, Default)]
pub struct RpuConverter {
    last_vdr: Option<VdrDmData>,
    last_rpu: Vec<u8>,
}

impl RpuConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives display management data from `meta` and returns the RPU NAL
    /// unit carrying it.
    ///
    /// The mastering display and content light level arguments fill the
    /// static L6 block and the `max_pq` fallback when the histogram holds
    /// no usable data.
    pub fn convert(
        &mut self,
        meta: &Hdr10PlusMetadata,
        source: PeakBrightnessSource,
        max_display_mastering_luminance: u16,
        min_display_mastering_luminance: u16,
        max_content_light_level: u16,
        max_frame_average_light_level: u16,
    ) -> Result<Vec<u8>, RpuError> {
        let avg_nits = meta
            .luminance
            .first()
            .map_or(0.0, |l| l.average_maxrgb as f64 / 10.0);
        let max_nits = peak_brightness_nits(meta, source);

        // mastering display minimum is quantized to a few standard values
        let min_pq = if min_display_mastering_luminance <= 10 {
            7
        } else if min_display_mastering_luminance == 50 {
            62
        } else {
            0
        };

        let mut max_pq = (nits_to_pq(max_nits) * 4095.0).round() as u16;
        if max_pq == 0 {
            max_pq = match max_display_mastering_luminance {
                2000 => 3388,
                4000 => 3696,
                10000 => 4095,
                _ => 3079,
            };
        }
        let max_pq = max_pq.clamp(L1_MAX_PQ_MIN_VALUE, L1_MAX_PQ_MAX_VALUE);

        let avg_pq = (nits_to_pq(avg_nits) * 4095.0).round() as u16;

        let vdr = VdrDmData {
            min_pq,
            max_pq,
            avg_pq: avg_pq.clamp(L1_AVG_PQ_MIN_VALUE, max_pq - 1),
            max_display_mastering_luminance,
            min_display_mastering_luminance,
            max_content_light_level,
            max_frame_average_light_level,
        };

        if self.last_vdr != Some(vdr) {
            self.last_rpu = create_rpu_nalu(&vdr)?;
            self.last_vdr = Some(vdr);

            info!(
                "rpu: min_pq {} max_pq {} avg_pq {} mdml max {} mdml min {} cll {} fall {}",
                vdr.min_pq,
                vdr.max_pq,
                vdr.avg_pq,
                vdr.max_display_mastering_luminance,
                vdr.min_display_mastering_luminance,
                vdr.max_content_light_level,
                vdr.max_frame_average_light_level
            );
        }

        Ok(self.last_rpu.clone())
    }
}
