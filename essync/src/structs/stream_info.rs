//! Detected stream properties.

use std::fmt;

use log::error;

/// Elementary stream classification produced by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    #[default]
    Null,
    Ac3,
    Eac3,
    TrueHd,
    Dts512,
    Dts1024,
    Dts2048,
    DtsHd,
    DtsHdCore,
    DtsHdMa,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamType::Null => "unknown",
            StreamType::Ac3 => "AC3",
            StreamType::Eac3 => "E-AC3",
            StreamType::TrueHd => "TrueHD",
            StreamType::Dts512 => "DTS (512 samples)",
            StreamType::Dts1024 => "DTS (1024 samples)",
            StreamType::Dts2048 => "DTS (2048 samples)",
            StreamType::DtsHd => "dtsHD",
            StreamType::DtsHdCore => "dtsHD (core)",
            StreamType::DtsHdMa => "dtsHD MA",
        };

        f.write_str(name)
    }
}

/// Properties of the stream currently locked by the sync engine.
///
/// Equality compares only the fields that identify the stream format
/// (type, endianness, frame repetition), so a receiver can tell a format
/// switch apart from ordinary per-frame variation.
#[derive(Debug, Clone, Default)]
pub struct StreamInfo {
    pub stream_type: StreamType,
    pub sample_rate: u32,
    pub channels: u32,
    pub bit_depth: u32,
    /// Number of identical output bursts per frame (E-AC-3 with fewer
    /// than six blocks per frame repeats the burst).
    pub repeat: u32,
    pub ac3_frame_size: u32,
    pub data_is_le: bool,
    pub dts_period: u32,
    pub dts_samples_per_frame: u32,
}

impl PartialEq for StreamInfo {
    fn eq(&self, other: &Self) -> bool {
        self.stream_type == other.stream_type
            && self.data_is_le == other.data_is_le
            && self.repeat == other.repeat
    }
}

impl StreamInfo {
    /// Frame duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        let duration = match self.stream_type {
            StreamType::Ac3 => 0.032,
            StreamType::Eac3 => 6144.0 / self.sample_rate as f64 / 4.0,
            StreamType::TrueHd => {
                let rate = match self.sample_rate {
                    48000 | 96000 | 192000 => 192000.0,
                    _ => 176400.0,
                };
                3840.0 / rate
            }
            StreamType::DtsHdMa => {
                let samples = if self.dts_samples_per_frame != 0 {
                    self.dts_samples_per_frame as f64
                } else {
                    512.0
                };
                samples / self.sample_rate as f64
            }
            StreamType::Dts512 | StreamType::DtsHdCore | StreamType::DtsHd => {
                512.0 / self.sample_rate as f64
            }
            StreamType::Dts1024 => 1024.0 / self.sample_rate as f64,
            StreamType::Dts2048 => 2048.0 / self.sample_rate as f64,
            StreamType::Null => {
                error!("duration_ms: invalid stream type");
                0.0
            }
        };

        duration * 1000.0
    }
}

#[test]
fn equality_ignores_per_frame_fields() {
    let mut a = StreamInfo {
        stream_type: StreamType::Eac3,
        sample_rate: 48000,
        channels: 6,
        repeat: 2,
        ..Default::default()
    };
    let mut b = a.clone();

    b.sample_rate = 44100;
    b.channels = 8;
    assert_eq!(a, b);

    b.repeat = 1;
    assert_ne!(a, b);

    b.repeat = 2;
    a.data_is_le = true;
    assert_ne!(a, b);
}

#[test]
fn frame_durations() {
    let mut info = StreamInfo {
        stream_type: StreamType::Ac3,
        sample_rate: 48000,
        ..Default::default()
    };
    assert_eq!(info.duration_ms(), 32.0);

    info.stream_type = StreamType::Eac3;
    assert_eq!(info.duration_ms(), 32.0);

    info.stream_type = StreamType::TrueHd;
    assert_eq!(info.duration_ms(), 20.0);

    info.stream_type = StreamType::TrueHd;
    info.sample_rate = 44100;
    assert!((info.duration_ms() - 3840.0 / 176.4).abs() < 1e-9);

    info.stream_type = StreamType::Dts512;
    info.sample_rate = 48000;
    assert!((info.duration_ms() - 512.0 / 48.0).abs() < 1e-9);

    info.stream_type = StreamType::DtsHdMa;
    info.dts_samples_per_frame = 1024;
    assert!((info.duration_ms() - 1024.0 / 48.0).abs() < 1e-9);
}
