use anyhow::Result;
use serde::Serialize;

use super::command::InfoArgs;
use crate::input::InputReader;
use essync::process::sync::StreamParser;
use essync::structs::stream_info::StreamInfo;

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    log::info!("Analyzing stream: {}", args.input.display());

    let analysis = analyze_stream(args)?;

    match analysis {
        Some(analysis) => {
            if args.yaml {
                print!("{}", serde_yaml_ng::to_string(&Report::new(&analysis))?);
            } else {
                display_stream_info(&analysis.stream_info);
                display_summary(&analysis);
            }
        }
        None => {
            println!("No frame sync found in the file.");
            println!("This doesn't appear to be a supported elementary stream.");
        }
    }

    Ok(())
}

struct Analysis {
    stream_info: StreamInfo,
    frame_count: usize,
    frame_bytes: usize,
    total_bytes: usize,
    duration_secs: f64,
}

fn analyze_stream(args: &InfoArgs) -> Result<Option<Analysis>> {
    let mut input_reader = InputReader::new(&args.input)?;
    let mut parser = StreamParser::new(args.core_only);

    let mut analysis: Option<Analysis> = None;
    let mut total_bytes = 0usize;

    input_reader.process_chunks(64 * 1024, |chunk| {
        total_bytes += chunk.len();

        let mut offset = 0;
        while offset < chunk.len() {
            let (consumed, frame) = parser.add_data(&chunk[offset..]);
            offset += consumed;

            let Some(frame) = frame else {
                continue;
            };

            let info = parser.stream_info().clone();
            let analysis = analysis.get_or_insert_with(|| Analysis {
                stream_info: info.clone(),
                frame_count: 0,
                frame_bytes: 0,
                total_bytes: 0,
                duration_secs: 0.0,
            });

            if analysis.stream_info != info {
                log::info!("stream format changed to {}", info.stream_type);
                analysis.stream_info = info.clone();
            }

            analysis.frame_count += 1;
            analysis.frame_bytes += frame.as_ref().len();
            analysis.duration_secs += info.duration_ms() / 1000.0;
        }

        Ok(true)
    })?;

    if let Some(analysis) = &mut analysis {
        analysis.total_bytes = total_bytes;
    }

    Ok(analysis)
}

fn display_stream_info(info: &StreamInfo) {
    println!();
    println!("Stream Information");
    println!("  Stream type               {}", info.stream_type);
    println!("  Sampling rate             {} Hz", info.sample_rate);
    println!("  Channels                  {}", info.channels);
    println!("  Bit depth                 {}", info.bit_depth);
    println!("  Frame duration            {:.3} ms", info.duration_ms());
    println!("  Repeat                    {}", info.repeat);
    println!(
        "  Byte order                {}",
        if info.data_is_le { "LE" } else { "BE" }
    );
    println!();
}

fn display_summary(analysis: &Analysis) {
    println!("Analysis Summary");
    println!("  Frames emitted            {}", analysis.frame_count);

    let size_mb = analysis.total_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        analysis.total_bytes
    );
    println!("  Frame bytes               {}", analysis.frame_bytes);

    println!("  Duration                  {:.3} s", analysis.duration_secs);
    if analysis.duration_secs > 0.0 {
        let avg_data_rate_kbps =
            (analysis.frame_bytes as f64 * 8.0) / (analysis.duration_secs * 1000.0);
        println!("  Average data rate         {avg_data_rate_kbps:.1} kbps");
    }

    println!();
}

#[derive(Serialize)]
struct Report {
    stream_type: String,
    sample_rate: u32,
    channels: u32,
    bit_depth: u32,
    repeat: u32,
    little_endian: bool,
    frame_duration_ms: f64,
    frames: usize,
    frame_bytes: usize,
    total_bytes: usize,
    duration_secs: f64,
}

impl Report {
    fn new(analysis: &Analysis) -> Self {
        let info = &analysis.stream_info;

        Self {
            stream_type: info.stream_type.to_string(),
            sample_rate: info.sample_rate,
            channels: info.channels,
            bit_depth: info.bit_depth,
            repeat: info.repeat,
            little_endian: info.data_is_le,
            frame_duration_ms: info.duration_ms(),
            frames: analysis.frame_count,
            frame_bytes: analysis.frame_bytes,
            total_bytes: analysis.total_bytes,
            duration_secs: analysis.duration_secs,
        }
    }
}
