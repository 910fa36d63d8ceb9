use anyhow::{Context, Result, bail};

use super::command::RpuArgs;
use crate::input::InputReader;
use essync::process::convert::RpuConverter;
use essync::process::sei::{
    extract_content_light_level, extract_hdr10plus, extract_mastering_display,
    mastering_display_text, parse_sei_rbsp_uncleared_emulation,
};

pub fn cmd_rpu(args: &RpuArgs) -> Result<()> {
    log::info!("Reading SEI NAL unit: {}", args.input.display());

    let nalu = InputReader::new(&args.input)?.read_all()?;
    let (buf, messages) = parse_sei_rbsp_uncleared_emulation(&nalu);

    if messages.is_empty() {
        bail!("no SEI messages found in {}", args.input.display());
    }
    log::debug!("parsed {} SEI messages", messages.len());

    let Some(meta) = extract_hdr10plus(&messages, &buf) else {
        bail!("no HDR10+ metadata found in {}", args.input.display());
    };

    // static metadata from the stream wins over the command line defaults
    let (max_dml, min_dml) = match extract_mastering_display(&messages, &buf) {
        Some(mdcv) => {
            log::info!("mastering display primaries: {}", mastering_display_text(&mdcv));
            (
                mdcv.max_luminance.round() as u16,
                (mdcv.min_luminance * 10000.0).round() as u16,
            )
        }
        None => (
            args.max_display_mastering_luminance,
            args.min_display_mastering_luminance,
        ),
    };

    let (max_cll, max_fall) = match extract_content_light_level(&messages, &buf) {
        Some(cll) => (
            cll.max_content_light_level,
            cll.max_frame_average_light_level,
        ),
        None => (args.max_content_light_level, args.max_frame_average_light_level),
    };

    let mut converter = RpuConverter::new();
    let rpu = converter.convert(
        &meta,
        args.peak_source.to_source(),
        max_dml,
        min_dml,
        max_cll,
        max_fall,
    )?;

    std::fs::write(&args.output, &rpu)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Wrote {} byte RPU NAL unit to {}", rpu.len(), args.output.display());

    Ok(())
}
