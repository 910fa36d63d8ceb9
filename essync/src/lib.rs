#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Compressed audio passthrough pipelines receive elementary stream bytes in
//! arbitrary chunks and must locate frame boundaries before anything can be
//! packetized. [`process::sync::StreamParser`] performs that job: it buffers
//! incoming bytes, scans for the sync patterns of every supported codec in
//! parallel, validates candidate headers (CRC where the format carries one)
//! and emits whole frames together with a [`structs::stream_info::StreamInfo`]
//! describing the stream.
//!
//! The HEVC side covers the metadata NAL units that accompany HDR video:
//! SEI RBSP parsing, HDR10+ (ST 2094-40) extraction and removal, and
//! generation of Dolby Vision profile 8.1 RPU NAL units from HDR10+ frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use essync::process::sync::StreamParser;
//!
//! let mut parser = StreamParser::default();
//! let chunk: &[u8] = &[];
//!
//! let mut pending = chunk;
//! while !pending.is_empty() {
//!     let (consumed, frame) = parser.add_data(pending);
//!     pending = &pending[consumed..];
//!
//!     if let Some(frame) = frame {
//!         println!("{}: {} bytes", parser.stream_info().stream_type, frame.data.len());
//!     }
//! }
//! ```

/// Processing functionality for bitstreams.
///
/// 1. **Stream Sync** ([`process::sync`]): Locates and emits audio frames
///    from chunked elementary stream data.
///
/// 2. **SEI Parsing** ([`process::sei`]): Splits HEVC SEI RBSPs into
///    messages and locates HDR metadata payloads.
///
/// 3. **Conversion** ([`process::convert`]): Derives Dolby Vision RPUs from
///    HDR10+ dynamic metadata.
pub mod process;

/// Data structures representing stream and metadata components.
///
/// - **Stream Info** ([`structs::stream_info`]): Detected stream properties
/// - **SEI Messages** ([`structs::sei`]): Message framing within an RBSP
/// - **HDR10+** ([`structs::hdr10plus`]): ST 2094-40 payload model
/// - **RPU** ([`structs::rpu`]): Dolby Vision RPU record writer
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading/writing
/// - **CRC Validation** ([`utils::crc`]): Error detection
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **NAL Escaping** ([`utils::nal`]): Annex B emulation prevention
pub mod utils;
