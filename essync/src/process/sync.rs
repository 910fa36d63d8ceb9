//! Frame synchronization for compressed audio elementary streams.
//!
//! [`StreamParser`] accepts elementary stream bytes in arbitrary chunks,
//! locates frame boundaries for AC-3, E-AC-3, DTS (including DTS-HD and
//! DTS-HD Master Audio) and Dolby TrueHD, and emits whole frames. Candidate
//! sync words are verified against the full header and, where the format
//! carries one, a CRC before sync is declared, so random byte patterns do
//! not produce spurious frames.
//!
//! Once locked, the parser stays on the matched codec and only falls back
//! to full detection when sync is lost, which lets it follow stream type
//! switches the way a hardware receiver does.

use log::{debug, info};

use crate::structs::stream_info::{StreamInfo, StreamType};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::{CRC_AC3_FRAME_ALG, CRC_TRUEHD_MAJOR_SYNC_ALG, Crc16};

const DTS_SYNC_CORE_14BE: u32 = 0x1FFFE800;
const DTS_SYNC_CORE_14LE: u32 = 0xFF1F00E8;
const DTS_SYNC_CORE_16BE: u32 = 0x7FFE8001;
const DTS_SYNC_CORE_16LE: u32 = 0xFE7F0180;

const DTS_SYNC_EXTENSION: u32 = 0x64582025;

const DTS_SYNC_EXT_XCH: u32 = 0x5a5a5a5a;
const DTS_SYNC_EXT_XXCH: u32 = 0x47004a03;
const DTS_SYNC_EXT_X96K: u32 = 0x1d95f262;
const DTS_SYNC_EXT_XBR: u32 = 0x655e315e;
const DTS_SYNC_EXT_LBR: u32 = 0x0a801921;
const DTS_SYNC_EXT_XLL: u32 = 0x41a29547;

const TRUEHD_SYNC_MAJOR: u32 = 0xf8726fba;

const MAX_EAC3_BLOCKS: u32 = 6;

/// Largest IEC 61937 burst payload; no valid frame is bigger.
const BUFFER_SIZE: usize = 61440;

const AC3_BITRATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];
const AC3_FSCOD: [u32; 4] = [48000, 44100, 32000, 0];
const AC3_BLK_COD: [u32; 4] = [1, 2, 3, 6];
const AC3_CHANNELS: [u32; 8] = [2, 1, 2, 3, 3, 4, 4, 5];
const DTS_CHANNELS: [u32; 16] = [1, 2, 2, 2, 2, 3, 3, 4, 4, 5, 6, 6, 6, 7, 8, 8];
const THD_CHAN_MAP: [u32; 13] = [2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 1, 1];
const DTS_SAMPLE_RATES: [u32; 16] = [
    0, 8000, 16000, 32000, 64000, 128000, 11025, 22050, 44100, 88200, 176400, 12000, 24000, 48000,
    96000, 192000,
];

/// A whole elementary stream frame emitted by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Which codec the parser is currently locked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SyncState {
    #[default]
    Detect,
    Ac3,
    Dts,
    TrueHd,
}

pub struct StreamParser {
    buffer: Box<[u8]>,
    buffer_size: usize,
    need_bytes: usize,
    skip_bytes: usize,
    has_sync: bool,
    core_only: bool,
    fsize: usize,
    core_size: usize,
    dts_blocks: u32,
    substreams: usize,
    state: SyncState,
    info: StreamInfo,
    crc_ac3: Crc16,
    crc_truehd: Crc16,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(false)
    }
}

impl StreamParser {
    /// Creates a parser. With `core_only` set, DTS-HD frames are emitted
    /// as their core substream only.
    pub fn new(core_only: bool) -> Self {
        Self {
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            buffer_size: 0,
            need_bytes: 0,
            skip_bytes: 0,
            has_sync: false,
            core_only,
            fsize: 0,
            core_size: 0,
            dts_blocks: 0,
            substreams: 0,
            state: SyncState::Detect,
            info: StreamInfo::default(),
            crc_ac3: Crc16::new(&CRC_AC3_FRAME_ALG),
            crc_truehd: Crc16::new(&CRC_TRUEHD_MAJOR_SYNC_ALG),
        }
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn has_sync(&self) -> bool {
        self.has_sync
    }

    /// Discards buffered data and forgets the current lock. The detected
    /// stream info is kept so a resync to the same format is cheap.
    pub fn reset(&mut self) {
        self.skip_bytes = 0;
        self.buffer_size = 0;
        self.need_bytes = 0;
        self.has_sync = false;
    }

    /// Feeds `data` to the parser.
    ///
    /// Returns the number of bytes consumed and, when a whole frame has
    /// been assembled, the frame. At most one frame is emitted per call;
    /// input past an emitted frame is left unconsumed, so callers must
    /// re-offer unconsumed bytes on the next call.
    pub fn add_data(&mut self, mut data: &[u8]) -> (usize, Option<Frame>) {
        if data.is_empty() {
            return (0, None);
        }

        if self.skip_bytes > 0 {
            let can_skip = data.len().min(self.skip_bytes);
            let room = BUFFER_SIZE - self.buffer_size;
            let copy = room.min(can_skip);

            self.buffer[self.buffer_size..self.buffer_size + copy].copy_from_slice(&data[..copy]);
            self.buffer_size += copy;
            self.skip_bytes -= copy;

            if self.skip_bytes > 0 {
                return (copy, None);
            }

            return (copy, self.take_frame());
        }

        let mut consumed = 0;
        let mut offset;

        loop {
            if data.is_empty() {
                return (consumed, None);
            }

            let room = BUFFER_SIZE - self.buffer_size;
            let copy = room.min(data.len());
            self.buffer[self.buffer_size..self.buffer_size + copy].copy_from_slice(&data[..copy]);
            self.buffer_size += copy;
            consumed += copy;
            data = &data[copy..];

            if self.need_bytes > self.buffer_size {
                continue;
            }

            self.need_bytes = 0;
            offset = self.run_sync();

            if self.has_sync || self.need_bytes > 0 {
                break;
            }

            // lost sync
            self.state = SyncState::Detect;
            self.info.stream_type = StreamType::Null;
            self.info.repeat = 1;

            if self.buffer_size == BUFFER_SIZE || offset < self.buffer_size {
                self.buffer.copy_within(offset..self.buffer_size, 0);
                self.buffer_size -= offset;
            }
        }

        // sync was acquired, align the buffer on the frame start
        if offset > 0 {
            self.buffer.copy_within(offset..self.buffer_size, 0);
            self.buffer_size -= offset;
        }

        // bytes to collect until the frame is complete
        self.skip_bytes = self.fsize.saturating_sub(self.buffer_size);
        if self.skip_bytes > 0 {
            return (consumed, None);
        }

        if self.need_bytes == 0 && self.fsize > 0 {
            let frame = self.take_frame();

            // hand surplus buffered bytes back to the caller, so a call
            // emits at most one frame and retains no unscanned input
            let give_back = self.buffer_size.min(consumed);
            self.buffer_size -= give_back;
            consumed -= give_back;

            (consumed, frame)
        } else {
            (consumed, None)
        }
    }

    /// Pulls the assembled frame out of the buffer and compacts it.
    fn take_frame(&mut self) -> Option<Frame> {
        let size = if self.info.stream_type == StreamType::DtsHdCore {
            self.core_size
        } else {
            self.fsize
        };

        let frame = Frame {
            data: self.buffer[..size].to_vec(),
        };

        self.buffer.copy_within(self.fsize..self.buffer_size, 0);
        self.buffer_size -= self.fsize;
        self.fsize = 0;
        self.core_size = 0;

        Some(frame)
    }

    fn run_sync(&mut self) -> usize {
        let size = self.buffer_size;
        match self.state {
            SyncState::Detect => self.detect_type(),
            SyncState::Ac3 => self.sync_ac3(0, size),
            SyncState::Dts => self.sync_dts(0, size),
            SyncState::TrueHd => self.sync_truehd(0, size),
        }
    }

    fn header32(&self, at: usize) -> u32 {
        u32::from_be_bytes([
            self.buffer[at],
            self.buffer[at + 1],
            self.buffer[at + 2],
            self.buffer[at + 3],
        ])
    }

    /// Probes every codec in parallel and runs the exhaustive check only
    /// where a sync word shows up. The matching codec pins itself as the
    /// active state, and this scan runs again only after total sync loss.
    fn detect_type(&mut self) -> usize {
        let mut skipped = 0;
        let mut possible = 0;
        let mut size = self.buffer_size;
        let mut pos = 0;

        while size > 8 {
            let header = self.header32(pos);

            if header == DTS_SYNC_CORE_14BE
                || header == DTS_SYNC_CORE_14LE
                || header == DTS_SYNC_CORE_16BE
                || header == DTS_SYNC_CORE_16LE
            {
                let skip = self.sync_dts(pos, size);
                if self.has_sync || self.need_bytes > 0 {
                    return skipped + skip;
                }
                possible = skipped;
            }

            if self.buffer[pos] == 0x0b && self.buffer[pos + 1] == 0x77 {
                let skip = self.sync_ac3(pos, size);
                if self.has_sync || self.need_bytes > 0 {
                    return skipped + skip;
                }
                possible = skipped;
            }

            if self.header32(pos + 4) == TRUEHD_SYNC_MAJOR {
                let skip = self.sync_truehd(pos, size);
                if self.has_sync || self.need_bytes > 0 {
                    return skipped + skip;
                }
                possible = skipped;
            }

            size -= 1;
            skipped += 1;
            pos += 1;
        }

        if possible > 0 { possible } else { skipped }
    }

    fn sync_ac3(&mut self, base: usize, size: usize) -> usize {
        let mut skip = 0;

        while size - skip > 7 {
            let resyncing = skip != 0;
            if self.try_sync_ac3(base + skip, size - skip, resyncing, false) {
                return skip;
            }
            skip += 1;
        }

        info!("AC3 sync lost");
        self.has_sync = false;
        skip
    }

    fn try_sync_ac3(
        &mut self,
        base: usize,
        size: usize,
        resyncing: bool,
        want_eac3_dependent: bool,
    ) -> bool {
        if size < 8 {
            return false;
        }

        let h: [u8; 8] = self.buffer[base..base + 8].try_into().unwrap();

        if h[0] != 0x0b || h[1] != 0x77 {
            return false;
        }

        let bsid = h[5] >> 3;
        let acmod = h[6] >> 5;

        let mut pos: i8 = 4;
        if (acmod & 0x1) != 0 && acmod != 0x1 {
            pos -= 2;
        }
        if acmod & 0x4 != 0 {
            pos -= 2;
        }
        if acmod == 0x2 {
            pos -= 2;
        }
        let lfeon: u32 = if pos < 0 {
            u32::from(h[7] & 0x64 != 0)
        } else {
            u32::from((h[6] >> pos) & 0x1 != 0)
        };

        if bsid > 0x11 || acmod > 7 {
            return false;
        }

        if bsid <= 10 {
            // plain AC-3
            if want_eac3_dependent {
                return false;
            }

            let fscod = h[4] >> 6;
            let frmsizecod = h[4] & 0x3F;
            if fscod == 3 || frmsizecod > 37 {
                return false;
            }

            // frame size in 16-bit words, needed for crc1 validation
            let bit_rate = AC3_BITRATES[(frmsizecod >> 1) as usize];
            let framesize = match fscod {
                0 => bit_rate * 2,
                1 => 320 * bit_rate / 147 + u32::from(frmsizecod & 1),
                2 => bit_rate * 4,
                _ => 0,
            } as usize;

            self.fsize = framesize << 1;
            self.info.sample_rate = AC3_FSCOD[fscod as usize];

            // no extensive testing while the lock holds
            if self.info.stream_type == StreamType::Ac3 && !resyncing {
                return true;
            }

            // this may be the main stream of E-AC-3
            let fsize_main = self.fsize;
            let req_bytes = fsize_main + 8;
            if size < req_bytes {
                info!("AC3: not enough data to validate the frame");
                self.need_bytes = req_bytes;
                self.fsize = 0;
                // no need to resync
                return true;
            }

            self.info.ac3_frame_size = fsize_main as u32;
            if self.try_sync_ac3(base + fsize_main, size - fsize_main, resyncing, true) {
                // concatenate the main and dependent frames
                self.fsize += fsize_main;
                return true;
            }

            // validate the whole frame if buffered, else crc2 over 5/8 of it
            let crc_size = if framesize <= size {
                framesize - 1
            } else {
                (framesize >> 1) + (framesize >> 3) - 1
            };

            if crc_size * 2 + 2 <= size {
                let region = &self.buffer[base + 2..base + 2 + crc_size * 2];
                if self.crc_ac3.update(self.crc_ac3.init, region) != 0 {
                    return false;
                }
            }

            self.has_sync = true;
            self.info.channels = AC3_CHANNELS[acmod as usize] + lfeon;
            self.state = SyncState::Ac3;
            self.info.stream_type = StreamType::Ac3;
            self.info.ac3_frame_size += self.fsize as u32;
            self.info.repeat = 1;

            info!(
                "AC3 stream detected ({} channels, {} Hz)",
                self.info.channels, self.info.sample_rate
            );
            true
        } else {
            // Enhanced AC-3
            let strmtyp = h[2] >> 6;
            if strmtyp == 3 {
                return false;
            }

            if strmtyp != 1 && want_eac3_dependent {
                return false;
            }

            let framesize = ((((h[2] & 0x7) as usize) << 8) | h[3] as usize) + 1;

            let fscod = (h[4] >> 6) & 0x3;
            let numblkscod = (h[4] >> 4) & 0x3;
            let acmod = (h[4] >> 1) & 0x7;
            let lfeon = (h[4] & 0x1) as u32;

            let blocks = if fscod == 0x3 {
                if numblkscod == 0x3 {
                    return false;
                }

                self.info.sample_rate = AC3_FSCOD[numblkscod as usize] >> 1;
                6
            } else {
                self.info.sample_rate = AC3_FSCOD[fscod as usize];
                AC3_BLK_COD[numblkscod as usize]
            };

            self.fsize = framesize << 1;
            self.info.repeat = MAX_EAC3_BLOCKS / blocks;

            // an independent E-AC-3 frame can carry a dependent one
            if !want_eac3_dependent {
                let fsize_main = self.fsize;
                let req_bytes = fsize_main + 8;

                if size < req_bytes {
                    info!("E-AC3: not enough data to validate the frame");
                    self.need_bytes = req_bytes;
                    self.fsize = 0;
                    // no need to resync
                    return true;
                }

                self.info.ac3_frame_size = fsize_main as u32;
                if self.try_sync_ac3(base + fsize_main, size - fsize_main, resyncing, true) {
                    // concatenate the main and dependent frames
                    self.fsize += fsize_main;
                    return true;
                }
            }

            if self.info.stream_type == StreamType::Eac3 && self.has_sync && !resyncing {
                return true;
            }

            self.has_sync = true;
            self.info.channels = AC3_CHANNELS[acmod as usize] + lfeon;
            self.state = SyncState::Ac3;
            self.info.stream_type = StreamType::Eac3;
            self.info.ac3_frame_size += self.fsize as u32;
            self.info.bit_depth = 16;

            info!(
                "E-AC3 stream detected ({} channels, {} Hz, {}-bit)",
                self.info.channels, self.info.sample_rate, self.info.bit_depth
            );
            true
        }
    }

    fn sync_dts(&mut self, base: usize, size: usize) -> usize {
        if size < 13 {
            if self.need_bytes < 13 {
                self.need_bytes = 14;
            }
            return 0;
        }

        let mut skip = 0;

        while size - skip > 13 {
            let pos = base + skip;
            let header = self.header32(pos);
            let h: [u8; 14] = self.buffer[pos..pos + 14].try_into().unwrap();

            let dts_blocks: u32;
            let amode: usize;
            let sfreq: usize;
            let target_rate: u32;
            let extension: u8;
            let ext_type: u8;
            let lfe: u8;
            let bits: u32;

            match header {
                DTS_SYNC_CORE_14BE => {
                    if h[4] != 0x07 || (h[5] & 0xf0) != 0xf0 {
                        skip += 1;
                        continue;
                    }
                    dts_blocks = ((((h[5] & 0x7) as u32) << 4) | ((h[6] & 0x3C) as u32 >> 2)) + 1;
                    self.fsize = ((((((h[6] & 0x3) as usize) << 8) | h[7] as usize) << 4)
                        | ((h[8] & 0x3C) as usize >> 2))
                        + 1;
                    amode = (((h[8] & 0x3) as usize) << 4) | ((h[9] & 0xF0) as usize >> 4);
                    target_rate = (h[10] & 0x3e) as u32 >> 1;
                    extension = h[11] & 0x1;
                    ext_type = (h[11] & 0xe) >> 1;
                    sfreq = (h[9] & 0xF) as usize;
                    lfe = (h[12] & 0x18) >> 3;
                    self.info.data_is_le = false;
                    bits = 14;
                }
                DTS_SYNC_CORE_14LE => {
                    if h[5] != 0x07 || (h[4] & 0xf0) != 0xf0 {
                        skip += 1;
                        continue;
                    }
                    dts_blocks = ((((h[4] & 0x7) as u32) << 4) | ((h[7] & 0x3C) as u32 >> 2)) + 1;
                    self.fsize = ((((((h[7] & 0x3) as usize) << 8) | h[6] as usize) << 4)
                        | ((h[9] & 0x3C) as usize >> 2))
                        + 1;
                    amode = (((h[9] & 0x3) as usize) << 4) | ((h[8] & 0xF0) as usize >> 4);
                    target_rate = (h[11] & 0x3e) as u32 >> 1;
                    extension = h[10] & 0x1;
                    ext_type = (h[10] & 0xe) >> 1;
                    sfreq = (h[8] & 0xF) as usize;
                    lfe = (h[13] & 0x18) >> 3;
                    self.info.data_is_le = true;
                    bits = 14;
                }
                DTS_SYNC_CORE_16BE => {
                    dts_blocks = ((((h[4] & 0x1) as u32) << 7) | ((h[5] & 0xFC) as u32 >> 2)) + 1;
                    self.fsize = ((((((h[5] & 0x3) as usize) << 8) | h[6] as usize) << 4)
                        | ((h[7] & 0xF0) as usize >> 4))
                        + 1;
                    amode = (((h[7] & 0x0F) as usize) << 2) | ((h[8] & 0xC0) as usize >> 6);
                    sfreq = ((h[8] & 0x3C) >> 2) as usize;
                    target_rate = (((h[8] & 0x03) as u32) << 3) | ((h[9] & 0xe0) as u32 >> 5);
                    extension = (h[10] & 0x10) >> 4;
                    ext_type = (h[10] & 0xe0) >> 5;
                    lfe = (h[10] >> 1) & 0x3;
                    self.info.data_is_le = false;
                    bits = 16;
                }
                DTS_SYNC_CORE_16LE => {
                    dts_blocks = ((((h[5] & 0x1) as u32) << 7) | ((h[4] & 0xFC) as u32 >> 2)) + 1;
                    self.fsize = ((((((h[4] & 0x3) as usize) << 8) | h[7] as usize) << 4)
                        | ((h[6] & 0xF0) as usize >> 4))
                        + 1;
                    amode = (((h[6] & 0x0F) as usize) << 2) | ((h[9] & 0xC0) as usize >> 6);
                    sfreq = ((h[9] & 0x3C) >> 2) as usize;
                    target_rate = (((h[9] & 0x03) as u32) << 3) | ((h[8] & 0xe0) as u32 >> 5);
                    extension = (h[11] & 0x10) >> 4;
                    ext_type = (h[11] & 0xe0) >> 5;
                    lfe = (h[11] >> 1) & 0x3;
                    self.info.data_is_le = true;
                    bits = 16;
                }
                _ => {
                    skip += 1;
                    continue;
                }
            }

            if sfreq == 0 || sfreq >= DTS_SAMPLE_RATES.len() {
                skip += 1;
                continue;
            }

            // make sure the framesize is sane
            if self.fsize < 96 || self.fsize > 16384 {
                skip += 1;
                continue;
            }

            let mut data_type = match dts_blocks << 5 {
                512 => StreamType::Dts512,
                1024 => StreamType::Dts1024,
                2048 => StreamType::Dts2048,
                _ => StreamType::Null,
            };

            if data_type == StreamType::Null {
                skip += 1;
                continue;
            }

            // 14-bit streams pack 14 payload bits into each 16-bit word
            if bits == 14 {
                self.fsize = self.fsize / 14 * 16;
            }

            // we need enough data past the core to check for DTS-HD
            if size - skip < self.fsize + 10 {
                // core sync is good enough to commit to DTS at this point
                self.state = SyncState::Dts;
                self.need_bytes = self.fsize + 10;
                self.fsize = 0;

                return skip;
            }

            // check for a stream extension after the core frame
            let ext_sync = self.header32(pos + self.fsize);
            let mut ext_sub_sync = 0u32;
            let mut ext_header_size = 0usize;

            if ext_sync == DTS_SYNC_EXTENSION {
                let e: [u8; 10] = self.buffer[pos + self.fsize..pos + self.fsize + 10]
                    .try_into()
                    .unwrap();

                let blownup = (e[5] & 0x20) != 0;
                let ext_size = if blownup {
                    ((((e[6] & 0x01) as usize) << 19)
                        | ((e[7] as usize) << 11)
                        | ((e[8] as usize) << 3)
                        | ((e[9] & 0xe0) as usize >> 5))
                        + 1
                } else {
                    ((((e[6] & 0x1f) as usize) << 11)
                        | ((e[7] as usize) << 3)
                        | ((e[8] & 0xe0) as usize >> 5))
                        + 1
                };

                ext_header_size = if blownup {
                    ((((e[5] & 0x1f) as usize) << 7) | ((e[6] & 0xfe) as usize >> 1)) + 1
                } else {
                    ((((e[5] & 0x1f) as usize) << 3) | ((e[6] & 0xe0) as usize >> 5)) + 1
                };

                if skip + self.fsize + ext_header_size + 4 <= size {
                    ext_sub_sync = self.header32(pos + self.fsize + ext_header_size);
                }

                data_type = if self.core_only {
                    StreamType::DtsHdCore
                } else if ext_sub_sync == DTS_SYNC_EXT_XLL {
                    StreamType::DtsHdMa
                } else if ext_sub_sync == DTS_SYNC_EXT_XCH
                    || ext_sub_sync == DTS_SYNC_EXT_XXCH
                    || ext_sub_sync == DTS_SYNC_EXT_X96K
                    || ext_sub_sync == DTS_SYNC_EXT_XBR
                    || ext_sub_sync == DTS_SYNC_EXT_LBR
                {
                    StreamType::DtsHd
                } else {
                    self.info.stream_type
                };

                self.core_size = self.fsize;
                self.fsize += ext_size;

                // an extension claiming more than the buffer can ever hold
                // is a bad sync, keep scanning instead of stalling on it
                if self.fsize > BUFFER_SIZE {
                    self.fsize = 0;
                    self.core_size = 0;
                    skip += 1;
                    continue;
                }
            }

            let sample_rate = DTS_SAMPLE_RATES[sfreq];

            if !self.has_sync
                || skip > 0
                || data_type != self.info.stream_type
                || sample_rate != self.info.sample_rate
                || dts_blocks != self.dts_blocks
            {
                self.has_sync = true;
                self.info.stream_type = data_type;
                self.info.sample_rate = sample_rate;
                self.dts_blocks = dts_blocks;
                self.info.channels = DTS_CHANNELS[amode] + u32::from(lfe != 0);
                self.state = SyncState::Dts;
                self.info.repeat = 1;

                let mut hd_bits = 0;
                self.info.dts_samples_per_frame = 0;

                // XLL carries the source bit depth in its channel set header
                if ext_sub_sync == DTS_SYNC_EXT_XLL {
                    let hd_start = pos + self.core_size + ext_header_size;
                    match parse_xll_header(&self.buffer[hd_start..base + size]) {
                        Ok((samples_per_frame, bit_depth)) => {
                            self.info.dts_samples_per_frame = samples_per_frame;
                            hd_bits = bit_depth;
                        }
                        Err(e) => debug!("XLL header parse failed: {e}"),
                    }
                }

                self.info.bit_depth = if hd_bits > 0 { hd_bits } else { bits };

                if data_type == StreamType::DtsHdMa {
                    // TODO: derive the channel count from the XLL channel
                    // set headers instead of assuming two extension channels
                    self.info.channels += 2;
                    self.info.dts_period =
                        (192000 * 4) * (self.dts_blocks << 5) / self.info.sample_rate;
                } else if data_type == StreamType::DtsHd {
                    self.info.dts_period = 192000 * (self.dts_blocks << 5) / self.info.sample_rate;
                } else {
                    self.info.dts_period = self.dts_blocks << 5;
                }

                let mut desc = self.info.stream_type.to_string();
                if extension != 0 {
                    desc += match ext_type {
                        0 => " XCH",
                        2 => " X96",
                        6 => " XXCH",
                        _ => " ext unknown",
                    };
                }

                info!(
                    "{} stream detected ({} channels, {} Hz, {}-bit {}, period {}, \
                     target rate {:#x}, framesize {})",
                    desc,
                    self.info.channels,
                    self.info.sample_rate,
                    self.info.bit_depth,
                    if self.info.data_is_le { "LE" } else { "BE" },
                    self.info.dts_period,
                    target_rate,
                    self.fsize,
                );
            }

            return skip;
        }

        info!("DTS sync lost");
        self.has_sync = false;
        skip
    }

    fn sync_truehd(&mut self, base: usize, size: usize) -> usize {
        let mut skip = 0;

        while skip < size {
            let left = size - skip;
            let pos = base + skip;

            if left < 8 {
                // a header does not fit; without a lock give up on the
                // whole window, otherwise wait for more data
                if self.has_sync {
                    self.need_bytes = 8;
                    return skip;
                }
                return size;
            }

            let h: [u8; 8] = self.buffer[pos..pos + 8].try_into().unwrap();
            let length = ((((h[0] & 0x0F) as usize) << 8) | h[1] as usize) << 1;
            let syncword = self.header32(pos + 4);

            if syncword == TRUEHD_SYNC_MAJOR {
                // a major sync unit is at least 32 bytes
                if left < 32 {
                    self.need_bytes = 32;
                    return skip;
                }

                let m: [u8; 32] = self.buffer[pos..pos + 32].try_into().unwrap();

                let rate = (m[8] & 0xf0) >> 4;
                if rate == 0xF {
                    skip += 1;
                    continue;
                }

                // major_sync_info length, without the trailing crc field
                let mut info_len = 26;
                if m[29] & 1 != 0 {
                    // extension block(s) present, look up the count
                    let extension_count = (m[30] >> 4) as usize;
                    info_len += 2 + extension_count * 2;
                }

                if left < 4 + info_len + 2 {
                    self.need_bytes = 4 + info_len + 2;
                    return skip;
                }

                let crc = self.crc_truehd.update_major_sync(
                    self.crc_truehd.init,
                    &self.buffer[pos + 4..pos + 4 + info_len],
                );
                let stored = u16::from_be_bytes([
                    self.buffer[pos + 4 + info_len],
                    self.buffer[pos + 4 + info_len + 1],
                ]);
                if crc != stored {
                    skip += 1;
                    continue;
                }

                self.substreams = ((m[20] & 0xF0) >> 4) as usize;
                self.fsize = length;

                if !self.has_sync {
                    // the original bit depth is not recoverable from the
                    // stream, 24-bit is the safe assumption for TrueHD
                    self.info.bit_depth = 24;

                    self.info.sample_rate =
                        (if rate & 0x8 != 0 { 44100 } else { 48000 }) << (rate & 0x7);

                    let mut channel_map = (((m[10] & 0x1F) as u16) << 8) | m[11] as u16;
                    if channel_map == 0 {
                        channel_map = ((m[9] as u16) << 1) | ((m[10] >> 7) as u16);
                    }
                    self.info.channels = truehd_channels(channel_map);

                    info!(
                        "TrueHD stream detected ({} channels, {} Hz, {}-bit)",
                        self.info.channels, self.info.sample_rate, self.info.bit_depth
                    );

                    self.has_sync = true;
                    self.info.stream_type = StreamType::TrueHd;
                    self.state = SyncState::TrueHd;
                    self.info.repeat = 1;
                }

                return skip;
            }

            // minor access units can only follow an established lock
            if !self.has_sync {
                skip += 1;
                continue;
            }

            if left < self.substreams * 4 {
                self.need_bytes = (self.substreams + 1) * 4;
                return skip;
            }

            // verify the substream directory parity
            let mut p = 0;
            let mut check = 0u8;
            let mut i: isize = -1;
            while i < self.substreams as isize {
                if p + 2 > left {
                    self.need_bytes = (self.substreams + 1) * 4;
                    return skip;
                }
                check ^= self.buffer[pos + p];
                check ^= self.buffer[pos + p + 1];
                let extra = i == -1 || self.buffer[pos + p] & 0x80 != 0;
                p += 2;

                if extra {
                    if p + 2 > left {
                        self.need_bytes = (self.substreams + 1) * 4;
                        return skip;
                    }
                    check ^= self.buffer[pos + p];
                    check ^= self.buffer[pos + p + 1];
                    p += 2;
                }
                i += 1;
            }

            if ((check >> 4) ^ check) & 0xF != 0xF {
                self.has_sync = false;
                info!("TrueHD sync lost");
                skip += 1;
                continue;
            }

            self.fsize = length;
            return skip;
        }

        self.has_sync = false;
        skip
    }
}

/// Reads the XLL common header and the first channel set sub-header,
/// returning the samples per frame and the source bit depth.
fn parse_xll_header(hd: &[u8]) -> std::io::Result<(u32, u32)> {
    let mut br = BsIoSliceReader::from_slice(hd);

    // past the sub-sync word
    br.skip_n(32)?;

    let _version = br.get_n::<u32>(4)? + 1;
    let header_size = br.get_n::<u32>(8)? + 1;
    let bits_for_frame_size = br.get_n::<u32>(5)? + 1;
    br.skip_n(bits_for_frame_size)?;
    // channel set count
    br.skip_n(4)?;

    let segments_in_frame = 1u32 << br.get_n::<u32>(4)?;
    let samples_in_segment = 1u32 << br.get_n::<u32>(4)?;
    let samples_per_frame = segments_in_frame * samples_in_segment;

    // the first channel set sub-header starts right after the common header
    let target = u64::from(header_size) * 8;
    let position = br.position()?;
    if target < position {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "XLL header size points into the common header",
        ));
    }
    br.skip_n((target - position) as u32)?;

    // sub-header size
    br.skip_n(10)?;
    let channels = br.get_n::<u32>(4)? + 1;
    br.skip_n(channels)?;
    let bit_depth = br.get_n::<u32>(5)? + 1;

    Ok((samples_per_frame, bit_depth))
}

fn truehd_channels(chanmap: u16) -> u32 {
    let mut channels = 0;
    for (i, weight) in THD_CHAN_MAP.iter().enumerate() {
        channels += weight * u32::from((chanmap >> i) & 1);
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoWriter;
    use crate::utils::crc::{CRC_AC3_FRAME_ALG, CRC_TRUEHD_MAJOR_SYNC_ALG, Crc16};

    /// Builds a valid 448-byte AC-3 frame (48 kHz, 2.0, 112 kbps) whose
    /// crc1 covers the whole frame.
    fn build_ac3_frame(fill: u8) -> Vec<u8> {
        let mut frame = vec![fill; 448];
        frame[0] = 0x0b;
        frame[1] = 0x77;
        // crc1 placeholder at [2..4], patched below
        frame[4] = 0x0e; // fscod 0 (48 kHz), frmsizecod 14 (112 kbps)
        frame[5] = 0x08 << 3; // bsid 8
        frame[6] = 0x02 << 5; // acmod 2 (2/0), lfeon bit clear

        let crc = Crc16::new(&CRC_AC3_FRAME_ALG);
        let checksum = crc.update(crc.init, &frame[2..446]);
        frame[446..448].copy_from_slice(&checksum.to_be_bytes());

        frame
    }

    /// Builds a valid 512-byte 16-bit BE DTS core frame with 16 blocks
    /// (512 samples), 48 kHz, amode 9.
    fn build_dts_frame(fill: u8) -> Vec<u8> {
        let mut frame = vec![fill; 512];
        frame[0] = 0x7f;
        frame[1] = 0xfe;
        frame[2] = 0x80;
        frame[3] = 0x01;

        let blocks_field: u32 = 15; // 16 blocks
        let fsize_field: u32 = 511; // 512 bytes
        let amode: u32 = 9;
        let sfreq: u32 = 13; // 48 kHz

        frame[4] = ((blocks_field >> 7) & 0x1) as u8;
        frame[5] = (((blocks_field & 0x3f) << 2) | ((fsize_field >> 12) & 0x3)) as u8;
        frame[6] = ((fsize_field >> 4) & 0xff) as u8;
        frame[7] = (((fsize_field & 0xf) << 4) | ((amode >> 2) & 0xf)) as u8;
        frame[8] = (((amode & 0x3) << 6) | ((sfreq & 0xf) << 2)) as u8;
        frame[9] = 0;
        frame[10] = 0; // no extension, no lfe
        frame[11] = 0;
        frame[12] = 0;

        frame
    }

    /// Builds a 14-bit little-endian DTS core frame. The coded frame size
    /// of 1344 bytes covers 14 payload bits per 16-bit word, so the parser
    /// rescales it to 1536 bytes on the wire.
    fn build_dts14le_frame(fill: u8) -> Vec<u8> {
        let mut frame = vec![fill; 1536];
        frame[0] = 0xff;
        frame[1] = 0x1f;
        frame[2] = 0x00;
        frame[3] = 0xe8;

        let blocks_field: u32 = 15; // 16 blocks
        let fsize_field: u32 = 1343; // coded size 1344
        let amode: u32 = 9;
        let sfreq: u32 = 13; // 48 kHz

        frame[4] = (0xf0 | ((blocks_field >> 4) & 0x7)) as u8;
        frame[5] = 0x07;
        frame[6] = ((fsize_field >> 4) & 0xff) as u8;
        frame[7] = (((blocks_field & 0xf) << 2) | ((fsize_field >> 12) & 0x3)) as u8;
        frame[8] = (((amode & 0xf) << 4) | (sfreq & 0xf)) as u8;
        frame[9] = (((fsize_field & 0xf) << 2) | ((amode >> 4) & 0x3)) as u8;
        frame[10] = 0; // no extension
        frame[11] = 0;
        frame[12] = 0;
        frame[13] = 0; // no lfe

        frame
    }

    /// Builds a 256-byte DTS extension substream with a 16-byte substream
    /// header, placing `asset` right after the header.
    fn build_dts_extension(asset: &[u8], fill: u8) -> Vec<u8> {
        let mut ext = vec![fill; 256];
        ext[0] = 0x64;
        ext[1] = 0x58;
        ext[2] = 0x20;
        ext[3] = 0x25;
        ext[5] = 0x01; // not blown up, header size high bits
        ext[6] = 0xe0; // header size 16
        ext[7] = 0x1f;
        ext[8] = 0xe0; // substream size 256
        ext[16..16 + asset.len()].copy_from_slice(asset);
        ext
    }

    /// Builds an XLL asset: a 12-byte common header announcing 2 segments
    /// of 256 samples, then a channel set header with 6 channels at 24-bit.
    fn build_xll_asset() -> Vec<u8> {
        let mut bw = BsIoWriter::default();
        bw.put_n(32, 0x41a29547u32).unwrap(); // XLL substream sync
        bw.put_n(4, 0u8).unwrap(); // version 1
        bw.put_n(8, 11u8).unwrap(); // common header size 12
        bw.put_n(5, 13u8).unwrap(); // 14 bits in the frame size field
        bw.put_n(14, 0u16).unwrap();
        bw.put_n(4, 0u8).unwrap(); // one channel set
        bw.put_n(4, 1u8).unwrap(); // 2 segments per frame
        bw.put_n(4, 8u8).unwrap(); // 256 samples per segment
        bw.put_n(21, 0u32).unwrap(); // pad out the common header
        bw.put_n(10, 0u16).unwrap(); // channel set header size
        bw.put_n(4, 5u8).unwrap(); // 6 channels
        bw.put_n(6, 0u8).unwrap();
        bw.put_n(5, 23u8).unwrap(); // 24-bit source
        bw.byte_align().unwrap();
        bw.into_inner().unwrap()
    }

    /// Builds a 64-byte TrueHD major sync unit at 48 kHz, stereo.
    fn build_truehd_msu(fill: u8) -> Vec<u8> {
        let mut frame = vec![fill; 64];
        frame[0] = 0x00; // access unit length 32 words = 64 bytes
        frame[1] = 32;
        frame[2] = 0;
        frame[3] = 0;
        frame[4] = 0xf8;
        frame[5] = 0x72;
        frame[6] = 0x6f;
        frame[7] = 0xba;
        frame[8] = 0x00; // rate nibble 0 (48 kHz)
        frame[9] = 0x00;
        frame[10] = 0x00;
        frame[11] = 0x01; // channel map: L/R pair
        frame[20] = 0x10; // one substream
        frame[29] = 0x00; // no extension blocks

        let crc = Crc16::new(&CRC_TRUEHD_MAJOR_SYNC_ALG);
        let checksum = crc.update_major_sync(crc.init, &frame[4..30]);
        frame[30..32].copy_from_slice(&checksum.to_be_bytes());

        frame
    }

    /// Runs the stream through the parser and snapshots the stream info
    /// at every frame emission. Trailing non-stream bytes legitimately
    /// drop the lock, so end-of-run parser state is not meaningful.
    fn collect_frames(parser: &mut StreamParser, mut data: &[u8]) -> (Vec<Frame>, Vec<StreamInfo>) {
        let mut frames = Vec::new();
        let mut infos = Vec::new();
        while !data.is_empty() {
            let (consumed, frame) = parser.add_data(data);
            data = &data[consumed..];
            if let Some(frame) = frame {
                frames.push(frame);
                infos.push(parser.stream_info().clone());
            }
        }
        (frames, infos)
    }

    #[test]
    fn ac3_frame_emitted() {
        let frame = build_ac3_frame(0x33);
        let mut stream = frame.clone();
        stream.extend_from_slice(&[0x33; 8]);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, frame);

        let info = &infos[0];
        assert_eq!(info.stream_type, StreamType::Ac3);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.repeat, 1);
        assert_eq!(info.ac3_frame_size, 896);
    }

    #[test]
    fn ac3_bad_crc_is_rejected() {
        let mut frame = build_ac3_frame(0x33);
        frame[100] ^= 0xFF;
        let mut stream = frame;
        stream.extend_from_slice(&[0x33; 8]);

        let mut parser = StreamParser::default();
        let (frames, _) = collect_frames(&mut parser, &stream);

        assert!(frames.is_empty());
        assert!(!parser.has_sync());
        assert_eq!(parser.stream_info().stream_type, StreamType::Null);
    }

    /// Feeds the stream whole, then again in various chunk sizes, and
    /// requires identical frame output every time.
    fn assert_chunking_invariant(stream: &[u8], expected_count: usize) {
        let mut whole = StreamParser::default();
        let (expected, _) = collect_frames(&mut whole, stream);
        assert_eq!(expected.len(), expected_count);

        for chunk_size in [1usize, 5, 64, 1000] {
            let mut parser = StreamParser::default();
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                frames.extend(collect_frames(&mut parser, chunk).0);
            }
            assert_eq!(frames, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn ac3_chunking_does_not_change_output() {
        let mut stream = Vec::new();
        for _ in 0..4 {
            stream.extend_from_slice(&build_ac3_frame(0x33));
        }
        stream.extend_from_slice(&[0x33; 16]);

        assert_chunking_invariant(&stream, 4);
    }

    #[test]
    fn dts_chunking_does_not_change_output() {
        let frame = build_dts_frame(0x33);
        let mut stream = Vec::new();
        for _ in 0..3 {
            stream.extend_from_slice(&frame);
        }
        stream.extend_from_slice(&[0x33; 16]);

        assert_chunking_invariant(&stream, 3);
    }

    #[test]
    fn truehd_chunking_does_not_change_output() {
        let frame = build_truehd_msu(0x33);
        let mut stream = Vec::new();
        for _ in 0..3 {
            stream.extend_from_slice(&frame);
        }

        assert_chunking_invariant(&stream, 3);
    }

    #[test]
    fn resync_after_corruption() {
        let good = build_ac3_frame(0x33);
        let mut bad = good.clone();
        bad[0] = 0x00; // destroy the sync word

        let mut stream = Vec::new();
        stream.extend_from_slice(&good);
        stream.extend_from_slice(&bad);
        stream.extend_from_slice(&good);
        stream.extend_from_slice(&good);
        stream.extend_from_slice(&[0x33; 8]);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        // the corrupted frame is skipped, sync recovers on the next one
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.data, good);
        }
        assert_eq!(infos.last().unwrap().stream_type, StreamType::Ac3);
    }

    #[test]
    fn junk_never_syncs() {
        let junk = vec![0xAAu8; 200 * 1024];

        let mut parser = StreamParser::default();
        for chunk in junk.chunks(4096) {
            let (frames, _) = collect_frames(&mut parser, chunk);
            assert!(frames.is_empty());
        }

        assert!(!parser.has_sync());
        assert_eq!(parser.stream_info().stream_type, StreamType::Null);
    }

    #[test]
    fn dts_core_frame_emitted() {
        let frame = build_dts_frame(0x33);
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&[0x33; 16]);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, frame);

        let info = &infos[0];
        assert_eq!(info.stream_type, StreamType::Dts512);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 5); // amode 9, no lfe
        assert_eq!(info.bit_depth, 16);
        assert!(!info.data_is_le);
        assert_eq!(info.dts_period, 512);
        assert!((info.duration_ms() - 512.0 / 48.0).abs() < 1e-9);
    }

    #[test]
    fn dts_14bit_frame_size_is_rescaled() {
        let frame = build_dts14le_frame(0x33);
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&[0x33; 16]);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.len(), 1536);
        assert_eq!(frames[0].data, frame);

        let info = &infos[0];
        assert_eq!(info.stream_type, StreamType::Dts512);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.bit_depth, 14);
        assert!(info.data_is_le);
    }

    #[test]
    fn dts_hd_ma_extension_is_classified() {
        let mut unit = build_dts_frame(0x33);
        unit.extend_from_slice(&build_dts_extension(&build_xll_asset(), 0x33));

        let mut stream = unit.clone();
        stream.extend_from_slice(&unit);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        // core plus extension substream come out as one frame
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.len(), 768);
        assert_eq!(frames[0].data, unit);

        let info = &infos[0];
        assert_eq!(info.stream_type, StreamType::DtsHdMa);
        assert_eq!(info.bit_depth, 24);
        assert_eq!(info.channels, 7); // core 5 plus the assumed extension pair
        assert_eq!(info.dts_samples_per_frame, 512);
        assert!((info.duration_ms() - 512.0 / 48.0).abs() < 1e-9);
    }

    #[test]
    fn dts_hd_lbr_extension_is_classified() {
        let mut unit = build_dts_frame(0x33);
        unit.extend_from_slice(&build_dts_extension(&0x0a801921u32.to_be_bytes(), 0x33));

        let mut stream = unit.clone();
        stream.extend_from_slice(&unit);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.len(), 768);
        assert_eq!(infos[0].stream_type, StreamType::DtsHd);
        assert_eq!(infos[0].bit_depth, 16);
    }

    #[test]
    fn core_only_mode_emits_just_the_core() {
        let core = build_dts_frame(0x33);
        let mut unit = core.clone();
        unit.extend_from_slice(&build_dts_extension(&build_xll_asset(), 0x33));

        let mut stream = unit.clone();
        stream.extend_from_slice(&unit);

        let mut parser = StreamParser::new(true);
        let (frames, infos) = collect_frames(&mut parser, &stream);

        // the extension substream is consumed but never emitted
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, core);
        assert_eq!(frames[1].data, core);
        assert_eq!(infos[0].stream_type, StreamType::DtsHdCore);
    }

    #[test]
    fn oversized_dts_extension_resyncs() {
        let core = build_dts_frame(0x33);

        // an extension substream claiming roughly a megabyte
        let mut bogus = vec![0x33u8; 64];
        bogus[0] = 0x64;
        bogus[1] = 0x58;
        bogus[2] = 0x20;
        bogus[3] = 0x25;
        bogus[5] = 0x21; // blown up
        bogus[6] = 0x01;
        bogus[7] = 0xff;
        bogus[8] = 0xff;
        bogus[9] = 0xe0;

        let mut stream = Vec::new();
        stream.extend_from_slice(&core);
        stream.extend_from_slice(&bogus);
        stream.extend_from_slice(&core);
        stream.extend_from_slice(&core);
        stream.extend_from_slice(&[0x33; 16]);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        // the frame in front of the bogus extension is lost, but the
        // parser moves on instead of waiting for bytes that never fit
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, core);
        assert_eq!(frames[1].data, core);
        assert_eq!(infos[0].stream_type, StreamType::Dts512);
    }

    #[test]
    fn truehd_major_sync_emitted() {
        let frame = build_truehd_msu(0x33);
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame);
        stream.extend_from_slice(&frame);

        let mut parser = StreamParser::default();
        let (frames, infos) = collect_frames(&mut parser, &stream);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, frame);

        let info = &infos[0];
        assert_eq!(info.stream_type, StreamType::TrueHd);
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bit_depth, 24);
        assert!(parser.has_sync());
    }

    #[test]
    fn truehd_bad_crc_is_rejected() {
        let mut frame = build_truehd_msu(0x33);
        frame[10] ^= 0x04; // corrupt major sync info, crc no longer matches

        let mut parser = StreamParser::default();
        let (frames, _) = collect_frames(&mut parser, &frame);

        assert!(frames.is_empty());
        assert!(!parser.has_sync());
    }

    #[test]
    fn truehd_short_tail_requests_more_data() {
        let frame = build_truehd_msu(0x33);

        let mut parser = StreamParser::default();
        let (frames, _) = collect_frames(&mut parser, &frame);
        assert_eq!(frames.len(), 1);
        assert!(parser.has_sync());

        // a partial follow-up unit must not produce a frame
        let (consumed, emitted) = parser.add_data(&[0x33; 5]);
        assert_eq!(consumed, 5);
        assert!(emitted.is_none());

        // a complete unit afterwards resynchronizes past the stray bytes
        let (frames, _) = collect_frames(&mut parser, &frame);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, frame);
    }

    #[test]
    fn reset_clears_pending_state() {
        let frame = build_ac3_frame(0x33);

        let mut parser = StreamParser::default();
        // feed half a frame, then reset
        let (_, emitted) = parser.add_data(&frame[..200]);
        assert!(emitted.is_none());
        parser.reset();

        let mut stream = frame.clone();
        stream.extend_from_slice(&[0x33; 8]);
        let (frames, _) = collect_frames(&mut parser, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, frame);
    }
}
