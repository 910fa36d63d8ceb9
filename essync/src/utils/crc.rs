//! CRC validation utilities for bitstream parsing.
//!
//! Provides CRC-16 and CRC-32 implementations with format-specific
//! algorithms for validating AC-3 frames, TrueHD major sync information
//! and Dolby Vision RPU records.
//!
//! Note: the TrueHD major sync checksum folds data into the low byte of the
//! register and is not a standard CRC implementation.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 algorithm for AC-3 frame validation.
pub const CRC_AC3_FRAME_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0x0000,
};

/// CRC-16 algorithm for TrueHD major sync information validation.
pub const CRC_TRUEHD_MAJOR_SYNC_ALG: Algorithm<u16> = Algorithm {
    poly: 0x2d,
    init: 0x00,
};

/// CRC-32 algorithm for Dolby Vision RPU records.
pub const CRC_RPU_ALG: Algorithm<u32> = Algorithm {
    poly: 0x04c11db7,
    init: 0xffffffff,
};

/// Computes CRC-16 checksum using specified polynomial.
#[inline(always)]
pub const fn crc16(poly: u16, mut value: u16, len: usize) -> u16 {
    value <<= 8;

    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 15) & 1) * poly);
        i += 1;
    }

    value
}

/// Computes CRC-32 checksum using specified polynomial.
#[inline(always)]
pub const fn crc32(poly: u32, mut value: u32, len: usize) -> u32 {
    value <<= 24;

    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 31) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16(poly, i as u16, 8);
        i += 1;
    }

    table
}

#[inline(always)]
const fn crc32_table(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc32(poly, i as u32, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

#[derive(Debug)]
pub struct Crc32 {
    pub poly: u32,
    pub init: u32,
    table: [u32; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u16) -> u16 {
        self.table[(index & 0xFF) as usize]
    }

    /// Standard MSB-first update, data byte folded into the table index.
    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry((crc >> 8) ^ bytes[i] as u16) ^ (crc << 8);
            i += 1;
        }

        crc
    }

    /// TrueHD major sync variant, data byte folded into the low byte
    /// of the register.
    #[inline(always)]
    pub const fn update_major_sync(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry(crc >> 8) ^ (crc << 8) ^ bytes[i] as u16;
            i += 1;
        }

        crc
    }
}

impl Crc32 {
    pub const fn new(algorithm: &Algorithm<u32>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc32_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u32) -> u32 {
        self.table[(index & 0xFF) as usize]
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u32, bytes: &[u8]) -> u32 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry((crc >> 24) ^ bytes[i] as u32) ^ (crc << 8);
            i += 1;
        }

        crc
    }
}

#[test]
fn ac3_crc_zeroes_over_message_and_checksum() {
    let crc = Crc16::new(&CRC_AC3_FRAME_ALG);

    let message = [0x0Bu8, 0x77, 0x12, 0x34, 0x56, 0x78, 0x9A];
    let checksum = crc.update(crc.init, &message);

    let mut framed = message.to_vec();
    framed.extend_from_slice(&checksum.to_be_bytes());

    assert_eq!(crc.update(crc.init, &framed), 0);
}

#[test]
fn rpu_crc_known_value() {
    // CRC-32/MPEG-2 of "123456789"
    let crc = Crc32::new(&CRC_RPU_ALG);
    assert_eq!(crc.update(crc.init, b"123456789"), 0x0376e6e7);
}

#[test]
fn major_sync_crc_differs_from_standard() {
    let crc = Crc16::new(&CRC_TRUEHD_MAJOR_SYNC_ALG);
    let bytes = [0xF8u8, 0x72, 0x6F, 0xBA, 0x00];

    assert_ne!(
        crc.update(crc.init, &bytes),
        crc.update_major_sync(crc.init, &bytes)
    );
}
