#[derive(thiserror::Error, Debug)]
pub enum SeiError {
    #[error("SEI payload of {size} bytes exceeds the {remaining} bits left in the RBSP")]
    PayloadTooLarge { size: u64, remaining: u64 },

    #[error("Truncated SEI message header")]
    TruncatedHeader(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum RpuError {
    #[error("RPU record is not byte aligned before the checksum")]
    Misaligned,

    #[error("RPU write failed")]
    Write(#[from] std::io::Error),
}
