pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub mod nal;
