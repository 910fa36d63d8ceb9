pub mod hdr10plus;
pub mod rpu;
pub mod sei;
pub mod stream_info;
