pub mod convert;
pub mod sei;
pub mod sync;
