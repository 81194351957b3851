pub mod object;
pub mod pack;
pub mod storage;
pub mod zlib;
