// Do this because numerics calls for a lot of non-standard names
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
pub mod error;
pub mod helper;
pub mod logging;
pub mod profile;
pub mod radar;
pub mod signal;
pub mod stepped;
pub mod sweep;
