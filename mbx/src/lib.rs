extern crate chrono;
extern crate clap;
extern crate dirs;
extern crate mobilesync;
extern crate rpassword;

pub mod cli;
pub mod driver;
pub mod error;
pub mod extract;
pub mod select;
pub mod utils;
