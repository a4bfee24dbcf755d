#![no_std]

pub mod board;
pub mod time_source;
