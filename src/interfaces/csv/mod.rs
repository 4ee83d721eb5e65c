//! CSV command input and coupon/history output for the binary.

pub mod command_reader;
pub mod coupon_writer;
