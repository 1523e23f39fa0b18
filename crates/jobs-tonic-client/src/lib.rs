#![doc = include_str!("../README.md")]

pub mod config;
pub mod demo;

pub use demo::{DemoError, DemoReport, connect, run, run_demo};
