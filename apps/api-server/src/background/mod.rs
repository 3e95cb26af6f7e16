//! Background job worker.

mod worker;

pub use worker::start;
