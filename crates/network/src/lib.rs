//! Cattle Network
//!
//! Turns the compact `NetworkInputFile` into the enumerated `NetworkFile`
//! topology, and produces starter input files for `cattle init`.

pub mod error;
pub mod expansion;
pub mod init;

pub use error::{NetworkError, Result};
pub use expansion::{expand, expand_to_file, friendly_number, node_overrides};
pub use init::{init_input_file, template_input, InitOptions};
