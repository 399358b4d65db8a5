//! Core types for Warden

mod info;
mod principal;
mod token;

pub use info::*;
pub use principal::*;
pub use token::*;
