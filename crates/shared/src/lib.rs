pub mod clock;
pub mod constants;
pub mod domain;
pub mod error;
