//! pegkeeper Common Library
//!
//! Shared types, constants, and building blocks for the peg stability
//! engine and its collaborators.
//!
//! ## Contents
//!
//! - **Rate Limiter**: token-bucket buffer that bounds new supply
//! - **Oracle**: primary/backup price reader with decimal normalisation
//!   and inversion
//! - **Token Operations**: traits for the reserve asset, the protocol token
//!   and the PCV deposit
//! - **Access Control**: Governor, Guardian and PCV controller roles
//! - **Emergency Module**: global pause and redeem pause state machine
//! - **Math**: 256-bit intermediate `mul_div` and swap pricing
//! - **Events**: indexable record of every state change
//!
//! All amounts are `u128` fixed-point integers with 18 decimals and all
//! prices are 18-decimal "token per reserve" quotes.

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod oracle;
pub mod token_ops;
pub mod access_control;
pub mod emergency;
pub mod rate_limiter;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use oracle::*;
pub use token_ops::*;
pub use access_control::*;
pub use emergency::*;
pub use rate_limiter::*;
