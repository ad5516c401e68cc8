pub mod codec;
pub mod error;
pub mod session;
pub mod types;

pub use codec::{decode, decode_lines, encode, DecodeError, DecodeMode, Decoded};
pub use error::{Error, Result, ValidationError};
pub use session::{admit, MAX_DISTRACTION_COUNT};
pub use types::*;
