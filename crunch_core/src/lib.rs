pub mod bitio;
pub mod codec;
pub mod error;
pub mod outcome;
pub mod path;

pub use codec::{Algorithm, Codec};
pub use error::{Error, HuffmanError, ImageError, LzssError};
pub use outcome::{Outcome, Stats};
