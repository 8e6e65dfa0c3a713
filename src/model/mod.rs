pub mod catalog;
pub mod enums;
pub mod record;
pub mod tokens;

pub use catalog::*;
pub use enums::*;
pub use record::*;
pub use tokens::{display_tokens, tokenize};
