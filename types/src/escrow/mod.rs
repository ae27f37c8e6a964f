mod caller;
mod codec;
mod constants;
mod custody;
mod game;
mod tournament;

pub use caller::*;
pub use codec::{read_string, string_encode_size, write_string};
pub use constants::*;
pub use custody::*;
pub use game::*;
pub use tournament::*;
