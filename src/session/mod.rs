mod cipher;
mod store;

pub use cipher::TokenCipher;
pub use store::{Role, Session, SessionStore};
