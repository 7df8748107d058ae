//! Session token generation.

use crate::message::Token;
use uuid::Uuid;

/// Source of fresh, unique session tokens.
pub trait TokenSource {
    fn generate(&mut self) -> Token;
}

/// Random v4 UUID tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokens;

impl TokenSource for UuidTokens {
    fn generate(&mut self) -> Token {
        Token::new(Uuid::new_v4().to_string())
    }
}
