//! Token resolution and signing.

pub mod signing;
pub mod token_resolver;

pub use signing::{decode_token, sign_token, DecodedToken, ProofSigner, TokenSigner, PREAMBLE};
pub use token_resolver::TokenResolver;
