/*
[INPUT]:  Signing configuration and key material
[OUTPUT]: Request signatures for login and REST authentication
[POS]:    Auth layer - handles Bitget API authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod signer;

pub use signer::{SignScheme, Signer};
