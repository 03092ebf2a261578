//! Validated, immutable JSON Web Token claim sets.
//!
//! This crate provides the claim-construction side of stateless token
//! authentication:
//! - a claim registry that validates individual claims by name
//! - a payload factory that assembles claim sets from defaults and caller values
//! - cross-claim policy validation, with a relaxed refresh flow
//! - an immutable [`Payload`] with keyed, dotted-path and predicate lookups
//! - a signing adapter seam ([`PayloadCodec`]) with an HS256 reference codec
//!
//! ```
//! use cryypt_claims::{ClaimRegistry, Factory, PayloadValidator, StaticIssuer};
//!
//! # fn main() -> Result<(), cryypt_claims::ClaimsError> {
//! let mut factory = Factory::new(
//!     ClaimRegistry::new(),
//!     StaticIssuer::new("https://auth.example.com/login"),
//!     PayloadValidator::new(),
//! );
//!
//! let payload = factory.with_subject(42).claim("role", "admin").make()?;
//! assert_eq!(payload.get("sub")?, 42);
//! assert_eq!(payload.issuer()?, "https://auth.example.com/login");
//! # Ok(())
//! # }
//! ```

pub mod claim;
pub mod clock;
pub mod codec;
pub mod config;
mod error;
pub mod factory;
pub mod manager;
pub mod payload;
pub mod registry;
pub mod validator;

pub use claim::{Claim, ClaimKind, StandardClaim};
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use codec::{Hs256Codec, PayloadCodec};
pub use config::ClaimsConfig;
pub use error::*;
pub use factory::{Factory, IssuerProvider, StaticIssuer};
pub use manager::TokenManager;
pub use payload::Payload;
pub use registry::ClaimRegistry;
pub use validator::PayloadValidator;
