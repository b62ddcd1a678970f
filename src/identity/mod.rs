//! Authenticated principals and the port that resolves them.
//!
//! Identity is resolved once by the request layer and then passed explicitly
//! into every service call as a [`Principal`]. Services never read identity
//! from ambient request state and never trust caller-supplied ids for
//! permission checks.

mod principal;
mod resolver;

pub use principal::{ParseRoleError, Principal, Role, UserId};
pub use resolver::{IdentityError, IdentityResolver, StaticIdentityResolver};
