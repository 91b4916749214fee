//! Identity provider bridge.
//!
//! The identity provider owns sign-in; the directory keeps a mirror of each
//! person it knows about, linked by [`saakie_core::ExternalUserId`]. The
//! provider pushes lifecycle events to `POST /webhooks/identity`, which are
//! authenticated by a [`WebhookVerifier`] and applied by [`IdentitySync`].

pub mod event;
pub mod signature;
pub mod sync;

pub use event::{PayloadError, ProviderUser, VerifiedEvent};
pub use signature::{SignatureError, SvixVerifier, WebhookHeaders, WebhookVerifier};
pub use sync::{IdentitySync, SyncError, SyncOutcome};
