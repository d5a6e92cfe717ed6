//! Online-user registry
//!
//! The registry maps display names to sessions and is the single source of
//! truth for who is online. One exclusive lock guards it; every operation,
//! including the per-message fan-out, holds that lock for its full
//! duration.
//!
//! ```text
//!                 Arc<Registry>
//!          ┌──────────────────────────┐
//!          │ Mutex<                   │
//!          │   sessions: name → Arc<Session>
//!          │   names:    id   → name  │
//!          │ >                        │
//!          └────────────┬─────────────┘
//!                       │
//!       ┌───────────────┼────────────────┐
//!       ▼               ▼                ▼
//!  join/leave      rename/lookup     fan_out ──► inbox.push()
//! ```
//!
//! Display names live only inside the lock, so there is no way to read a
//! session's name without synchronizing with renames.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::OnlineEntry;
pub use error::RegistryError;
pub use store::Registry;
