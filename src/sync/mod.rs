pub mod backoff;
pub mod coordinator;
pub mod push;
pub mod state;

pub use backoff::Backoff;
pub use coordinator::{SubscriptionHandle, SyncCoordinator, SyncSettings};
pub use push::{PushChannel, PushMessage, PushStream, SseDecoder, SsePushChannel};
pub use state::{SignalSources, SyncSignal, SyncState, Trigger};
