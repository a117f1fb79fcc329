use std::fmt;

/// Lifecycle of one live-update session.
///
/// `Disconnected → Connecting → Connected ⇄ Reconnecting`, plus `Degraded`
/// (push refused the credential, polling only) and the terminal `Closed`.
/// The fallback poll runs in every state except `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Degraded,
    Closed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Disconnected => "disconnected",
            SyncState::Connecting => "connecting",
            SyncState::Connected => "connected",
            SyncState::Reconnecting => "reconnecting",
            SyncState::Degraded => "degraded",
            SyncState::Closed => "closed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Push,
    Poll,
}

/// Sources merged into one signal (diagnostics only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSources {
    pub push: bool,
    pub poll: bool,
}

impl SignalSources {
    pub fn add(&mut self, t: Trigger) {
        match t {
            Trigger::Push => self.push = true,
            Trigger::Poll => self.poll = true,
        }
    }
}

/// "Scope S may have new data." Carries no payload: consumers refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSignal {
    pub scope_id: String,
    pub sources: SignalSources,
    /// Number of triggers collapsed into this signal.
    pub merged: usize,
}
