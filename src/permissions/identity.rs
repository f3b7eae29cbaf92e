//! Actor identity and the session that publishes it.

use tokio::sync::watch;
use tracing::info;

/// Role used when no actor is logged in.
pub const GUEST_ROLE: &str = "guest";

/// The current actor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated { user_id: String, role: String },
}

impl Identity {
    /// Role permissions are keyed by; `"guest"` when anonymous.
    pub fn role(&self) -> &str {
        match self {
            Self::Anonymous => GUEST_ROLE,
            Self::Authenticated { role, .. } => role,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Identity provider. Every login/logout is published to subscribers.
#[derive(Debug, Clone)]
pub struct Session {
    tx: watch::Sender<Identity>,
}

impl Session {
    /// Start an anonymous session.
    pub fn new() -> Self {
        Self::with_identity(Identity::Anonymous)
    }

    pub fn with_identity(identity: Identity) -> Self {
        let (tx, _rx) = watch::channel(identity);
        Self { tx }
    }

    pub fn current(&self) -> Identity {
        self.tx.borrow().clone()
    }

    pub fn role(&self) -> String {
        self.tx.borrow().role().to_string()
    }

    /// Receiver notified on every identity change.
    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.tx.subscribe()
    }

    pub fn login(&self, user_id: impl Into<String>, role: impl Into<String>) {
        let identity = Identity::Authenticated {
            user_id: user_id.into(),
            role: role.into(),
        };
        info!("Session login as role '{}'", identity.role());
        self.tx.send_replace(identity);
    }

    pub fn logout(&self) {
        let was_anonymous = self.tx.send_replace(Identity::Anonymous).is_anonymous();
        if !was_anonymous {
            info!("Session logout");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
