//! # Action Classification
//!
//! The middleware sees every action in the pipeline but only acts on two
//! intents. [`BusAction::classify`] resolves the intent once, into the closed
//! [`Classified`] union, so routing never inspects string tags.
//!
//! Applications either implement [`BusAction`] for their own action enum or
//! wrap their actions in the ready-made [`PostalAction`].

use crate::intent::{RequestMessage, SendMessage};
use postal_bus::Envelope;
use std::fmt;

/// Type tag of a send intent.
pub const SEND_MESSAGE: &str = "POSTAL_SEND";

/// Type tag of a request intent.
pub const REQUEST_MESSAGE: &str = "POSTAL_REQUEST";

/// Type tag of the action dispatched for every inbound bus message.
pub const RECEIVE_MESSAGE: &str = "POSTAL_RECEIVE_MESSAGE";

/// The action kinds the postal bridge defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Send,
    Request,
    ReceiveMessage,
}

impl ActionKind {
    /// Stable string tag, for reducers keyed on strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => SEND_MESSAGE,
            Self::Request => REQUEST_MESSAGE,
            Self::ReceiveMessage => RECEIVE_MESSAGE,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying an action.
pub enum Classified<A> {
    /// Broadcast and report subscriber presence.
    Send(SendMessage<A>),
    /// Ask and wait for one reply.
    Request(RequestMessage<A>),
    /// Not an intent; forwarded unchanged.
    PassThrough(A),
}

/// An action type the postal middleware can route.
pub trait BusAction: Sized + Send + 'static {
    /// Split an action into an intent or a pass-through.
    fn classify(self) -> Classified<Self>;

    /// Build the action dispatched for an inbound bus message.
    fn message_received(envelope: Envelope) -> Self;
}

/// Ready-made action wrapper: postal intents plus the application's own
/// actions in `App`.
///
/// Intent variants carry callbacks, so this type is not serializable and
/// should not be recorded for replay.
#[derive(Debug, Clone)]
pub enum PostalAction<T> {
    Send(SendMessage<PostalAction<T>>),
    Request(RequestMessage<PostalAction<T>>),
    ReceiveMessage(Envelope),
    App(T),
}

impl<T> PostalAction<T> {
    /// Postal kind of this action, `None` for application actions.
    #[must_use]
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Self::Send(_) => Some(ActionKind::Send),
            Self::Request(_) => Some(ActionKind::Request),
            Self::ReceiveMessage(_) => Some(ActionKind::ReceiveMessage),
            Self::App(_) => None,
        }
    }

    /// The inbound envelope, if this is a received message.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::ReceiveMessage(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// The application action, if any.
    #[must_use]
    pub fn app(&self) -> Option<&T> {
        match self {
            Self::App(action) => Some(action),
            _ => None,
        }
    }
}

impl<T: Send + 'static> BusAction for PostalAction<T> {
    fn classify(self) -> Classified<Self> {
        match self {
            Self::Send(intent) => Classified::Send(intent),
            Self::Request(intent) => Classified::Request(intent),
            other => Classified::PassThrough(other),
        }
    }

    fn message_received(envelope: Envelope) -> Self {
        Self::ReceiveMessage(envelope)
    }
}

impl<T> From<SendMessage<PostalAction<T>>> for PostalAction<T> {
    fn from(intent: SendMessage<PostalAction<T>>) -> Self {
        Self::Send(intent)
    }
}

impl<T> From<RequestMessage<PostalAction<T>>> for PostalAction<T> {
    fn from(intent: RequestMessage<PostalAction<T>>) -> Self {
        Self::Request(intent)
    }
}
