//! Chat panel for one reservation.
//!
//! - [`PanelState`] is the synchronous state machine (`Idle → Loading →
//!   Ready`, with a `Sending` guard) that a UI loop owns and renders.
//! - [`ops`] holds the async operations against a [`ChatBackend`]:
//!   fetching, resolving the sender, delivering, and best-effort
//!   translation requests.
//! - [`ChatPanel`] wires both together for callers that run everything
//!   on one task.
//!
//! [`ChatBackend`]: orderchat_client::ChatBackend

pub mod config;
pub mod error;
pub mod ops;
pub mod panel;
pub mod state;

pub use config::PanelConfig;
pub use error::{PanelError, SendRejected};
pub use panel::ChatPanel;
pub use state::{PanelPhase, PanelState, SendRequest};
