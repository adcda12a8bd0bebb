//! Client for the CyberGuard portal.
//!
//! A typed HTTP client for the REST API plus the client-side state the portal
//! UI runs on: the persisted session, the sign-in flow, the complaint wizard
//! and the screen router.

pub mod api;
pub mod app;
pub mod auth_flow;
pub mod error;
pub mod session;
pub mod types;
pub mod wizard;

pub use api::{HttpPortalApi, PortalApi};
pub use app::{Action, App, Screen};
pub use auth_flow::{AuthFlow, AuthStep, RegistrationForm};
pub use error::{ClientError, ClientResult};
pub use session::SessionStore;
pub use wizard::{ComplaintDraft, ComplaintWizard, WizardStep};
