//! Top-level screen router.
//!
//! The UI sends [`Action`]s to [`App::dispatch`], which owns the current
//! [`Session`] and decides the next [`Screen`].

#![allow(missing_docs)]

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::PortalApi;
use crate::auth_flow::AuthFlow;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;
use crate::types::Session;
use crate::wizard::ComplaintWizard;

/// Everything the portal can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Consent,
    Auth,
    Dashboard,
    AdminDashboard,
    ReportComplaint,
    ReportSuspicious,
    Timeline { complaint_id: String },
    Profile,
    Notifications,
}

/// User intents.
#[derive(Debug, Clone)]
pub enum Action {
    AcceptConsent,
    /// The auth flow produced a session.
    SignedIn(Session),
    OpenReportComplaint,
    OpenReportSuspicious,
    OpenTimeline(String),
    OpenProfile,
    OpenNotifications,
    Home,
    Logout,
}

/// Portal client state.
pub struct App {
    api: Arc<dyn PortalApi>,
    store: SessionStore,
    session: Option<Session>,
    screen: Screen,
    auth: AuthFlow,
    wizard: ComplaintWizard,
}

impl App {
    /// Start the client, restoring a saved session if there is one.
    pub async fn start(api: Arc<dyn PortalApi>, store: SessionStore) -> ClientResult<Self> {
        let session = store.load().await?;
        let screen = session.as_ref().map_or(Screen::Consent, home_screen);
        if let Some(session) = &session {
            info!(user_id = %session.user.id, "Restored session");
        }

        Ok(Self {
            auth: AuthFlow::new(Arc::clone(&api)),
            api,
            store,
            session,
            screen,
            wizard: ComplaintWizard::new(),
        })
    }

    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn api(&self) -> &dyn PortalApi {
        self.api.as_ref()
    }

    pub fn auth_mut(&mut self) -> &mut AuthFlow {
        &mut self.auth
    }

    pub fn wizard_mut(&mut self) -> &mut ComplaintWizard {
        &mut self.wizard
    }

    /// Submit the complaint wizard with the current session.
    pub async fn submit_complaint(&mut self) -> ClientResult<String> {
        let token = self.require_session()?.token.clone();
        let id = self.wizard.submit(self.api.as_ref(), &token).await?;
        Ok(id.to_string())
    }

    fn require_session(&self) -> ClientResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| ClientError::Session("Not signed in".to_string()))
    }

    /// Apply an action and return the resulting screen.
    pub async fn dispatch(&mut self, action: Action) -> ClientResult<&Screen> {
        let next = match action {
            Action::AcceptConsent => match &self.session {
                Some(session) => home_screen(session),
                None => {
                    self.auth.reset();
                    Screen::Auth
                }
            },
            Action::SignedIn(session) => {
                self.store.save(&session).await?;
                info!(user_id = %session.user.id, "Signed in");
                let screen = home_screen(&session);
                self.session = Some(session);
                screen
            }
            Action::Home => home_screen(self.require_session()?),
            Action::OpenReportComplaint => {
                self.require_session()?;
                self.wizard = ComplaintWizard::new();
                Screen::ReportComplaint
            }
            Action::OpenReportSuspicious => {
                self.require_session()?;
                Screen::ReportSuspicious
            }
            Action::OpenTimeline(complaint_id) => {
                self.require_session()?;
                Screen::Timeline { complaint_id }
            }
            Action::OpenProfile => {
                self.require_session()?;
                Screen::Profile
            }
            Action::OpenNotifications => {
                self.require_session()?;
                Screen::Notifications
            }
            Action::Logout => {
                self.logout().await?;
                Screen::Consent
            }
        };

        self.screen = next;
        Ok(&self.screen)
    }

    async fn logout(&mut self) -> ClientResult<()> {
        if let Some(session) = self.session.take() {
            // The local session goes regardless of whether the server heard us.
            if let Err(e) = self.api.logout(&session.token).await {
                warn!(error = %e, "Server logout failed");
            }
            info!(user_id = %session.user.id, "Signed out");
        }
        self.store.clear().await?;
        self.auth.reset();
        self.wizard = ComplaintWizard::new();
        Ok(())
    }
}

fn home_screen(session: &Session) -> Screen {
    if session.is_official() {
        Screen::AdminDashboard
    } else {
        Screen::Dashboard
    }
}
