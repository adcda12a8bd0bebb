//! Registration and sign-in flow.
//!
//! ```text
//! Choice ─┬─ RegisterForm ── RegisterOtp ── SetPassword ── (signed in)
//!         ├─ LoginForm ─┬─ (signed in)
//!         │             ├─ SetPassword        password never set
//!         │             └─ RegisterOtp        account not verified
//!         └─ ForgotForm ── ResetPassword ── LoginForm
//! ```
//!
//! Every step validates its input locally and only then calls the server.
//! A rejected step leaves the flow where it was.

#![allow(missing_docs)]

use std::sync::Arc;

use cyberguard_common::validation::{
    AADHAAR_LEN, OTP_LEN, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, PHONE_LEN, is_valid_aadhaar,
    is_valid_otp, is_valid_password, is_valid_phone, normalize_phone,
};
use tracing::{debug, info};

use crate::api::PortalApi;
use crate::error::{ClientError, ClientResult};
use crate::types::{OtpPurpose, RegisterRequest, Role, Session};

/// Where the user is in the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    Choice,
    RegisterForm,
    RegisterOtp { user_id: String, masked_phone: String },
    SetPassword { user_id: String },
    LoginForm,
    ForgotForm,
    ResetPassword { user_id: String, masked_phone: String },
}

/// The registration form as typed.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub aadhaar_number: String,
    pub phone_number: String,
    pub address: String,
    pub role: Role,
    pub government_id: Option<String>,
}

impl RegistrationForm {
    fn into_request(self) -> ClientResult<RegisterRequest> {
        let name = required(&self.name, "Name")?;
        let address = required(&self.address, "Address")?;

        let aadhaar_number = self.aadhaar_number.trim().to_string();
        if !is_valid_aadhaar(&aadhaar_number) {
            return Err(ClientError::validation(format!(
                "Aadhaar number must be exactly {AADHAAR_LEN} digits"
            )));
        }

        let phone_number = normalize_phone(&self.phone_number);
        if !is_valid_phone(&phone_number) {
            return Err(ClientError::validation(format!(
                "Phone number must be exactly {PHONE_LEN} digits"
            )));
        }

        let government_id = self
            .government_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if self.role == Role::Official && government_id.is_none() {
            return Err(ClientError::validation(
                "Government ID is required for officials",
            ));
        }

        Ok(RegisterRequest {
            name,
            aadhaar_number,
            phone_number,
            address,
            role: self.role,
            government_id,
        })
    }
}

fn required(value: &str, field: &str) -> ClientResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn check_otp(otp: &str) -> ClientResult<&str> {
    let otp = otp.trim();
    if is_valid_otp(otp) {
        Ok(otp)
    } else {
        Err(ClientError::validation(format!(
            "OTP must be exactly {OTP_LEN} digits"
        )))
    }
}

fn check_new_password<'a>(password: &'a str, confirm: &str) -> ClientResult<&'a str> {
    if !is_valid_password(password) {
        return Err(ClientError::validation(format!(
            "Password must be {PASSWORD_MIN_LEN} to {PASSWORD_MAX_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(ClientError::validation("Passwords do not match"));
    }
    Ok(password)
}

fn wrong_step() -> ClientError {
    ClientError::validation("This action is not available at the current step")
}

/// Drives [`AuthStep`] against a [`PortalApi`].
pub struct AuthFlow {
    api: Arc<dyn PortalApi>,
    step: AuthStep,
}

impl AuthFlow {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self {
            api,
            step: AuthStep::Choice,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &AuthStep {
        &self.step
    }

    pub fn start_register(&mut self) {
        self.step = AuthStep::RegisterForm;
    }

    pub fn start_login(&mut self) {
        self.step = AuthStep::LoginForm;
    }

    pub fn start_forgot(&mut self) {
        self.step = AuthStep::ForgotForm;
    }

    /// Back to the initial choice.
    pub fn reset(&mut self) {
        self.step = AuthStep::Choice;
    }

    /// Submit the registration form. On success the flow waits for the OTP.
    pub async fn submit_registration(&mut self, form: RegistrationForm) -> ClientResult<()> {
        if self.step != AuthStep::RegisterForm {
            return Err(wrong_step());
        }
        let request = form.into_request()?;

        let response = self.api.register(&request).await?;
        info!(user_id = %response.user_id, "Registered, awaiting OTP");

        self.step = AuthStep::RegisterOtp {
            user_id: response.user_id,
            masked_phone: response.masked_phone,
        };
        Ok(())
    }

    /// Confirm the registration OTP. On success the flow asks for a password.
    pub async fn submit_otp(&mut self, otp: &str) -> ClientResult<()> {
        let AuthStep::RegisterOtp { user_id, .. } = &self.step else {
            return Err(wrong_step());
        };
        let otp = check_otp(otp)?;

        self.api.verify_registration(user_id, otp).await?;

        self.step = AuthStep::SetPassword {
            user_id: user_id.clone(),
        };
        Ok(())
    }

    /// Ask for a fresh code at an OTP step.
    pub async fn resend_otp(&mut self) -> ClientResult<()> {
        let (user_id, purpose) = match &self.step {
            AuthStep::RegisterOtp { user_id, .. } => (user_id.clone(), OtpPurpose::Registration),
            AuthStep::ResetPassword { user_id, .. } => {
                (user_id.clone(), OtpPurpose::PasswordReset)
            }
            _ => return Err(wrong_step()),
        };

        let sent = self.api.resend_otp(&user_id, purpose).await?;
        match &mut self.step {
            AuthStep::RegisterOtp { masked_phone, .. }
            | AuthStep::ResetPassword { masked_phone, .. } => *masked_phone = sent.masked_phone,
            _ => {}
        }
        Ok(())
    }

    /// Choose the first password. Signs the user in.
    pub async fn submit_password(&mut self, password: &str, confirm: &str) -> ClientResult<Session> {
        let AuthStep::SetPassword { user_id } = &self.step else {
            return Err(wrong_step());
        };
        let password = check_new_password(password, confirm)?;

        let session = self.api.set_password(user_id, password).await?;

        self.step = AuthStep::Choice;
        Ok(session)
    }

    /// Sign in.
    ///
    /// Returns `Ok(None)` when the server sent the user to another step
    /// (password never chosen, or account never verified). A wrong password
    /// is an error and leaves the flow on the login form.
    pub async fn login(&mut self, user_id: &str, password: &str) -> ClientResult<Option<Session>> {
        if self.step != AuthStep::LoginForm {
            return Err(wrong_step());
        }
        let user_id = required(user_id, "User ID")?;
        if password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }

        match self.api.login(&user_id, password).await {
            Ok(session) => {
                self.step = AuthStep::Choice;
                Ok(Some(session))
            }
            Err(err) if err.is_code("PASSWORD_NOT_SET") => {
                debug!(user_id = %user_id, "Password not set, redirecting");
                self.step = AuthStep::SetPassword {
                    user_id: err.user_id().map_or(user_id, str::to_string),
                };
                Ok(None)
            }
            Err(err) if err.is_code("ACCOUNT_NOT_VERIFIED") => {
                debug!(user_id = %user_id, "Account not verified, sending a new OTP");
                let user_id = err.user_id().map_or(user_id, str::to_string);
                let sent = self
                    .api
                    .resend_otp(&user_id, OtpPurpose::Registration)
                    .await?;
                self.step = AuthStep::RegisterOtp {
                    user_id,
                    masked_phone: sent.masked_phone,
                };
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Start a password reset. The server texts a code to the registered phone.
    pub async fn submit_forgot(&mut self, user_id: &str) -> ClientResult<()> {
        if self.step != AuthStep::ForgotForm {
            return Err(wrong_step());
        }
        let user_id = required(user_id, "User ID")?;

        let sent = self.api.forgot_password(&user_id).await?;

        self.step = AuthStep::ResetPassword {
            user_id: sent.user_id,
            masked_phone: sent.masked_phone,
        };
        Ok(())
    }

    /// Finish a password reset. On success the flow returns to the login form.
    pub async fn submit_reset(
        &mut self,
        otp: &str,
        password: &str,
        confirm: &str,
    ) -> ClientResult<()> {
        let AuthStep::ResetPassword { user_id, .. } = &self.step else {
            return Err(wrong_step());
        };
        let otp = check_otp(otp)?;
        let password = check_new_password(password, confirm)?;

        self.api.reset_password(user_id, otp, password).await?;

        self.step = AuthStep::LoginForm;
        Ok(())
    }
}
