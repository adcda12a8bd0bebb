//! Portal REST API client.
//!
//! [`PortalApi`] is the seam the UI state machines call through;
//! [`HttpPortalApi`] is the reqwest implementation.

#![allow(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::types::{
    ComplaintDetail, Complaint, DashboardStats, NewComplaint, NewSuspiciousReport,
    NotificationList, OtpPurpose, OtpSent, RegisterRequest, RegisterResponse, ReportReceipt,
    Session, SubmittedComplaint,
};

/// Operations the portal UI needs from the server.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse>;

    async fn verify_registration(&self, user_id: &str, otp: &str) -> ClientResult<()>;

    async fn resend_otp(&self, user_id: &str, purpose: OtpPurpose) -> ClientResult<OtpSent>;

    async fn set_password(&self, user_id: &str, password: &str) -> ClientResult<Session>;

    async fn login(&self, user_id: &str, password: &str) -> ClientResult<Session>;

    async fn forgot_password(&self, user_id: &str) -> ClientResult<OtpSent>;

    async fn reset_password(&self, user_id: &str, otp: &str, new_password: &str)
    -> ClientResult<()>;

    async fn logout(&self, token: &str) -> ClientResult<()>;

    async fn submit_complaint(
        &self,
        token: &str,
        complaint: &NewComplaint,
    ) -> ClientResult<SubmittedComplaint>;

    async fn complaints_for_user(&self, token: &str, user_id: &str)
    -> ClientResult<Vec<Complaint>>;

    async fn complaint_detail(&self, token: &str, id: &str) -> ClientResult<ComplaintDetail>;

    async fn report_suspicious(
        &self,
        token: &str,
        report: &NewSuspiciousReport,
    ) -> ClientResult<ReportReceipt>;

    async fn notifications(&self, token: &str) -> ClientResult<NotificationList>;

    async fn mark_notification_read(&self, token: &str, id: &str) -> ClientResult<()>;

    async fn admin_stats(&self, token: &str) -> ClientResult<DashboardStats>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: String,
    message: String,
    user_id: Option<String>,
}

/// HTTP implementation of [`PortalApi`].
#[derive(Clone)]
pub struct HttpPortalApi {
    client: Client,
    base_url: Url,
}

impl HttpPortalApi {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ClientError::validation(format!("Invalid server URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("cyberguard-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::validation(format!("Invalid path {path}: {e}")))?;
        Ok(self.client.request(method, url))
    }

    fn authed(&self, method: Method, path: &str, token: &str) -> ClientResult<RequestBuilder> {
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!(status = %status, len = bytes.len(), "Portal API response");
        decode(status.as_u16(), &bytes)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }
}

/// Decode a response envelope, turning error envelopes into [`ClientError::Api`].
fn decode<T: DeserializeOwned>(status: u16, bytes: &[u8]) -> ClientResult<T> {
    match serde_json::from_slice::<Envelope<T>>(bytes) {
        Ok(Envelope {
            success: true,
            data: Some(data),
            ..
        }) if status < 400 => Ok(data),
        Ok(Envelope {
            error: Some(err), ..
        }) => Err(ClientError::Api {
            status,
            code: err.code,
            message: err.message,
            user_id: err.user_id,
        }),
        Ok(_) => Err(unexpected(status, "Response carried no data")),
        Err(e) => {
            warn!(status, error = %e, "Undecodable portal response");
            Err(unexpected(status, "Unexpected response from server"))
        }
    }
}

fn unexpected(status: u16, message: &str) -> ClientError {
    ClientError::Api {
        status,
        code: "UNEXPECTED_RESPONSE".to_string(),
        message: message.to_string(),
        user_id: None,
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        self.post("auth/register", request).await
    }

    async fn verify_registration(&self, user_id: &str, otp: &str) -> ClientResult<()> {
        let _: IgnoredAny = self
            .post(
                "auth/verify-registration",
                &json!({ "userId": user_id, "otp": otp }),
            )
            .await?;
        Ok(())
    }

    async fn resend_otp(&self, user_id: &str, purpose: OtpPurpose) -> ClientResult<OtpSent> {
        self.post(
            "auth/resend-otp",
            &json!({ "userId": user_id, "purpose": purpose }),
        )
        .await
    }

    async fn set_password(&self, user_id: &str, password: &str) -> ClientResult<Session> {
        self.post(
            "auth/set-password",
            &json!({ "userId": user_id, "password": password }),
        )
        .await
    }

    async fn login(&self, user_id: &str, password: &str) -> ClientResult<Session> {
        self.post(
            "auth/login",
            &json!({ "userId": user_id, "password": password }),
        )
        .await
    }

    async fn forgot_password(&self, user_id: &str) -> ClientResult<OtpSent> {
        self.post("auth/forgot-password", &json!({ "userId": user_id }))
            .await
    }

    async fn reset_password(
        &self,
        user_id: &str,
        otp: &str,
        new_password: &str,
    ) -> ClientResult<()> {
        let _: IgnoredAny = self
            .post(
                "auth/reset-password",
                &json!({ "userId": user_id, "otp": otp, "newPassword": new_password }),
            )
            .await?;
        Ok(())
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        let _: IgnoredAny = self
            .send(self.authed(Method::POST, "auth/logout", token)?)
            .await?;
        Ok(())
    }

    async fn submit_complaint(
        &self,
        token: &str,
        complaint: &NewComplaint,
    ) -> ClientResult<SubmittedComplaint> {
        self.send(
            self.authed(Method::POST, "grievance/report", token)?
                .json(complaint),
        )
        .await
    }

    async fn complaints_for_user(
        &self,
        token: &str,
        user_id: &str,
    ) -> ClientResult<Vec<Complaint>> {
        self.send(self.authed(Method::GET, &format!("grievance/user/{user_id}"), token)?)
            .await
    }

    async fn complaint_detail(&self, token: &str, id: &str) -> ClientResult<ComplaintDetail> {
        self.send(self.authed(Method::GET, &format!("grievance/{id}"), token)?)
            .await
    }

    async fn report_suspicious(
        &self,
        token: &str,
        report: &NewSuspiciousReport,
    ) -> ClientResult<ReportReceipt> {
        self.send(
            self.authed(Method::POST, "suspicious/report", token)?
                .json(report),
        )
        .await
    }

    async fn notifications(&self, token: &str) -> ClientResult<NotificationList> {
        self.send(self.authed(Method::GET, "notifications", token)?)
            .await
    }

    async fn mark_notification_read(&self, token: &str, id: &str) -> ClientResult<()> {
        let _: IgnoredAny = self
            .send(self.authed(Method::POST, &format!("notifications/{id}/read"), token)?)
            .await?;
        Ok(())
    }

    async fn admin_stats(&self, token: &str) -> ClientResult<DashboardStats> {
        self.send(self.authed(Method::GET, "admin/stats", token)?)
            .await
    }
}
