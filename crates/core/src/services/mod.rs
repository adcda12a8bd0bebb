//! Business logic services.

#![allow(missing_docs)]

pub mod alert;
pub mod auth;
pub mod catalog;
pub mod complaint;
pub mod dashboard;
pub mod hashing;
pub mod notification;
pub mod otp;
pub mod suspicious;
pub mod user;

pub use alert::{AlertService, AlertSeverity, BroadcastAlertInput};
pub use auth::{
    AuthService, LoginInput, RegisterInput, RegistrationOutcome, ResetPasswordInput, Session,
    SetPasswordInput, VerifyOtpInput,
};
pub use catalog::{Catalog, ComplaintCategory, catalog};
pub use complaint::{
    ComplaintDetail, ComplaintService, ComplaintWithOwner, SubmitComplaintInput,
    UpdateComplaintStatusInput,
};
pub use dashboard::{DashboardService, DashboardStats};
pub use notification::{NewNotification, NotificationService};
pub use otp::{LogOtpSender, OtpSender, OtpSenderService, OtpService};
pub use suspicious::{
    ReportOutcome, ReportSuspiciousInput, ReviewEntityInput, SuspiciousEntityService,
};
pub use user::{UpdateProfileInput, UserService, require_official, require_self_or_official};
