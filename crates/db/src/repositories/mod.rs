//! Repositories wrapping entity queries.

mod complaint;
mod notification;
mod otp_challenge;
mod suspicious_entity;
mod user;

pub use complaint::{ComplaintFilter, ComplaintRepository};
pub use notification::NotificationRepository;
pub use otp_challenge::OtpChallengeRepository;
pub use suspicious_entity::{SuspiciousEntityFilter, SuspiciousEntityRepository};
pub use user::UserRepository;
