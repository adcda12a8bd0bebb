//! Database entities.

pub mod complaint;
pub mod complaint_event;
pub mod notification;
pub mod otp_challenge;
pub mod suspicious_entity;
pub mod user;

pub use complaint::Entity as Complaint;
pub use complaint_event::Entity as ComplaintEvent;
pub use notification::Entity as Notification;
pub use otp_challenge::Entity as OtpChallenge;
pub use suspicious_entity::Entity as SuspiciousEntity;
pub use user::Entity as User;
