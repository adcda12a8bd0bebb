//! One-time password issue and verification.
//!
//! Codes are six random digits. Only an argon2 hash is stored. A challenge
//! expires after the configured TTL, verifies at most once, and is burned
//! after the configured number of wrong guesses. Issuing a new code for the
//! same user and purpose burns any open one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use cyberguard_common::{
    AppError, AppResult, IdGenerator, Metrics, config::AuthConfig, get_metrics,
    validation::{OTP_LEN, is_valid_otp, mask_tail},
};
use cyberguard_db::{
    entities::otp_challenge::{self, OtpPurpose},
    repositories::OtpChallengeRepository,
};
use rand::Rng;
use sea_orm::Set;

use super::hashing::{hash_secret, verify_secret};

/// Delivers a code to the account holder.
#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Send `code` to `phone_number`.
    async fn send(&self, phone_number: &str, code: &str, purpose: OtpPurpose) -> AppResult<()>;
}

/// Shared handle to the configured sender.
pub type OtpSenderService = Arc<dyn OtpSender>;

/// Writes codes to the log. Used when no SMS gateway is configured.
#[derive(Clone, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone_number: &str, code: &str, purpose: OtpPurpose) -> AppResult<()> {
        tracing::info!(
            phone = %mask_tail(phone_number),
            ?purpose,
            code,
            "OTP issued (no SMS gateway configured)"
        );
        Ok(())
    }
}

/// OTP service.
#[derive(Clone)]
pub struct OtpService {
    otp_repo: OtpChallengeRepository,
    sender: OtpSenderService,
    ttl: Duration,
    max_attempts: i32,
    fixed_code: Option<String>,
    id_gen: IdGenerator,
}

impl OtpService {
    /// Create a new OTP service.
    #[must_use]
    pub fn new(otp_repo: OtpChallengeRepository, sender: OtpSenderService, config: &AuthConfig) -> Self {
        Self {
            otp_repo,
            sender,
            ttl: Duration::seconds(config.otp_ttl_secs),
            max_attempts: config.otp_max_attempts.max(1),
            fixed_code: config.otp_fixed_code.clone().filter(|c| is_valid_otp(c)),
            id_gen: IdGenerator::new(),
        }
    }

    fn generate_code(&self) -> String {
        if let Some(code) = &self.fixed_code {
            return code.clone();
        }
        let mut rng = rand::thread_rng();
        (0..OTP_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Issue a fresh code, burning any open challenge for the same purpose.
    pub async fn issue(
        &self,
        user_id: &str,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> AppResult<()> {
        self.otp_repo.consume_all(user_id, purpose).await?;

        let code = self.generate_code();
        let now = Utc::now();
        let model = otp_challenge::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            purpose: Set(purpose),
            code_hash: Set(hash_secret(&code)?),
            attempts: Set(0),
            expires_at: Set((now + self.ttl).into()),
            consumed_at: Set(None),
            created_at: Set(now.into()),
        };
        self.otp_repo.create(model).await?;

        Metrics::incr(&get_metrics().otp_issued);
        self.sender.send(phone_number, &code, purpose).await
    }

    /// Check a code against the open challenge and consume it on success.
    pub async fn verify(&self, user_id: &str, purpose: OtpPurpose, code: &str) -> AppResult<()> {
        if !is_valid_otp(code) {
            return Err(AppError::InvalidOtp);
        }

        let challenge = self
            .otp_repo
            .find_active(user_id, purpose)
            .await?
            .ok_or(AppError::OtpExpired)?;

        if challenge.expires_at < Utc::now() || challenge.attempts >= self.max_attempts {
            self.otp_repo.consume(&challenge.id).await?;
            return Err(AppError::OtpExpired);
        }

        if verify_secret(code, &challenge.code_hash)? {
            // A concurrent verify may have used the same code first.
            if self.otp_repo.consume(&challenge.id).await? {
                return Ok(());
            }
            return Err(AppError::OtpExpired);
        }

        let attempts = challenge.attempts + 1;
        self.otp_repo
            .record_failure(&challenge.id, attempts >= self.max_attempts)
            .await?;

        Metrics::incr(&get_metrics().otp_failed);
        tracing::debug!(user_id, ?purpose, attempts, "OTP mismatch");
        Err(AppError::InvalidOtp)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cyberguard_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Mutex;

    /// Captures every code it is asked to send.
    #[derive(Default)]
    pub(crate) struct RecordingSender {
        pub sent: Mutex<Vec<(String, String, OtpPurpose)>>,
    }

    #[async_trait]
    impl OtpSender for RecordingSender {
        async fn send(&self, phone_number: &str, code: &str, purpose: OtpPurpose) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((phone_number.to_string(), code.to_string(), purpose));
            Ok(())
        }
    }

    pub(crate) fn config() -> AuthConfig {
        AuthConfig {
            otp_ttl_secs: 300,
            otp_max_attempts: 3,
            otp_fixed_code: None,
        }
    }

    fn service(db: MockDatabase, sender: Arc<RecordingSender>) -> OtpService {
        OtpService::new(
            OtpChallengeRepository::new(Arc::new(db.into_connection())),
            sender,
            &config(),
        )
    }

    #[tokio::test]
    async fn test_issue_sends_six_digit_code() {
        let challenge =
            fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, "hash");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([[challenge]]);
        let sender = Arc::new(RecordingSender::default());

        service(db, sender.clone())
            .issue("CGTEST01", "9876543210", OtpPurpose::Registration)
            .await
            .unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "9876543210");
        assert!(is_valid_otp(&sent[0].1));
    }

    #[tokio::test]
    async fn test_fixed_code_is_used() {
        let challenge =
            fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::PasswordReset, "hash");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[challenge]]);
        let sender = Arc::new(RecordingSender::default());
        let mut config = config();
        config.otp_fixed_code = Some("123456".to_string());

        let service = OtpService::new(
            OtpChallengeRepository::new(Arc::new(db.into_connection())),
            sender.clone(),
            &config,
        );
        service
            .issue("CGTEST01", "9876543210", OtpPurpose::PasswordReset)
            .await
            .unwrap();

        assert_eq!(sender.sent.lock().unwrap()[0].1, "123456");
    }

    #[tokio::test]
    async fn test_malformed_code_rejected_before_lookup() {
        // No query results queued: any database access would fail the test.
        let db = MockDatabase::new(DatabaseBackend::Postgres);
        let service = service(db, Arc::new(RecordingSender::default()));

        for code in ["12345", "1234567", "abcdef", ""] {
            let result = service
                .verify("CGTEST01", OtpPurpose::Registration, code)
                .await;
            assert!(matches!(result, Err(AppError::InvalidOtp)), "{code}");
        }
    }

    #[tokio::test]
    async fn test_verify_correct_code_consumes() {
        let hash = hash_secret("482913").unwrap();
        let challenge = fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, &hash);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[challenge]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let result = service(db, Arc::new(RecordingSender::default()))
            .verify("CGTEST01", OtpPurpose::Registration, "482913")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_correct_code_already_used_by_concurrent_verify() {
        let hash = hash_secret("482913").unwrap();
        let challenge = fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, &hash);

        // Both requests read the open challenge; the second consume matches no row.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[challenge.clone()], [challenge]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ]);
        let service = service(db, Arc::new(RecordingSender::default()));

        let first = service
            .verify("CGTEST01", OtpPurpose::Registration, "482913")
            .await;
        let second = service
            .verify("CGTEST01", OtpPurpose::Registration, "482913")
            .await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_verify_wrong_code_counts_attempt() {
        let hash = hash_secret("482913").unwrap();
        let challenge = fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, &hash);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[challenge]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let result = service(db, Arc::new(RecordingSender::default()))
            .verify("CGTEST01", OtpPurpose::Registration, "000000")
            .await;

        assert!(matches!(result, Err(AppError::InvalidOtp)));
    }

    #[tokio::test]
    async fn test_expired_challenge() {
        let hash = hash_secret("482913").unwrap();
        let mut challenge =
            fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, &hash);
        challenge.expires_at = (Utc::now() - Duration::seconds(1)).into();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[challenge]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let result = service(db, Arc::new(RecordingSender::default()))
            .verify("CGTEST01", OtpPurpose::Registration, "482913")
            .await;

        assert!(matches!(result, Err(AppError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_locked_after_max_attempts() {
        let hash = hash_secret("482913").unwrap();
        let mut challenge =
            fixtures::otp_challenge("otp1", "CGTEST01", OtpPurpose::Registration, &hash);
        challenge.attempts = 3;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[challenge]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        // Even the right code fails once the challenge is used up.
        let result = service(db, Arc::new(RecordingSender::default()))
            .verify("CGTEST01", OtpPurpose::Registration, "482913")
            .await;

        assert!(matches!(result, Err(AppError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_no_open_challenge() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<otp_challenge::Model>::new()]);

        let result = service(db, Arc::new(RecordingSender::default()))
            .verify("CGTEST01", OtpPurpose::PasswordReset, "482913")
            .await;

        assert!(matches!(result, Err(AppError::OtpExpired)));
    }
}
