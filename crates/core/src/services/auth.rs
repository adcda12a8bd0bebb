//! Registration, login and password recovery.

use chrono::Utc;
use cyberguard_common::{
    AppError, AppResult, IdGenerator, Metrics, get_metrics,
    validation::{mask_tail, validate_aadhaar, validate_otp, validate_password, validate_phone},
};
use cyberguard_db::{
    entities::{
        otp_challenge::OtpPurpose,
        user::{self, UserRole},
    },
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::{
    hashing::{hash_secret, verify_secret},
    otp::OtpService,
};

/// Attempts at drawing an unused account ID before giving up.
const MAX_ID_ATTEMPTS: usize = 5;

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    otp: OtpService,
    id_gen: IdGenerator,
}

/// Input for registering an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_official_fields"))]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(custom(function = "validate_aadhaar"))]
    pub aadhaar_number: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone_number: String,

    #[validate(length(min = 1, max = 1024))]
    pub address: String,

    #[serde(default)]
    pub role: UserRole,

    #[validate(length(max = 64))]
    pub government_id: Option<String>,
}

fn validate_official_fields(input: &RegisterInput) -> Result<(), ValidationError> {
    let has_gov_id = input
        .government_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    if input.role == UserRole::Official && !has_gov_id {
        let mut err = ValidationError::new("government_id");
        err.message = Some("Government ID is required for officials".into());
        return Err(err);
    }
    Ok(())
}

/// Input for confirming an OTP.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpInput {
    pub user_id: String,

    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
}

/// Input for setting or resetting a password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordInput {
    pub user_id: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for completing a password reset.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub user_id: String,

    #[validate(custom(function = "validate_otp"))]
    pub otp: String,

    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user_id: String,
    /// Where the OTP went, all but the last four digits masked.
    pub masked_phone: String,
}

/// Logged-in account plus its bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: user::Model,
    pub token: String,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, otp: OtpService) -> Self {
        Self {
            user_repo,
            otp,
            id_gen: IdGenerator::new(),
        }
    }

    async fn unused_user_id(&self) -> AppResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.id_gen.generate_user_id();
            if self.user_repo.find_by_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "Could not allocate a user ID".to_string(),
        ))
    }

    /// Create an unverified account and send the registration OTP.
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegistrationOutcome> {
        input.validate()?;

        if self
            .user_repo
            .find_by_aadhaar(&input.aadhaar_number)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with this Aadhaar number already exists".to_string(),
            ));
        }

        let user_id = self.unused_user_id().await?;
        let government_id = match input.role {
            UserRole::Official => input.government_id.map(|id| id.trim().to_string()),
            UserRole::Citizen => None,
        };

        let model = user::ActiveModel {
            id: Set(user_id.clone()),
            name: Set(input.name.trim().to_string()),
            aadhaar_number: Set(input.aadhaar_number),
            phone_number: Set(input.phone_number.clone()),
            address: Set(input.address.trim().to_string()),
            role: Set(input.role),
            government_id: Set(government_id),
            password_hash: Set(None),
            is_verified: Set(false),
            token: Set(None),
            last_login_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let user = self.user_repo.create(model).await?;

        self.otp
            .issue(&user.id, &user.phone_number, OtpPurpose::Registration)
            .await?;

        Metrics::incr(&get_metrics().users_registered);
        tracing::info!(user_id = %user.id, role = ?user.role, "Registered account");

        Ok(RegistrationOutcome {
            user_id: user.id,
            masked_phone: mask_tail(&input.phone_number),
        })
    }

    /// Confirm the registration OTP and mark the account verified.
    pub async fn verify_registration(&self, input: VerifyOtpInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(&input.user_id).await?;
        if user.is_verified {
            return Err(AppError::Conflict("Account is already verified".to_string()));
        }

        self.otp
            .verify(&user.id, OtpPurpose::Registration, &input.otp)
            .await?;

        let mut active: user::ActiveModel = user.into();
        active.is_verified = Set(true);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Send a fresh OTP, burning the previous one. Returns the masked phone.
    pub async fn resend_otp(&self, user_id: &str, purpose: OtpPurpose) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if purpose == OtpPurpose::Registration && user.is_verified {
            return Err(AppError::Conflict("Account is already verified".to_string()));
        }

        self.otp
            .issue(&user.id, &user.phone_number, purpose)
            .await?;
        Ok(mask_tail(&user.phone_number))
    }

    /// Set the first password on a verified account and log it in.
    pub async fn set_password(&self, input: SetPasswordInput) -> AppResult<Session> {
        input.validate()?;

        let user = self.user_repo.get_by_id(&input.user_id).await?;
        if !user.is_verified {
            return Err(AppError::AccountNotVerified(user.id));
        }
        if user.password_hash.is_some() {
            return Err(AppError::Conflict("Password is already set".to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(Some(hash_secret(&input.password)?));
        let user = self.user_repo.update(active).await?;

        self.start_session(user).await
    }

    /// Log in with account ID and password.
    pub async fn login(&self, input: LoginInput) -> AppResult<Session> {
        input.validate()?;

        let metrics = get_metrics();
        let Some(user) = self.user_repo.find_by_id(input.user_id.trim()).await? else {
            metrics.record_login(false);
            return Err(AppError::InvalidCredentials);
        };

        if !user.is_verified {
            metrics.record_login(false);
            return Err(AppError::AccountNotVerified(user.id));
        }

        let Some(hash) = user.password_hash.as_deref() else {
            metrics.record_login(false);
            return Err(AppError::PasswordNotSet(user.id));
        };

        if !verify_secret(&input.password, hash)? {
            metrics.record_login(false);
            tracing::debug!(user_id = %user.id, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }

        metrics.record_login(true);
        self.start_session(user).await
    }

    async fn start_session(&self, user: user::Model) -> AppResult<Session> {
        let token = self.id_gen.generate_token();
        let user = self.user_repo.record_login(user, token.clone()).await?;
        tracing::info!(user_id = %user.id, "Session started");
        Ok(Session { user, token })
    }

    /// Send a password reset OTP. Returns the masked phone.
    pub async fn forgot_password(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id.trim()).await?;

        self.otp
            .issue(&user.id, &user.phone_number, OtpPurpose::PasswordReset)
            .await?;
        Ok(mask_tail(&user.phone_number))
    }

    /// Replace the password after confirming the reset OTP. Ends any session.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(&input.user_id).await?;
        self.otp
            .verify(&user.id, OtpPurpose::PasswordReset, &input.otp)
            .await?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(Some(hash_secret(&input.new_password)?));
        active.token = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    /// Revoke a bearer token.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.user_repo.clear_token(token).await?;
        Ok(())
    }

    /// Resolve a bearer token to its account.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::services::otp::tests::{RecordingSender, config};
    use cyberguard_db::{repositories::OtpChallengeRepository, test_utils::fixtures};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};

    fn service(db: MockDatabase) -> (AuthService, Arc<RecordingSender>) {
        let (service, sender, _) = service_with_conn(db);
        (service, sender)
    }

    fn service_with_conn(
        db: MockDatabase,
    ) -> (AuthService, Arc<RecordingSender>, Arc<DatabaseConnection>) {
        let conn = Arc::new(db.into_connection());
        let sender = Arc::new(RecordingSender::default());
        let otp = OtpService::new(OtpChallengeRepository::new(conn.clone()), sender.clone(), &config());
        (
            AuthService::new(UserRepository::new(conn.clone()), otp),
            sender,
            conn,
        )
    }

    fn consumed() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn register_input(role: UserRole, government_id: Option<&str>) -> RegisterInput {
        RegisterInput {
            name: "Asha Verma".to_string(),
            aadhaar_number: "123412341234".to_string(),
            phone_number: "9876543210".to_string(),
            address: "12 MG Road, Pune".to_string(),
            role,
            government_id: government_id.map(str::to_string),
        }
    }

    fn unverified(id: &str) -> user::Model {
        let mut user = fixtures::citizen(id);
        user.is_verified = false;
        user.token = None;
        user
    }

    #[tokio::test]
    async fn test_register_issues_otp() {
        let created = unverified("CGNEW001");
        let challenge =
            fixtures::otp_challenge("otp1", "CGNEW001", OtpPurpose::Registration, "hash");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // aadhaar lookup, id collision check, insert
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([[challenge]]);
        let (service, sender) = service(db);

        let outcome = service
            .register(register_input(UserRole::Citizen, None))
            .await
            .unwrap();

        assert_eq!(outcome.user_id, "CGNEW001");
        assert_eq!(outcome.masked_phone, "XXXXXX3210");
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_aadhaar() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::citizen("CGTEST01")]]);
        let (service, sender) = service(db);

        let result = service
            .register(register_input(UserRole::Citizen, None))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_lengths() {
        let (service, _) = service(MockDatabase::new(DatabaseBackend::Postgres));

        let mut input = register_input(UserRole::Citizen, None);
        input.aadhaar_number = "12341234123".to_string();
        assert!(matches!(
            service.register(input).await,
            Err(AppError::Validation(_))
        ));

        let mut input = register_input(UserRole::Citizen, None);
        input.phone_number = "98765".to_string();
        assert!(matches!(
            service.register(input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_official_requires_government_id() {
        let (service, _) = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .register(register_input(UserRole::Official, Some("  ")))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut user = fixtures::citizen("CGTEST01");
        user.password_hash = Some(hash_secret("secret1").unwrap());
        let mut logged_in = user.clone();
        logged_in.token = Some("fresh".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[logged_in]]);
        let (service, _) = service(db);

        let session = service
            .login(LoginInput {
                user_id: "CGTEST01".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, "CGTEST01");
        assert_eq!(session.token.len(), 32);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut user = fixtures::citizen("CGTEST01");
        user.password_hash = Some(hash_secret("secret1").unwrap());

        // Only the lookup is queued: a session write would fail the mock.
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let (service, _) = service(db);

        let result = service
            .login(LoginInput {
                user_id: "CGTEST01".to_string(),
                password: "wrong-pass".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);
        let (service, _) = service(db);

        let result = service
            .login(LoginInput {
                user_id: "CGNOBODY".to_string(),
                password: "secret1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_without_password_points_to_password_step() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::citizen("CGTEST01")]]);
        let (service, _) = service(db);

        let result = service
            .login(LoginInput {
                user_id: "CGTEST01".to_string(),
                password: "anything".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::PasswordNotSet(id)) if id == "CGTEST01"));
    }

    #[tokio::test]
    async fn test_login_unverified() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[unverified("CGTEST01")]]);
        let (service, _) = service(db);

        let result = service
            .login(LoginInput {
                user_id: "CGTEST01".to_string(),
                password: "anything".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::AccountNotVerified(_))));
    }

    #[tokio::test]
    async fn test_set_password_requires_verification() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[unverified("CGTEST01")]]);
        let (service, _) = service(db);

        let result = service
            .set_password(SetPasswordInput {
                user_id: "CGTEST01".to_string(),
                password: "secret1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::AccountNotVerified(_))));
    }

    #[tokio::test]
    async fn test_set_password_only_once() {
        let mut user = fixtures::citizen("CGTEST01");
        user.password_hash = Some("existing".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let (service, _) = service(db);

        let result = service
            .set_password(SetPasswordInput {
                user_id: "CGTEST01".to_string(),
                password: "secret1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_password_logs_in() {
        let user = fixtures::citizen("CGTEST01");
        let mut with_password = user.clone();
        with_password.password_hash = Some("hash".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[with_password.clone()]])
            .append_query_results([[with_password]]);
        let (service, _) = service(db);

        let session = service
            .set_password(SetPasswordInput {
                user_id: "CGTEST01".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, "CGTEST01");
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);
        let (service, _) = service(db);

        let result = service.forgot_password("CGNOBODY").await;

        assert!(matches!(&result, Err(AppError::UserNotFound(_))));
        assert_eq!(result.unwrap_err().to_string(), "User ID not found");
    }

    #[tokio::test]
    async fn test_verify_registration_marks_verified() {
        let user = unverified("CGTEST01");
        let challenge = fixtures::otp_challenge(
            "otp1",
            "CGTEST01",
            OtpPurpose::Registration,
            &hash_secret("482913").unwrap(),
        );
        let mut verified = user.clone();
        verified.is_verified = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[challenge]])
            .append_exec_results([consumed()])
            .append_query_results([[verified]]);
        let (service, _) = service(db);

        let user = service
            .verify_registration(VerifyOtpInput {
                user_id: "CGTEST01".to_string(),
                otp: "482913".to_string(),
            })
            .await
            .unwrap();

        assert!(user.is_verified);
    }

    #[tokio::test]
    async fn test_verify_registration_already_verified() {
        // Only the account lookup is queued: an OTP lookup would fail the mock.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::citizen("CGTEST01")]]);
        let (service, _) = service(db);

        let result = service
            .verify_registration(VerifyOtpInput {
                user_id: "CGTEST01".to_string(),
                otp: "482913".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_verify_registration_wrong_code() {
        let challenge = fixtures::otp_challenge(
            "otp1",
            "CGTEST01",
            OtpPurpose::Registration,
            &hash_secret("482913").unwrap(),
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[unverified("CGTEST01")]])
            .append_query_results([[challenge]])
            .append_exec_results([consumed()]);
        let (service, _) = service(db);

        let result = service
            .verify_registration(VerifyOtpInput {
                user_id: "CGTEST01".to_string(),
                otp: "000000".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidOtp)));
    }

    #[tokio::test]
    async fn test_resend_otp_for_unverified_account() {
        let challenge =
            fixtures::otp_challenge("otp2", "CGTEST01", OtpPurpose::Registration, "hash");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[unverified("CGTEST01")]])
            .append_exec_results([consumed()])
            .append_query_results([[challenge]]);
        let (service, sender) = service(db);

        let masked = service
            .resend_otp("CGTEST01", OtpPurpose::Registration)
            .await
            .unwrap();

        assert_eq!(masked, "XXXXXX3210");
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, OtpPurpose::Registration);
    }

    #[tokio::test]
    async fn test_resend_registration_otp_after_verification() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::citizen("CGTEST01")]]);
        let (service, sender) = service(db);

        let result = service
            .resend_otp("CGTEST01", OtpPurpose::Registration)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_revokes_token() {
        let mut user = fixtures::citizen("CGTEST01");
        user.password_hash = Some(hash_secret("old-secret").unwrap());
        assert!(user.token.is_some());
        let challenge = fixtures::otp_challenge(
            "otp1",
            "CGTEST01",
            OtpPurpose::PasswordReset,
            &hash_secret("482913").unwrap(),
        );
        let mut reset = user.clone();
        reset.token = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[challenge]])
            .append_exec_results([consumed()])
            .append_query_results([[reset]]);
        let (service, _, conn) = service_with_conn(db);

        service
            .reset_password(ResetPasswordInput {
                user_id: "CGTEST01".to_string(),
                otp: "482913".to_string(),
                new_password: "new-secret".to_string(),
            })
            .await
            .unwrap();
        drop(service);

        let log = Arc::try_unwrap(conn).ok().unwrap().into_transaction_log();
        let update = log
            .iter()
            .flat_map(|txn| txn.statements())
            .find(|stmt| stmt.sql.starts_with(r#"UPDATE "user""#))
            .unwrap();
        assert!(update.sql.contains(r#""token" = "#), "{}", update.sql);
        assert!(update.sql.contains(r#""password_hash" = "#), "{}", update.sql);
        let values = update.values.as_ref().unwrap();
        assert!(values.0.contains(&Value::String(None)));
    }

    #[tokio::test]
    async fn test_reset_password_wrong_code_keeps_password() {
        let challenge = fixtures::otp_challenge(
            "otp1",
            "CGTEST01",
            OtpPurpose::PasswordReset,
            &hash_secret("482913").unwrap(),
        );
        // No result queued for an account update.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::citizen("CGTEST01")]])
            .append_query_results([[challenge]])
            .append_exec_results([consumed()]);
        let (service, _) = service(db);

        let result = service
            .reset_password(ResetPasswordInput {
                user_id: "CGTEST01".to_string(),
                otp: "111111".to_string(),
                new_password: "new-secret".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidOtp)));
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);
        let (service, _) = service(db);

        let result = service.authenticate_by_token("stale").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
