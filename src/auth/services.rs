use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::SignUpRequest,
    error::SignupError,
    password::hash_password,
    repo::{AccountStore, SignupUnit, StoreError},
    repo_types::{Account, NewAccount, NewUser, User},
    validation::validate_signup,
};

/// Rows written by a successful signup.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub user: User,
    pub account: Account,
}

pub async fn email_exists(store: &dyn AccountStore, email: &str) -> Result<bool, StoreError> {
    Ok(store.find_user_by_email(email).await?.is_some())
}

/// Validates the request, then creates the user and its email account in one transaction.
///
/// The pre-check is only a fast path: a concurrent signup that wins the race is
/// caught by the unique constraint on `users.email` and reported the same way.
#[instrument(skip_all, fields(email = %req.email))]
pub async fn sign_up(
    store: &dyn AccountStore,
    req: SignUpRequest,
) -> Result<SignupOutcome, SignupError> {
    validate_signup(&req)?;

    if req.password != req.confirm_password {
        return Err(SignupError::PasswordMismatch);
    }

    if email_exists(store, &req.email).await? {
        warn!("email already registered");
        return Err(SignupError::EmailTaken);
    }

    let hash = hash_password(&req.password).map_err(|e| SignupError::Internal(e.to_string()))?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        first_name: req.first_name,
        last_name: req.last_name,
        user_name: req.user_name,
        email: req.email,
    };
    let new_account = NewAccount::email(new_user.id, hash);

    let mut unit = store.begin().await?;
    match insert_rows(unit.as_mut(), &new_user, &new_account).await {
        Ok((user, account)) => {
            unit.commit().await?;
            info!(user_id = %user.id, account_id = %account.id, "user signed up");
            Ok(SignupOutcome { user, account })
        }
        Err(e) => {
            if let Err(rb) = unit.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e.into())
        }
    }
}

async fn insert_rows(
    unit: &mut dyn SignupUnit,
    user: &NewUser,
    account: &NewAccount,
) -> Result<(User, Account), StoreError> {
    let user = unit.insert_user(user).await?;
    debug!(user_id = %user.id, "user row inserted");
    let account = unit.insert_account(account).await?;
    Ok((user, account))
}
