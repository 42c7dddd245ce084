//! Admin account management.

use super::CommandError;

/// Set the admin flag on an existing account.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let result = sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1")
        .bind(email)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CommandError::UnknownAccount(email.to_owned()));
    }

    tracing::info!("Promoted {email} to admin");
    Ok(())
}
