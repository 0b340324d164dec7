/// Credential primitives used by the models
///
/// # Modules
///
/// - [`password`]: Argon2id hashing for `users.password`
/// - [`token`]: random session and verification tokens
///
/// # Example
///
/// ```
/// use taskboard_db::auth::password::{hash_password, verify_password};
/// use taskboard_db::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = generate_token();
/// assert_eq!(token.len(), 64);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod token;
