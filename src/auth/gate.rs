//! Elevated-privilege gate for admin-only routes.

use crate::auth::session::{Identity, SessionContext};
use crate::auth::AuthError;

/// Require an elevated identity on the context.
///
/// `Unauthenticated` when no identity is attached, `InsufficientPrivilege`
/// when the identity is standard. The context is never modified.
pub fn require_elevated(ctx: &SessionContext) -> Result<&Identity, AuthError> {
    match &ctx.identity {
        None => Err(AuthError::Unauthenticated),
        Some(identity) if identity.is_elevated() => Ok(identity),
        Some(_) => Err(AuthError::InsufficientPrivilege),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn ctx(role: Role) -> SessionContext {
        SessionContext::authenticated(Identity {
            subject: "someone".into(),
            role,
            issued_at: 0,
        })
    }

    #[test]
    fn test_elevated_passes() {
        let ctx = ctx(Role::Elevated);
        assert_eq!(require_elevated(&ctx).unwrap().subject, "someone");
    }

    #[test]
    fn test_standard_rejected() {
        assert_eq!(
            require_elevated(&ctx(Role::Standard)).unwrap_err(),
            AuthError::InsufficientPrivilege
        );
    }

    #[test]
    fn test_anonymous_rejected() {
        assert_eq!(
            require_elevated(&SessionContext::anonymous()).unwrap_err(),
            AuthError::Unauthenticated
        );
    }
}
