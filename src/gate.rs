use crate::{
    auth::TokenDecoder,
    models::{Decision, RedirectReason, RedirectTarget, RouteMeta},
};

/// authorize
///
/// The route authorization gate. Decides whether a navigation to a route carrying
/// `meta` may proceed for the holder of `credential`.
///
/// 1. Routes that do not require authentication are always allowed; the credential
///    is not consulted.
/// 2. A protected route with no credential redirects to login. An empty credential
///    is no credential.
/// 3. A credential that fails to decode redirects to login and is marked for purging.
/// 4. A role-restricted route whose role differs from the claim's sends admins to the
///    admin dashboard and users to the user dashboard. A role outside the known set
///    redirects to login and is marked for purging.
/// 5. Everything else is allowed.
///
/// The function is pure: purging is expressed through `Decision::purges_credential`
/// and performed by the caller.
pub fn authorize(meta: &RouteMeta, credential: Option<&str>, decoder: &TokenDecoder) -> Decision {
    if !meta.requires_auth {
        return Decision::Allow;
    }

    let Some(token) = credential.filter(|token| !token.is_empty()) else {
        return Decision::redirect(RedirectTarget::Login, RedirectReason::Unauthenticated);
    };

    let claim = match decoder.decode(token) {
        Ok(claim) => claim,
        Err(e) => {
            tracing::warn!(error = %e, "Stored credential could not be decoded");
            return Decision::redirect(RedirectTarget::Login, RedirectReason::InvalidCredential);
        }
    };

    let Some(required) = meta.role else {
        return Decision::Allow;
    };

    match claim.known_role() {
        Some(role) if role == required => Decision::Allow,
        Some(role) => {
            tracing::debug!(%role, %required, "Role does not match route requirement");
            Decision::redirect(role.home(), RedirectReason::RoleMismatch)
        }
        None => {
            tracing::warn!(role = %claim.role, "Credential carries an unrecognized role");
            Decision::redirect(RedirectTarget::Login, RedirectReason::UnrecognizedRole)
        }
    }
}
