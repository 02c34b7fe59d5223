//! Principal extraction.
//!
//! The portal's session layer terminates authentication upstream and
//! forwards the resolved member as headers; this extractor trusts them
//! verbatim, exactly like the service layer trusts its `Principal`.

use actix_web::error::ErrorUnauthorized;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use mp_service::Principal;
use std::future::{ready, Ready};
use uuid::Uuid;

pub const MEMBER_ID_HEADER: &str = "X-Member-Id";
pub const MEMBER_ADMIN_HEADER: &str = "X-Member-Admin";

/// Rejects the request with 401 when no member identity is present.
pub struct RequirePrincipal(pub Principal);

impl FromRequest for RequirePrincipal {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(MEMBER_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        let admin = req
            .headers()
            .get(MEMBER_ADMIN_HEADER)
            .and_then(|v| v.to_str().ok());

        ready(
            resolve_principal(id, admin)
                .map(RequirePrincipal)
                .ok_or_else(|| ErrorUnauthorized("member credentials required")),
        )
    }
}

fn resolve_principal(id: Option<&str>, admin: Option<&str>) -> Option<Principal> {
    let id = Uuid::parse_str(id?).ok()?;
    let is_admin = admin
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    Some(Principal { id, is_admin })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_member_and_admin_flags() {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let p = resolve_principal(Some(&id_str), None).unwrap();
        assert_eq!(p.id, id);
        assert!(!p.is_admin);

        assert!(resolve_principal(Some(&id_str), Some("1")).unwrap().is_admin);
        assert!(resolve_principal(Some(&id_str), Some("true")).unwrap().is_admin);
        assert!(!resolve_principal(Some(&id_str), Some("no")).unwrap().is_admin);
    }

    #[test]
    fn missing_or_malformed_id_is_rejected() {
        assert!(resolve_principal(None, None).is_none());
        assert!(resolve_principal(Some("not-a-uuid"), Some("1")).is_none());
    }
}
