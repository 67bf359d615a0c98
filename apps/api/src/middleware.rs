use std::str::FromStr;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use enermina_core::{AppError, UserIdentity};
use enermina_domain::{Subject, UserRole};
use subtle::ConstantTimeEq;

use crate::error::ApiResult;
use crate::state::AppState;

/// Shared secret proving a request passed the identity gateway.
pub const GATEWAY_SECRET_HEADER: &str = "x-enermina-gateway-secret";
/// Identity-provider subject claim of the caller.
pub const SUBJECT_HEADER: &str = "x-enermina-subject";
/// Comma-separated group memberships of the caller.
pub const GROUPS_HEADER: &str = "x-enermina-groups";
/// Email claim of the caller.
pub const EMAIL_HEADER: &str = "x-enermina-email";

/// Resolves the caller into a [`Subject`] request extension.
///
/// Requests without a subject header are guests. Asserted identities are
/// only trusted when they carry the gateway secret.
pub async fn resolve_subject(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let subject = subject_from_headers(request.headers(), &state.gateway_shared_secret)?;
    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}

/// Rejects calls that do not carry the gateway secret.
pub async fn require_gateway_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_secret(request.headers(), &state.gateway_shared_secret)?;
    Ok(next.run(request).await)
}

fn subject_from_headers(headers: &HeaderMap, shared_secret: &str) -> Result<Subject, AppError> {
    let Some(subject) = header_text(headers, SUBJECT_HEADER) else {
        return Ok(Subject::Guest);
    };
    require_secret(headers, shared_secret)?;

    let groups = header_text(headers, GROUPS_HEADER)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|group| !group.is_empty())
                .map(|group| {
                    UserRole::from_str(group).map_err(|_| {
                        AppError::Unauthenticated(format!("unknown group '{group}' asserted"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();
    let email = header_text(headers, EMAIL_HEADER).map(str::to_owned);

    Ok(Subject::authenticated(
        UserIdentity::new(subject, email),
        groups,
    ))
}

fn require_secret(headers: &HeaderMap, shared_secret: &str) -> Result<(), AppError> {
    let presented = header_text(headers, GATEWAY_SECRET_HEADER).unwrap_or_default();
    if secrets_match(presented.as_bytes(), shared_secret.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Unauthenticated(
            "gateway credentials missing or invalid".to_owned(),
        ))
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Compares the presented secret in constant time.
///
/// A length mismatch still runs a comparison so timing does not reveal the
/// expected length.
fn secrets_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }

    presented.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use enermina_core::AppError;
    use enermina_domain::{Subject, UserRole};

    use super::{
        EMAIL_HEADER, GATEWAY_SECRET_HEADER, GROUPS_HEADER, SUBJECT_HEADER, secrets_match,
        subject_from_headers,
    };

    const SECRET: &str = "gateway-secret";

    fn headers(values: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in values {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn missing_subject_means_guest() {
        let subject = subject_from_headers(&headers(&[]), SECRET);
        assert!(matches!(subject, Ok(Subject::Guest)));
    }

    #[test]
    fn asserted_identities_need_the_gateway_secret() {
        let subject = subject_from_headers(&headers(&[(SUBJECT_HEADER, "user-1")]), SECRET);
        assert!(matches!(subject, Err(AppError::Unauthenticated(_))));

        let subject = subject_from_headers(
            &headers(&[(SUBJECT_HEADER, "user-1"), (GATEWAY_SECRET_HEADER, "wrong")]),
            SECRET,
        );
        assert!(matches!(subject, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn groups_and_email_are_carried_into_the_subject() {
        let subject = subject_from_headers(
            &headers(&[
                (SUBJECT_HEADER, "user-1"),
                (GATEWAY_SECRET_HEADER, SECRET),
                (GROUPS_HEADER, "ADMIN, SUBSCRIBER"),
                (EMAIL_HEADER, "admin@enermina.org"),
            ]),
            SECRET,
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(subject.identity_id(), Some("user-1"));
        assert!(subject.in_group(UserRole::Admin));
        assert!(subject.in_group(UserRole::Subscriber));
        assert!(!subject.in_group(UserRole::Professional));
    }

    #[test]
    fn unknown_groups_are_refused() {
        let subject = subject_from_headers(
            &headers(&[
                (SUBJECT_HEADER, "user-1"),
                (GATEWAY_SECRET_HEADER, SECRET),
                (GROUPS_HEADER, "SUPERUSER"),
            ]),
            SECRET,
        );

        assert!(matches!(subject, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn secret_comparison_checks_length_and_content() {
        assert!(secrets_match(b"abc", b"abc"));
        assert!(!secrets_match(b"abc", b"abd"));
        assert!(!secrets_match(b"ab", b"abc"));
        assert!(!secrets_match(b"", b"abc"));
        assert!(!secrets_match(SECRET.as_bytes(), b"gateway-secreT"));
        assert!(secrets_match(SECRET.as_bytes(), SECRET.as_bytes()));
    }
}
