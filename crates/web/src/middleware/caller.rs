use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use storage::models::{Caller, Role};
use uuid::Uuid;

use crate::error::WebError;

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, WebError> {
    parts
        .headers
        .get(name)
        .ok_or(WebError::Unauthorized)?
        .to_str()
        .map_err(|_| WebError::BadRequest(format!("{} header is not valid text", name)))
}

fn caller_from_parts(parts: &Parts) -> Result<Caller, WebError> {
    let id = header_value(parts, CALLER_ID_HEADER)?
        .parse::<Uuid>()
        .map_err(|_| WebError::BadRequest(format!("{} must be a UUID", CALLER_ID_HEADER)))?;
    let role = header_value(parts, CALLER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(WebError::BadRequest)?;

    Ok(Caller::new(id, role))
}

/// A caller allowed to grade (faculty or admin).
pub struct FacultyCaller(pub Caller);

/// A student acting on their own marks.
pub struct StudentCaller(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for FacultyCaller
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from_parts(parts)?;
        if caller.can_grade() {
            Ok(Self(caller))
        } else {
            Err(WebError::Forbidden("faculty access required".to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StudentCaller
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from_parts(parts)?;
        if caller.role == Role::Student {
            Ok(Self(caller))
        } else {
            Err(WebError::Forbidden("student access required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_caller_from_headers() {
        let id = Uuid::new_v4();
        let id_text = id.to_string();
        let parts = request_parts(&[
            (CALLER_ID_HEADER, id_text.as_str()),
            (CALLER_ROLE_HEADER, "student"),
        ]);

        let caller = caller_from_parts(&parts).unwrap();
        assert_eq!(caller, Caller::new(id, Role::Student));
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let parts = request_parts(&[(CALLER_ROLE_HEADER, "faculty")]);
        assert!(matches!(
            caller_from_parts(&parts),
            Err(WebError::Unauthorized)
        ));
    }

    #[test]
    fn test_malformed_identity_is_bad_request() {
        let parts = request_parts(&[
            (CALLER_ID_HEADER, "not-a-uuid"),
            (CALLER_ROLE_HEADER, "faculty"),
        ]);
        assert!(matches!(
            caller_from_parts(&parts),
            Err(WebError::BadRequest(_))
        ));

        let id = Uuid::new_v4().to_string();
        let parts = request_parts(&[(CALLER_ID_HEADER, id.as_str()), (CALLER_ROLE_HEADER, "dean")]);
        assert!(matches!(
            caller_from_parts(&parts),
            Err(WebError::BadRequest(_))
        ));
    }
}
