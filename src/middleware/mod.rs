/// Actor-identity extractors.
///
/// Token validation happens upstream at the API gateway, which propagates
/// the authenticated account id in the `x-user-id` header. Handlers take
/// `UserId` where a mutation demands an authenticated actor and
/// `MaybeUserId` on reads, where identity only enables the viewer-vote
/// annotation.
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated actor id, required
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Authenticated actor id, optional
#[derive(Debug, Clone, Copy)]
pub struct MaybeUserId(pub Option<Uuid>);

fn header_user_id(req: &HttpRequest) -> Option<Result<Uuid, Error>> {
    req.headers().get(USER_ID_HEADER).map(|value| {
        value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| ErrorUnauthorized("Invalid user ID"))
    })
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(match header_user_id(req) {
            Some(Ok(id)) => Ok(UserId(id)),
            Some(Err(e)) => Err(e),
            None => Err(ErrorUnauthorized("Authentication required")),
        })
    }
}

impl FromRequest for MaybeUserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(match header_user_id(req) {
            Some(Ok(id)) => Ok(MaybeUserId(Some(id))),
            // a malformed id on a read is treated as anonymous
            Some(Err(_)) | None => Ok(MaybeUserId(None)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn user_id_requires_header() {
        let req = TestRequest::default().to_http_request();
        let result = UserId::extract(&req).await;
        assert!(result.is_err());
    }

    #[actix_web::test]
    async fn user_id_parses_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();
        let extracted = UserId::extract(&req).await.unwrap();
        assert_eq!(extracted.0, id);
    }

    #[actix_web::test]
    async fn maybe_user_id_defaults_to_anonymous() {
        let req = TestRequest::default().to_http_request();
        let extracted = MaybeUserId::extract(&req).await.unwrap();
        assert_eq!(extracted.0, None);

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        let extracted = MaybeUserId::extract(&req).await.unwrap();
        assert_eq!(extracted.0, None);
    }
}
