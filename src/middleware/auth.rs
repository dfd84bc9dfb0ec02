use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,     // subject (email)
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Verifies the bearer token and stores its claims in request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            return Box::pin(ready(Err(ErrorUnauthorized("No authorization header"))));
        };

        let Some(config) = req.app_data::<web::Data<AppConfig>>() else {
            error!("AppConfig is not registered as app data");
            return Box::pin(ready(Err(ErrorInternalServerError("Server misconfigured"))));
        };
        let secret = config.jwt_secret.clone();

        match decode_claims(&token, &secret) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(err) => {
                debug!("Rejected token: {:?}", err);
                Box::pin(ready(Err(ErrorUnauthorized("Invalid token"))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrmConfig;
    use actix_web::{http::StatusCode, test, App, HttpResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "ada@example.com".to_string(),
            exp: now + 600,
            iat: now,
            user_id: "user-1".to_string(),
            role: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn config(secret: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "estimator_test".to_string(),
            jwt_secret: secret.to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            history_capacity: 10,
            crm: CrmConfig {
                api_url: None,
                api_key: None,
                estimate_field_key: "estimate_link".to_string(),
            },
        }
    }

    async fn status_for(config: Option<AppConfig>, secret: &str) -> StatusCode {
        let mut app = App::new();
        if let Some(config) = config {
            app = app.app_data(web::Data::new(config));
        }
        let app = test::init_service(app.service(
            web::scope("/private")
                .wrap(AuthMiddleware)
                .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
        ))
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header(("Authorization", format!("Bearer {}", token(secret))))
            .to_request();
        match test::try_call_service(&app, req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        }
    }

    #[actix_rt::test]
    async fn test_secret_comes_from_app_config() {
        assert_eq!(status_for(Some(config("s3cret")), "s3cret").await, StatusCode::OK);
        assert_eq!(
            status_for(Some(config("s3cret")), "default_secret").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_rt::test]
    async fn test_missing_app_config_is_rejected() {
        assert_eq!(
            status_for(None, "default_secret").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
