use super::*;
use actix_web::FromRequest;
use actix_web::HttpMessage;
use actix_web::HttpRequest;
use actix_web::body::EitherBody;
use actix_web::dev::Payload;
use actix_web::dev::Service;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::dev::Transform;
use actix_web::dev::forward_ready;
use actix_web::http::header;
use actix_web::web;
use march_core::ID;
use std::future::Future;
use std::future::Ready;
use std::future::ready;
use std::pin::Pin;
use std::rc::Rc;

type Boxed<R> = Pin<Box<dyn Future<Output = Result<R, actix_web::Error>>>>;

/// Authentication gate. Verifies the bearer token and attaches its
/// [`Claims`] to the request extensions, or short-circuits with 401.
pub struct Authenticate {
    crypto: web::Data<Crypto>,
}

impl Authenticate {
    pub fn new(crypto: web::Data<Crypto>) -> Self {
        Self { crypto }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuthenticateService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateService {
            service,
            crypto: self.crypto.clone(),
        }))
    }
}

pub struct AuthenticateService<S> {
    service: S,
    crypto: web::Data<Crypto>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Boxed<Self::Response>;
    forward_ready!(service);
    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = gate::authenticate(
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok()),
            &self.crypto,
        );
        match verdict {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let future = self.service.call(req);
                Box::pin(async move { future.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(rejection) => {
                let response = req.error_response(rejection).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Authorization gate bound to a fixed role set at route registration.
/// Must sit inside [`Authenticate`]; without attached claims it answers 401.
pub struct Authorize {
    roles: Rc<[Role]>,
}

impl Authorize {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuthorizeService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizeService {
            service,
            roles: self.roles.clone(),
        }))
    }
}

pub struct AuthorizeService<S> {
    service: S,
    roles: Rc<[Role]>,
}

impl<S, B> Service<ServiceRequest> for AuthorizeService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Boxed<Self::Response>;
    forward_ready!(service);
    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = gate::authorize(req.extensions().get::<Claims>(), &self.roles);
        match verdict {
            Ok(()) => {
                let future = self.service.call(req);
                Box::pin(async move { future.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(rejection) => {
                let response = req.error_response(rejection).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Extractor for the claims attached by [`Authenticate`].
/// Fails closed with 401 when the gate did not run.
pub struct Auth(pub Claims);

impl Auth {
    pub fn claims(&self) -> &Claims {
        &self.0
    }
    pub fn user(&self) -> ID<Member> {
        self.0.user()
    }
}

impl FromRequest for Auth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Claims>()
                .cloned()
                .map(Auth)
                .ok_or_else(|| Rejection::Unauthenticated.into()),
        )
    }
}
