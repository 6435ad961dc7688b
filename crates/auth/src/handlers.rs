use super::*;
use actix_web::HttpResponse;
use actix_web::web;
use march_core::ID;
use march_core::Unique;

/// Argon2 runs on the blocking pool, off the worker's event loop.
async fn hash(codec: web::Data<Codec>, password: String) -> Result<String, ApiError> {
    Ok(web::block(move || codec.hash(&password))
        .await
        .map_err(|_| HashingFailure)??)
}

async fn verify(codec: web::Data<Codec>, password: String, hashword: String) -> Result<bool, ApiError> {
    Ok(web::block(move || codec.verify(&password, &hashword))
        .await
        .map_err(|_| HashingFailure)?)
}

async fn decoy(codec: web::Data<Codec>, password: String) -> Result<bool, ApiError> {
    Ok(web::block(move || codec.decoy(&password))
        .await
        .map_err(|_| HashingFailure)?)
}

fn member_id(path: web::Path<String>) -> Result<ID<Member>, ApiError> {
    path.parse()
        .map_err(|_| ApiError::BadRequest("invalid user id".to_string()))
}

fn email(email: &str) -> Result<(), ApiError> {
    match email.is_empty() || email.contains('@') {
        true => Ok(()),
        false => Err(ApiError::BadRequest("invalid email".to_string())),
    }
}

pub async fn register<R: Directory + 'static>(
    store: web::Data<R>,
    codec: web::Data<Codec>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let RegisterRequest {
        username,
        password,
        full_name,
        email: address,
    } = req.into_inner();
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }
    email(&address)?;
    policy::validate(&password)?;
    let hashword = hash(codec, password).await?;
    let member = Member::new(username, full_name, address, Role::General);
    store.create(&member, &hashword).await?;
    log::info!("registered {}", member.username());
    Ok(HttpResponse::Created().json(member))
}

pub async fn login<R: Directory + 'static>(
    store: web::Data<R>,
    codec: web::Data<Codec>,
    tokens: web::Data<Crypto>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = req.into_inner();
    // unknown usernames pay for one verification too
    let Some((member, hashword)) = store.lookup(username.trim()).await? else {
        decoy(codec, password).await?;
        return Err(ApiError::Credentials);
    };
    if !verify(codec, password, hashword).await? {
        log::info!("failed sign in for {}", member.username());
        return Err(ApiError::Credentials);
    }
    let token = tokens.issue(member.id(), member.username(), member.role())?;
    log::info!("{} signed in", member.username());
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub async fn me<R: Directory + 'static>(
    store: web::Data<R>,
    auth: Auth,
) -> Result<HttpResponse, ApiError> {
    let (member, _) = store.find(auth.user()).await?.ok_or(StoreError::NotFound)?;
    Ok(HttpResponse::Ok().json(member))
}

/// Self-service credential change; the current password must verify.
pub async fn change_password<R: Directory + 'static>(
    store: web::Data<R>,
    codec: web::Data<Codec>,
    auth: Auth,
    req: web::Json<PasswordChange>,
) -> Result<HttpResponse, ApiError> {
    let PasswordChange {
        current_password,
        new_password,
    } = req.into_inner();
    let (mut member, hashword) = store.find(auth.user()).await?.ok_or(StoreError::NotFound)?;
    if !verify(codec.clone(), current_password, hashword).await? {
        return Err(ApiError::BadRequest("current password is incorrect".to_string()));
    }
    policy::validate(&new_password)?;
    let hashword = hash(codec, new_password).await?;
    member.touch();
    store.update(&member, Some(&hashword)).await?;
    log::info!("{} changed password", member.username());
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list<R: Directory + 'static>(store: web::Data<R>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list().await?))
}

pub async fn fetch<R: Directory + 'static>(
    store: web::Data<R>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (member, _) = store
        .find(member_id(path)?)
        .await?
        .ok_or(StoreError::NotFound)?;
    Ok(HttpResponse::Ok().json(member))
}

/// Administrator edit. Role and credential changes take effect at the
/// member's next sign in; tokens already issued keep their claims.
pub async fn update<R: Directory + 'static>(
    store: web::Data<R>,
    codec: web::Data<Codec>,
    auth: Auth,
    path: web::Path<String>,
    req: web::Json<UpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let UpdateRequest {
        username,
        full_name,
        email: address,
        password,
        role,
    } = req.into_inner();
    let (mut member, _) = store
        .find(member_id(path)?)
        .await?
        .ok_or(StoreError::NotFound)?;
    if !username.trim().is_empty() {
        member.rename(username.trim().to_string());
    }
    if !full_name.is_empty() {
        member.set_full_name(full_name);
    }
    if !address.is_empty() {
        email(&address)?;
        member.set_email(address);
    }
    if !role.is_empty() {
        member.set_role(role.parse::<Role>().map_err(ApiError::BadRequest)?);
    }
    let hashword = match password.is_empty() {
        true => None,
        false => {
            policy::validate(&password)?;
            Some(hash(codec, password).await?)
        }
    };
    member.touch();
    store.update(&member, hashword.as_deref()).await?;
    log::info!("{} updated {}", auth.claims().username(), member.username());
    Ok(HttpResponse::Ok().json(member))
}

pub async fn delete<R: Directory + 'static>(
    store: web::Data<R>,
    auth: Auth,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = member_id(path)?;
    store.delete(id).await?;
    log::info!("{} deleted {}", auth.claims().username(), id);
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn codec() -> web::Data<Codec> {
        web::Data::new(Codec::with_cost(1).unwrap())
    }

    #[actix_web::test]
    async fn register_rejects_weak_password_verbatim() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Memory::default()))
                .app_data(codec())
                .route("/register", web::post().to(register::<Memory>)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(serde_json::json!({ "username": "bob", "password": "password123" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(
            body["error"],
            "password must contain at least one uppercase letter"
        );
    }

    #[actix_web::test]
    async fn register_rejects_blank_username_and_bad_email() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Memory::default()))
                .app_data(codec())
                .route("/register", web::post().to(register::<Memory>)),
        )
        .await;
        for body in [
            serde_json::json!({ "username": "  ", "password": "Secret12" }),
            serde_json::json!({ "username": "bob", "password": "Secret12", "email": "nope" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/register")
                .set_json(body)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn login_hides_which_part_was_wrong() {
        let store = web::Data::new(Memory::default());
        let codec = codec();
        let hashword = codec.hash("Secret12").unwrap();
        let bob = Member::new("bob".into(), String::new(), String::new(), Role::General);
        store.create(&bob, &hashword).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(store)
                .app_data(codec)
                .app_data(web::Data::new(Crypto::new(b"handler-secret")))
                .route("/login", web::post().to(login::<Memory>)),
        )
        .await;
        let mut bodies = Vec::new();
        for (username, password) in [("bob", "Wrong123"), ("nobody", "Secret12")] {
            let req = test::TestRequest::post()
                .uri("/login")
                .set_json(serde_json::json!({ "username": username, "password": password }))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            bodies.push(test::read_body(res).await);
        }
        assert_eq!(bodies[0], bodies[1]);
    }

    #[actix_web::test]
    async fn login_unknown_user_costs_a_verify() {
        let store = web::Data::new(Memory::default());
        let codec = web::Data::new(Codec::default());
        let hashword = codec.hash("Secret12").unwrap();
        let bob = Member::new("bob".into(), String::new(), String::new(), Role::General);
        store.create(&bob, &hashword).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(store)
                .app_data(codec)
                .app_data(web::Data::new(Crypto::new(b"handler-secret")))
                .route("/login", web::post().to(login::<Memory>)),
        )
        .await;
        let attempt = |username: &str| {
            test::TestRequest::post()
                .uri("/login")
                .set_json(serde_json::json!({ "username": username, "password": "Wrong123" }))
                .to_request()
        };
        // first miss also builds the decoy hash
        test::call_service(&app, attempt("nobody")).await;
        let clock = std::time::Instant::now();
        let res = test::call_service(&app, attempt("bob")).await;
        let known = clock.elapsed();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let clock = std::time::Instant::now();
        let res = test::call_service(&app, attempt("nobody")).await;
        let unknown = clock.elapsed();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(unknown * 4 >= known, "unknown {:?} vs known {:?}", unknown, known);
    }

    #[actix_web::test]
    async fn login_trims_username_like_register() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Memory::default()))
                .app_data(codec())
                .app_data(web::Data::new(Crypto::new(b"handler-secret")))
                .route("/register", web::post().to(register::<Memory>))
                .route("/login", web::post().to(login::<Memory>)),
        )
        .await;
        let body = serde_json::json!({ "username": " bob ", "password": "Secret12" });
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&body)
            .to_request();
        let member: Member = test::call_and_read_body_json(&app, req).await;
        assert_eq!(member.username(), "bob");
        for username in [" bob ", "bob"] {
            let req = test::TestRequest::post()
                .uri("/login")
                .set_json(serde_json::json!({ "username": username, "password": "Secret12" }))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    #[actix_web::test]
    async fn hashing_leaves_the_worker_free() {
        async fn ping() -> HttpResponse {
            HttpResponse::Ok().finish()
        }
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Memory::default()))
                .app_data(web::Data::new(Codec::default()))
                .route("/register", web::post().to(register::<Memory>))
                .route("/ping", web::get().to(ping)),
        )
        .await;
        let app = &app;
        let enroll = move |username: &'static str| {
            let req = test::TestRequest::post()
                .uri("/register")
                .set_json(serde_json::json!({ "username": username, "password": "Secret12" }))
                .to_request();
            async move {
                let res = test::call_service(app, req).await;
                (res.status(), std::time::Instant::now())
            }
        };
        let health = async {
            let req = test::TestRequest::get().uri("/ping").to_request();
            let res = test::call_service(app, req).await;
            (res.status(), std::time::Instant::now())
        };
        // an inline hash would hold the worker until both registrations finish
        let ((a, a_done), (b, b_done), (p, p_done)) =
            tokio::join!(enroll("alice"), enroll("bob"), health);
        assert_eq!(a, StatusCode::CREATED);
        assert_eq!(b, StatusCode::CREATED);
        assert_eq!(p, StatusCode::OK);
        assert!(p_done < a_done);
        assert!(p_done < b_done);
    }
}
