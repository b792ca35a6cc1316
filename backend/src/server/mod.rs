//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::ServerSettings;

use state_builders::build_http_state;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::routes;
use backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    http_state: web::Data<HttpState>,
    session: SessionMiddleware<CookieSessionStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1").wrap(session).configure(routes);

    let app = App::new().app_data(http_state).wrap(Trace).service(api);

    #[cfg(debug_assertions)]
    let app = app.service(
        SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    app
}

/// Construct an Actix HTTP server from a prepared [`ServerConfig`].
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let http_state = build_http_state(&config);
    let ServerConfig {
        session,
        bind_addr,
        db_pool: _,
        bcrypt_cost: _,
    } = config;

    let server = HttpServer::new(move || build_app(http_state.clone(), session.middleware()))
        .bind(bind_addr)?
        .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    //! End-to-end wiring through the real app factory.
    use super::*;
    use actix_web::cookie::{Key, SameSite};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use backend::domain::TRACE_ID_HEADER;
    use backend::inbound::http::session_config::SessionSettings;
    use rstest::rstest;
    use serde_json::json;

    fn session() -> SessionMiddleware<CookieSessionStore> {
        SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
        .middleware()
    }

    fn config() -> ServerConfig {
        let settings = SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        };
        ServerConfig::new(settings, "127.0.0.1:0".parse().expect("address"), 4)
    }

    #[rstest]
    #[actix_web::test]
    async fn signup_sets_session_cookie_and_trace_header() {
        let app = test::init_service(build_app(build_http_state(&config()), session())).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/signup")
                .set_json(json!({
                    "displayName": "Ada",
                    "email": "ada@example.com",
                    "password": "secret1"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert!(res.headers().contains_key(TRACE_ID_HEADER));
        assert!(res.response().cookies().any(|c| c.name() == "session"));
    }

    #[rstest]
    #[actix_web::test]
    async fn books_listing_is_public() {
        let app = test::init_service(build_app(build_http_state(&config()), session())).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/books").to_request())
                .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body, json!([]));
    }
}
