use std::{borrow::BorrowMut, future::Future};

use axum::{response::Response, http::{Request, request::Builder}, body::Body};
use http_body::{combinators::UnsyncBoxBody, Body as _};
use scoreboard_entities::mock::{self, MockOption};
use scoreboard_server::{auth::{issue_token, Role}, state::AppState};
use sea_orm::{prelude::Uuid, DatabaseConnection};
use tower::Service;

pub const MOCK_SUB_EVENT: u128 = 1;

#[derive(Default)]
pub struct FixtureOptions {
    pub mock_default_sub_event: bool,
    pub as_referee_of: Option<Uuid>,
}

pub struct Fixture {
    pub app: axum::Router,
    pub auth: Auth,
    pub db: DatabaseConnection,
}

pub enum Auth {
    None,
    Bearer {
        token: String,
    },
}

pub struct APIResponse {
    response: Response<UnsyncBoxBody<axum::body::Bytes, axum::Error>>,
}

impl APIResponse {
    pub fn status(&self) -> axum::http::StatusCode {
        self.response.status()
    }

    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<String> {
        self.response.headers().get(name).and_then(|v| v.to_str().ok()).map(|v| v.to_string())
    }

    async fn bytes(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        let body = self.response.body_mut();
        while let Some(next) = body.data().await {
            buf.extend_from_slice(&next.unwrap());
        }
        buf
    }

    #[allow(dead_code)]
    pub async fn json<T: serde::de::DeserializeOwned>(&mut self) -> T {
        let buf = self.bytes().await;
        serde_json::from_slice(&buf).unwrap()
    }

    #[allow(dead_code)]
    pub async fn text(&mut self) -> String {
        let buf = self.bytes().await;
        String::from_utf8(buf).unwrap()
    }
}

impl From<Response<UnsyncBoxBody<axum::body::Bytes, axum::Error>>> for APIResponse {
    fn from(response: Response<UnsyncBoxBody<axum::body::Bytes, axum::Error>>) -> Self {
        Self {
            response,
        }
    }
}

impl Fixture {
    pub async fn new(options: FixtureOptions) -> Self {
        Self::new_with_setup(options, |_| async {  }).await
    }

    pub async fn new_with_setup<F, Fut>(options: FixtureOptions, setup_func: F) -> Self
    where
    F: FnOnce(DatabaseConnection) -> Fut,
    Fut: Future<Output = ()>,
    {
        let state = AppState::new_test_app().await;
        if options.mock_default_sub_event {
            mock::make_mock_competition_with_options(MockOption {
                deterministic_uuids: true,
                ..Default::default()
            }).save_all(&state.db).await.unwrap();
        }

        setup_func(state.db.clone()).await;

        let token = match options.as_referee_of {
            Some(sub_event_id) => issue_token(&state.db, Role::Referee, "judge", Some(sub_event_id)).await.unwrap(),
            None => issue_token(&state.db, Role::Admin, "admin", None).await.unwrap(),
        };
        let db = state.db.clone();
        Self {
            app: scoreboard_server::app_with_state(state).await,
            auth: Auth::Bearer { token },
            db,
        }
    }

    #[allow(dead_code)]
    pub async fn default() -> Self {
        Self::new(FixtureOptions::default()).await
    }

    #[allow(dead_code)]
    pub fn with_auth(self, auth: Auth) -> Self {
        Self {
            auth,
            ..self
        }
    }

    fn get_base_request(&self) -> Builder {
        let builder = Request::builder();
        match &self.auth {
            Auth::None => builder,
            Auth::Bearer { token } => builder.header("Authorization", format!("Bearer {}", token)),
        }
    }

    async fn send(&mut self, request: Request<Body>) -> APIResponse {
        self.app.borrow_mut()
            .call(request)
            .await
            .unwrap().into()
    }

    #[allow(dead_code)]
    pub async fn get(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json_no_body(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json<T>(&mut self, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        self.send_json("POST", path, body).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T>(&mut self, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        self.send_json("PUT", path, body).await
    }

    async fn send_json<T>(&mut self, method: &str, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        let request = self.get_base_request()
            .method(method)
            .header("Content-Type", "application/json")
            .uri(path)
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }
}
