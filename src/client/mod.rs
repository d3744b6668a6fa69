//! HTTP client for the Playlister API
//!
//! Holds a cookie store so the session set by `login_user` or
//! `register_user` is sent with every later request.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::models::{PlaylistUpdate, Song};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {error_message}")]
    Api {
        status: StatusCode,
        error_message: String,
    },
}

/// Successful response: status plus the JSON body, when there is one
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    password: &'a str,
    password_verify: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    songs: &'a [Song],
    owner_email: &'a str,
}

#[derive(Serialize)]
struct UpdatePlaylistBody<'a> {
    playlist: &'a PlaylistUpdateBody<'a>,
}

#[derive(Serialize)]
struct PlaylistUpdateBody<'a> {
    name: &'a str,
    songs: &'a [Song],
}

#[derive(Clone)]
pub struct PlaylisterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PlaylisterClient {
    /// `base_url` is the server root, e.g. `http://localhost:4000/`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url })
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ClientResponse, ClientError> {
        let url = self.base_url.join(path)?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        handle_response(response).await
    }

    // ============ Auth ============

    pub async fn get_logged_in(&self) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::GET, "auth/loggedIn", None).await
    }

    pub async fn login_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ClientResponse, ClientError> {
        let body = LoginBody { email, password };
        self.send(Method::POST, "auth/login", Some(&body)).await
    }

    pub async fn logout_user(&self) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::GET, "auth/logout", None).await
    }

    pub async fn register_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        password_verify: &str,
    ) -> Result<ClientResponse, ClientError> {
        let body = RegisterBody {
            first_name,
            last_name,
            email,
            password,
            password_verify,
        };
        self.send(Method::POST, "auth/register", Some(&body)).await
    }

    // ============ Store ============

    pub async fn create_playlist(
        &self,
        name: &str,
        songs: &[Song],
        owner_email: &str,
    ) -> Result<ClientResponse, ClientError> {
        let body = CreatePlaylistBody {
            name,
            songs,
            owner_email,
        };
        self.send(Method::POST, "store/playlist", Some(&body)).await
    }

    pub async fn delete_playlist_by_id(&self, id: &str) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::DELETE, &format!("store/playlist/{}", id), None)
            .await
    }

    pub async fn get_playlist_by_id(&self, id: &str) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::GET, &format!("store/playlist/{}", id), None)
            .await
    }

    pub async fn get_playlist_pairs(&self) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::GET, "store/playlistpairs", None).await
    }

    pub async fn get_playlists(&self) -> Result<ClientResponse, ClientError> {
        self.send::<()>(Method::GET, "store/playlists", None).await
    }

    pub async fn update_playlist_by_id(
        &self,
        id: &str,
        playlist: &PlaylistUpdate,
    ) -> Result<ClientResponse, ClientError> {
        let inner = PlaylistUpdateBody {
            name: &playlist.name,
            songs: &playlist.songs,
        };
        let body = UpdatePlaylistBody { playlist: &inner };
        self.send(Method::PUT, &format!("store/playlist/{}", id), Some(&body))
            .await
    }
}

/// Decode JSON bodies and turn non-2xx into `ClientError::Api`
async fn handle_response(response: reqwest::Response) -> Result<ClientResponse, ClientError> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    let data = if is_json {
        Some(response.json::<serde_json::Value>().await?)
    } else {
        None
    };

    if !status.is_success() {
        return Err(ClientError::Api {
            status,
            error_message: error_message(status, data.as_ref()),
        });
    }

    Ok(ClientResponse { status, data })
}

/// The body's `errorMessage`, falling back to the status reason
fn error_message(status: StatusCode, data: Option<&serde_json::Value>) -> String {
    data.and_then(|d| d.get("errorMessage"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}
