use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

use crate::config::Config;
use crate::error::{PullError, Result};

const AUTH_URL: &str = "https://www.fitbit.com/oauth2/authorize";
const TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";
const REDIRECT_URI: &str = "http://localhost:8080/callback";
const CALLBACK_ADDR: &str = "127.0.0.1:8080";
const SCOPES: [&str; 4] = ["activity", "heartrate", "sleep", "profile"];

pub struct AuthManager {
    config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Tokens {
    /// True when the access token is expired or expires within five minutes
    pub fn needs_refresh(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at - chrono::Duration::minutes(5)
    }
}

impl AuthManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn oauth_client(&self) -> Result<BasicClient> {
        let client_id = self
            .config
            .client_id
            .as_ref()
            .ok_or_else(|| PullError::config("FITBIT_CLIENT_ID not configured"))?;
        let client_secret = self
            .config
            .client_secret
            .as_ref()
            .ok_or_else(|| PullError::config("FITBIT_CLIENT_SECRET not configured"))?;

        let auth_url =
            AuthUrl::new(AUTH_URL.to_string()).map_err(|e| PullError::config(e.to_string()))?;
        let token_url =
            TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| PullError::config(e.to_string()))?;

        Ok(BasicClient::new(
            ClientId::new(client_id.clone()),
            Some(ClientSecret::new(client_secret.clone())),
            auth_url,
            Some(token_url),
        ))
    }

    /// Interactive authorization-code flow; stores the resulting token pair
    pub async fn authenticate(&self) -> Result<()> {
        let redirect = RedirectUrl::new(REDIRECT_URI.to_string())
            .map_err(|e| PullError::config(e.to_string()))?;
        let client = self.oauth_client()?.set_redirect_uri(redirect);
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf_token) = request.set_pkce_challenge(pkce_challenge).url();

        #[cfg(target_os = "macos")]
        std::process::Command::new("open").arg(auth_url.as_str()).spawn()?;

        #[cfg(target_os = "linux")]
        std::process::Command::new("xdg-open").arg(auth_url.as_str()).spawn()?;

        println!("Opening browser for Fitbit authentication...");
        println!("If the browser doesn't open, visit: {}", auth_url);

        let (code, state) = self.receive_auth_code()?;
        if state != *csrf_token.secret() {
            return Err(PullError::auth("OAuth state mismatch in callback"));
        }

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| PullError::auth(format!("Failed to exchange code for token: {}", e)))?;

        let tokens = tokens_from_response(&token);
        self.config.save_tokens(&tokens)?;
        tracing::info!(expires_at = %tokens.expires_at, "stored new Fitbit tokens");
        println!("Authentication successful!");

        Ok(())
    }

    /// Current access token, refreshing and persisting the rotated pair if needed
    pub async fn get_access_token(&self) -> Result<String> {
        let tokens = self.config.load_tokens().map_err(|_| PullError::NotAuthenticated)?;

        if !tokens.needs_refresh(chrono::Utc::now()) {
            return Ok(tokens.access_token);
        }

        // Fitbit refresh tokens are single use, so the new pair must be saved
        let refresh_token = tokens.refresh_token.as_ref().ok_or(PullError::NotAuthenticated)?;
        tracing::debug!("access token expired, refreshing");
        let new_tokens = self.refresh_token(refresh_token).await?;
        self.config.save_tokens(&new_tokens)?;
        Ok(new_tokens.access_token)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        let token = self
            .oauth_client()?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| PullError::auth(format!("Failed to refresh token: {}", e)))?;

        Ok(tokens_from_response(&token))
    }

    fn receive_auth_code(&self) -> Result<(String, String)> {
        let listener = TcpListener::bind(CALLBACK_ADDR)
            .map_err(|e| PullError::auth(format!("Failed to bind to {}: {}", CALLBACK_ADDR, e)))?;

        println!("Waiting for authentication...");

        for stream in listener.incoming() {
            let stream = stream?;
            let mut reader = BufReader::new(&stream);
            let mut line = String::new();

            reader.read_line(&mut line)?;

            if let Some(params) = parse_callback(&line) {
                let response =
                    "HTTP/1.1 200 OK\r\nContent-Length: 26\r\n\r\nAuthentication successful!";
                let mut writer = &stream;
                writer.write_all(response.as_bytes())?;
                return Ok(params);
            }
        }

        Err(PullError::auth("Failed to receive auth code"))
    }
}

fn tokens_from_response(token: &oauth2::basic::BasicTokenResponse) -> Tokens {
    Tokens {
        access_token: token.access_token().secret().clone(),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        expires_at: chrono::Utc::now()
            + chrono::Duration::seconds(token.expires_in().unwrap_or_default().as_secs() as i64),
    }
}

/// Extract `(code, state)` from a `GET /callback?...` request line
fn parse_callback(request_line: &str) -> Option<(String, String)> {
    let target = request_line.strip_prefix("GET /callback?")?;
    let query = target.split_whitespace().next()?;

    let mut code = None;
    let mut state = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("code", v)) => code = Some(v.to_string()),
            Some(("state", v)) => state = Some(v.to_string()),
            _ => {}
        }
    }

    Some((code?, state?))
}
