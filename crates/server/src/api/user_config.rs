//! User config token parsing.
//!
//! Add-on clients put the user's file-search account in the first path
//! segment, either as (URL-encoded) JSON or as base64 JSON.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use stashcast_core::UserCredentials;

#[derive(Deserialize)]
struct UserConfigToken {
    #[serde(rename = "easynewsUsername", default)]
    easynews_username: Option<String>,
    #[serde(rename = "easynewsPassword", default)]
    easynews_password: Option<String>,
}

fn from_json(text: &str) -> Option<UserConfigToken> {
    serde_json::from_str(text).ok()
}

fn from_base64(token: &str) -> Option<UserConfigToken> {
    let bytes = STANDARD
        .decode(token)
        .or_else(|_| URL_SAFE_NO_PAD.decode(token.trim_end_matches('=')))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Parse a config token into user credentials.
///
/// Returns `None` for anything that does not carry both a username and a
/// password.
pub fn parse_user_config(token: &str) -> Option<UserCredentials> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let parsed = from_json(token)
        .or_else(|| {
            urlencoding::decode(token)
                .ok()
                .and_then(|decoded| from_json(&decoded))
        })
        .or_else(|| from_base64(token))?;

    UserCredentials::new(parsed.easynews_username?, parsed.easynews_password?)
}
