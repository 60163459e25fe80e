use serde::{Deserialize, Serialize};

// Response of the refresh token exchange
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

// Body of the group playlists call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPlaylist<'a> {
    pub action: &'a str,
    pub playlist_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_playlist_body() {
        let body = LoadPlaylist {
            action: "replace",
            playlist_id: "0",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"action": "replace", "playlistId": "0"})
        );
    }

    #[test]
    fn test_access_token_ignores_extra_fields() {
        let token: AccessToken = serde_json::from_str(
            r#"{"access_token": "abc", "token_type": "Bearer", "refresh_token": "r", "scope": "playback-control-all"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, None);
    }
}
