use log::*;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

mod api;

use api::{AccessToken, LoadPlaylist};

#[derive(Debug, Error)]
pub enum CallFailure {
    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("no access token, authenticate first")]
    NotAuthenticated,
}

#[derive(Debug, Error)]
pub enum SpeakerError {
    #[error("unable to generate access token with Sonos: {0}")]
    AuthFailure(CallFailure),

    #[error("Sonos {call} call failed: {cause}")]
    ActuatorCallFailure {
        call: &'static str,
        cause: CallFailure,
    },
}

/// Control surface of a speaker group, one method per call of the alarm sequence.
pub trait Speaker {
    fn authenticate(&mut self) -> Result<(), SpeakerError>;
    fn replace_playlist(&mut self, playlist_id: &str) -> Result<(), SpeakerError>;
    fn set_volume(&mut self, volume: u8) -> Result<(), SpeakerError>;
    fn play(&mut self) -> Result<(), SpeakerError>;
    fn pause(&mut self) -> Result<(), SpeakerError>;
}

#[derive(Clone, Debug)]
pub struct SonosSettings {
    pub auth_url: String,
    pub control_url: String,
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct SonosCredentials {
    pub refresh_token: String,
    // Value of the Authorization header for the token exchange, "Basic ..."
    pub credentials: String,
    pub household_id: String,
    pub group_id: String,
}

pub struct SonosSpeaker {
    client: Client,
    settings: SonosSettings,
    credentials: SonosCredentials,
    access_token: Option<String>,
}

impl SonosSpeaker {
    pub fn new(settings: SonosSettings, credentials: SonosCredentials) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(SonosSpeaker {
            client,
            settings,
            credentials,
            access_token: None,
        })
    }

    fn group_url(&self, path: &str) -> String {
        format!(
            "{}/groups/{}/{}",
            self.settings.control_url.trim_end_matches('/'),
            self.credentials.group_id,
            path
        )
    }

    fn group_request(&self, call: &'static str, path: &str) -> Result<RequestBuilder, SpeakerError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(SpeakerError::ActuatorCallFailure {
                call,
                cause: CallFailure::NotAuthenticated,
            })?;

        Ok(self
            .client
            .post(self.group_url(path))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json"))
    }

    fn send(call: &'static str, request: RequestBuilder) -> Result<(), SpeakerError> {
        let failure = |cause| SpeakerError::ActuatorCallFailure { call, cause };

        let response = request.send().map_err(|e| failure(CallFailure::from(e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failure(CallFailure::Status(status)));
        }

        debug!("Sonos {} call returned {}", call, status);
        Ok(())
    }
}

impl Speaker for SonosSpeaker {
    fn authenticate(&mut self) -> Result<(), SpeakerError> {
        let url = format!(
            "{}/login/v3/oauth/access",
            self.settings.auth_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .query(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(AUTHORIZATION, &self.credentials.credentials)
            .send()
            .map_err(|e| SpeakerError::AuthFailure(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeakerError::AuthFailure(CallFailure::Status(status)));
        }

        let token: AccessToken = response
            .json()
            .map_err(|e| SpeakerError::AuthFailure(e.into()))?;

        match token.expires_in {
            Some(seconds) => info!(
                "Created access token for household {}, valid for {}s",
                self.credentials.household_id, seconds
            ),
            None => info!(
                "Created access token for household {}",
                self.credentials.household_id
            ),
        }

        self.access_token = Some(token.access_token);
        Ok(())
    }

    fn replace_playlist(&mut self, playlist_id: &str) -> Result<(), SpeakerError> {
        let body = LoadPlaylist {
            action: "replace",
            playlist_id,
        };
        let request = self.group_request("playlists", "playlists")?.json(&body);
        Self::send("playlists", request)
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), SpeakerError> {
        let request = self
            .group_request("groupVolume", "groupVolume")?
            .query(&[("volume", volume)]);
        Self::send("groupVolume", request)
    }

    fn play(&mut self) -> Result<(), SpeakerError> {
        let request = self.group_request("play", "playback/play")?;
        Self::send("play", request)
    }

    fn pause(&mut self) -> Result<(), SpeakerError> {
        let request = self.group_request("pause", "playback/pause")?;
        Self::send("pause", request)
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Call {
        Authenticate,
        ReplacePlaylist,
        SetVolume(u8),
        Play,
        Hold(Duration),
        Pause,
    }

    /// Speaker that records every call into a shared journal.
    ///
    /// Calls listed in `failing` return an error instead of succeeding.
    #[derive(Default)]
    pub struct RecordingSpeaker {
        pub journal: Rc<RefCell<Vec<Call>>>,
        pub failing: Vec<Call>,
    }

    impl RecordingSpeaker {
        pub fn failing_on(calls: &[Call]) -> Self {
            RecordingSpeaker {
                failing: calls.to_vec(),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.journal.borrow().clone()
        }

        fn record(&mut self, call: Call, name: &'static str) -> Result<(), SpeakerError> {
            self.journal.borrow_mut().push(call);
            if !self.failing.contains(&call) {
                return Ok(());
            }
            let cause = CallFailure::Status(StatusCode::SERVICE_UNAVAILABLE);
            match call {
                Call::Authenticate => Err(SpeakerError::AuthFailure(cause)),
                _ => Err(SpeakerError::ActuatorCallFailure { call: name, cause }),
            }
        }
    }

    impl Speaker for RecordingSpeaker {
        fn authenticate(&mut self) -> Result<(), SpeakerError> {
            self.record(Call::Authenticate, "auth")
        }

        fn replace_playlist(&mut self, _playlist_id: &str) -> Result<(), SpeakerError> {
            self.record(Call::ReplacePlaylist, "playlists")
        }

        fn set_volume(&mut self, volume: u8) -> Result<(), SpeakerError> {
            self.record(Call::SetVolume(volume), "groupVolume")
        }

        fn play(&mut self) -> Result<(), SpeakerError> {
            self.record(Call::Play, "play")
        }

        fn pause(&mut self) -> Result<(), SpeakerError> {
            self.record(Call::Pause, "pause")
        }
    }
}
