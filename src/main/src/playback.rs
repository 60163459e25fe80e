use log::*;
use std::str::FromStr;
use std::time::Duration;

use crate::speaker::{Speaker, SpeakerError};

/// What to do when a call after authentication fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    // Log the failure and carry on with the next call
    Continue,
    // Stop the sequence, pausing first if playback was started
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!("unknown actuator failure policy {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub playlist_id: String,
    pub volume: u8,
    pub hold: Duration,
    pub on_failure: FailurePolicy,
}

/// Calls that failed but were skipped under [`FailurePolicy::Continue`].
#[derive(Debug, Default)]
pub struct PlaybackReport {
    pub skipped: Vec<SpeakerError>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

struct Sequence<'a, S: Speaker> {
    speaker: &'a mut S,
    plan: &'a ActionPlan,
    report: PlaybackReport,
    playing: bool,
}

impl<S: Speaker> Sequence<'_, S> {
    fn step(
        &mut self,
        description: &str,
        call: impl FnOnce(&mut S) -> Result<(), SpeakerError>,
    ) -> Result<(), SpeakerError> {
        info!("{}", description);
        let error = match call(&mut *self.speaker) {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        match self.plan.on_failure {
            FailurePolicy::Continue => {
                warn!("{}, continuing", error);
                self.report.skipped.push(error);
                Ok(())
            }
            FailurePolicy::Abort => {
                error!("{}, aborting", error);
                if self.playing {
                    info!("Attempting to pause playback before giving up");
                    if let Err(e) = self.speaker.pause() {
                        warn!("Unable to pause playback: {}", e);
                    }
                }
                Err(error)
            }
        }
    }
}

/// Run the alarm sequence against a speaker group.
///
/// Authentication failures always abort. The other calls follow the plan's
/// failure policy. `wait` performs the hold between play and pause.
pub fn perform<S: Speaker>(
    speaker: &mut S,
    plan: &ActionPlan,
    wait: impl FnOnce(Duration),
) -> Result<PlaybackReport, SpeakerError> {
    speaker.authenticate()?;

    let mut sequence = Sequence {
        speaker,
        plan,
        report: PlaybackReport::default(),
        playing: false,
    };

    sequence.step("Loading playlist", |s| s.replace_playlist(&plan.playlist_id))?;
    sequence.step(&format!("Setting volume to {}", plan.volume), |s| {
        s.set_volume(plan.volume)
    })?;
    sequence.step("Starting playback", |s| s.play())?;
    sequence.playing = true;

    info!("Holding playback for {}s", plan.hold.as_secs());
    wait(plan.hold);

    sequence.step("Pausing playback", |s| s.pause())?;

    Ok(sequence.report)
}
