use serde::{Deserialize, Serialize};

use crate::model::Status;
use crate::rng::Sampler;

pub const DEFAULT_AUDIO_CUE: &str =
    "https://assets.mixkit.co/active_storage/sfx/2869/2869-preview.mp3";

fn default_enabled() -> bool {
    true
}

fn default_audio_url() -> String {
    DEFAULT_AUDIO_CUE.to_string()
}

fn default_warning_months_min() -> u32 {
    4
}

fn default_warning_months_max() -> u32 {
    7
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audio_url")]
    pub audio_url: String,
    #[serde(default = "default_warning_months_min")]
    pub warning_months_min: u32,
    #[serde(default = "default_warning_months_max")]
    pub warning_months_max: u32,
}

impl AlertPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            audio_url: default_audio_url(),
            warning_months_min: default_warning_months_min(),
            warning_months_max: default_warning_months_max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub status: Status,
    pub icon: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_cue: Option<String>,
}

impl Notification {
    pub fn build<S: Sampler + ?Sized>(
        status: Status,
        policy: &AlertPolicy,
        sampler: &mut S,
    ) -> Option<Self> {
        let (message, audio_cue) = match status {
            Status::Healthy => return None,
            Status::Warning => {
                let months =
                    sampler.int_inclusive(policy.warning_months_min, policy.warning_months_max);
                (
                    format!("WARNING: Predicted battery life decay in {months} months."),
                    None,
                )
            }
            Status::Critical => (
                "CRITICAL: Battery has hit the failure threshold!".to_string(),
                Some(policy.audio_url.clone()),
            ),
        };
        Some(Self {
            status,
            icon: status.icon().to_string(),
            message,
            audio_cue,
        })
    }
}

/// Last status observed by one session. Starts absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    last: Option<Status>,
}

impl AlertState {
    pub fn last_status(&self) -> Option<Status> {
        self.last
    }

    /// Records `status` and returns the status worth announcing, if any.
    /// Repeats are silent and HEALTHY is never announced.
    pub fn transition(self, status: Status) -> (AlertState, Option<Status>) {
        let next = AlertState { last: Some(status) };
        if self.last == Some(status) {
            return (next, None);
        }
        match status {
            Status::Healthy => (next, None),
            Status::Warning | Status::Critical => (next, Some(status)),
        }
    }

    pub fn observe<S: Sampler + ?Sized>(
        self,
        status: Status,
        policy: &AlertPolicy,
        sampler: &mut S,
    ) -> (AlertState, Option<Notification>) {
        let (next, fired) = self.transition(status);
        let notification = match fired {
            Some(status) if policy.enabled => Notification::build(status, policy, sampler),
            _ => None,
        };
        (next, notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSampler;

    #[test]
    fn fires_only_on_transitions() {
        let sequence = [
            Status::Healthy,
            Status::Warning,
            Status::Warning,
            Status::Critical,
            Status::Warning,
        ];
        let mut state = AlertState::default();
        let mut fired = Vec::new();
        for (index, status) in sequence.into_iter().enumerate() {
            let (next, emitted) = state.transition(status);
            state = next;
            if let Some(status) = emitted {
                fired.push((index, status));
            }
        }
        assert_eq!(
            fired,
            vec![
                (1, Status::Warning),
                (3, Status::Critical),
                (4, Status::Warning)
            ]
        );
        assert_eq!(state.last_status(), Some(Status::Warning));
    }

    #[test]
    fn first_evaluation_fires_unless_healthy() {
        let fresh = AlertState::default();
        assert_eq!(fresh.last_status(), None);
        assert_eq!(fresh.transition(Status::Healthy).1, None);
        assert_eq!(fresh.transition(Status::Warning).1, Some(Status::Warning));
        assert_eq!(fresh.transition(Status::Critical).1, Some(Status::Critical));
    }

    #[test]
    fn recovery_rearms_the_alert() {
        let state = AlertState::default();
        let (state, _) = state.transition(Status::Critical);
        let (state, fired) = state.transition(Status::Healthy);
        assert_eq!(fired, None);
        assert_eq!(state.last_status(), Some(Status::Healthy));
        assert_eq!(state.transition(Status::Critical).1, Some(Status::Critical));
    }

    #[test]
    fn critical_notification_carries_audio_cue() {
        let policy = AlertPolicy::default();
        let (_, note) =
            AlertState::default().observe(Status::Critical, &policy, &mut ScriptedSampler::midpoint());
        let note = note.expect("critical fires");
        assert_eq!(note.icon, "🚨");
        assert_eq!(note.message, "CRITICAL: Battery has hit the failure threshold!");
        assert_eq!(note.audio_cue.as_deref(), Some(DEFAULT_AUDIO_CUE));
    }

    #[test]
    fn warning_notification_estimates_decay_months() {
        let policy = AlertPolicy::default();
        let mut sampler = ScriptedSampler::new(vec![0.0]);
        let (_, note) = AlertState::default().observe(Status::Warning, &policy, &mut sampler);
        let note = note.expect("warning fires");
        assert_eq!(
            note.message,
            "WARNING: Predicted battery life decay in 4 months."
        );
        assert!(note.audio_cue.is_none());
    }

    #[test]
    fn disabled_policy_tracks_state_silently() {
        let policy = AlertPolicy::disabled();
        let (state, note) = AlertState::default().observe(
            Status::Critical,
            &policy,
            &mut ScriptedSampler::midpoint(),
        );
        assert!(note.is_none());
        assert_eq!(state.last_status(), Some(Status::Critical));
    }
}
