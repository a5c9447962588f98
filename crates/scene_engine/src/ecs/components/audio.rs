//! Audio emitter and listener components

use serde::{Deserialize, Serialize};

use crate::ecs::component::{set_tracked, PropertyChange};

/// Play state of an [`AudioSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// Currently audible
    Playing,
    /// Suspended, resumes where it left off
    Paused,
    /// Not playing
    Stopped,
}

/// A sound emitter referencing an audio asset by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    asset_name: String,
    is_3d: bool,
    plays_on_start_up: bool,
    is_looped: bool,
    volume: f32,
    pitch: f32,
    pan: f32,
    state: PlayState,
}

impl AudioSource {
    /// Stopped source at full volume for the named asset
    pub fn new(asset_name: impl Into<String>) -> Self {
        Self {
            asset_name: asset_name.into(),
            is_3d: false,
            plays_on_start_up: false,
            is_looped: false,
            volume: 1.0,
            pitch: 0.0,
            pan: 0.0,
            state: PlayState::Stopped,
        }
    }

    /// Builder: positional audio
    pub fn positional(mut self) -> Self {
        self.is_3d = true;
        self
    }

    /// Builder: loop playback
    pub fn looped(mut self) -> Self {
        self.is_looped = true;
        self
    }

    /// Builder: start playing as soon as the scene is loaded
    pub fn autoplay(mut self) -> Self {
        self.plays_on_start_up = true;
        self
    }

    /// Asset name resolved by the audio system's resource provider
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Positional audio
    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    /// Starts playing when the scene is loaded
    pub fn plays_on_start_up(&self) -> bool {
        self.plays_on_start_up
    }

    /// Loops playback
    pub fn is_looped(&self) -> bool {
        self.is_looped
    }

    /// Volume, 0 to 1
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Pitch adjustment, -1 to 1
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Stereo pan, -1 (left) to 1 (right)
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Current play state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Playing
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Paused
    pub fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    /// Stopped
    pub fn is_stopped(&self) -> bool {
        self.state == PlayState::Stopped
    }

    /// Set asset ("AssetName")
    pub fn set_asset_name(&mut self, name: impl Into<String>) -> Option<PropertyChange> {
        set_tracked(&mut self.asset_name, name.into(), "AssetName")
    }

    /// Set positional audio ("Is3D")
    pub fn set_3d(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_3d, value, "Is3D")
    }

    /// Set autoplay ("PlaysOnStartUp")
    pub fn set_plays_on_start_up(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.plays_on_start_up, value, "PlaysOnStartUp")
    }

    /// Set looping ("IsLooped")
    pub fn set_looped(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_looped, value, "IsLooped")
    }

    /// Set volume ("Volume")
    pub fn set_volume(&mut self, value: f32) -> Option<PropertyChange> {
        set_tracked(&mut self.volume, value, "Volume")
    }

    /// Set pitch ("Pitch")
    pub fn set_pitch(&mut self, value: f32) -> Option<PropertyChange> {
        set_tracked(&mut self.pitch, value, "Pitch")
    }

    /// Set pan ("Pan")
    pub fn set_pan(&mut self, value: f32) -> Option<PropertyChange> {
        set_tracked(&mut self.pan, value, "Pan")
    }

    /// Start playback ("IsPlaying")
    pub fn play(&mut self) -> Option<PropertyChange> {
        self.transition(PlayState::Playing, "IsPlaying")
    }

    /// Pause playback ("IsPaused")
    pub fn pause(&mut self) -> Option<PropertyChange> {
        self.transition(PlayState::Paused, "IsPaused")
    }

    /// Stop playback ("IsStopped")
    pub fn stop(&mut self) -> Option<PropertyChange> {
        self.transition(PlayState::Stopped, "IsStopped")
    }

    fn transition(&mut self, target: PlayState, property: &'static str) -> Option<PropertyChange> {
        if self.state == target {
            return None;
        }
        self.state = target;
        Some(PropertyChange::with_old(property, false))
    }
}

/// Marks the entity whose transform the listener ear follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioListener {
    is_active: bool,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self { is_active: true }
    }
}

impl AudioListener {
    /// Active listener
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the audio system should use this listener
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Set active ("IsActive")
    pub fn set_active(&mut self, value: bool) -> Option<PropertyChange> {
        set_tracked(&mut self.is_active, value, "IsActive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_source_is_stopped_at_full_volume() {
        let source = AudioSource::new("engine_hum");
        assert!(source.is_stopped());
        assert!((source.volume() - 1.0).abs() < f32::EPSILON);
        assert_eq!(source.asset_name(), "engine_hum");
    }

    #[test]
    fn play_state_transitions_are_exclusive() {
        let mut source = AudioSource::new("music");
        assert_eq!(source.play().map(|c| c.property), Some("IsPlaying"));
        assert!(source.is_playing() && !source.is_paused() && !source.is_stopped());
        assert!(source.play().is_none());

        assert_eq!(source.pause().map(|c| c.property), Some("IsPaused"));
        assert!(source.is_paused() && !source.is_playing());

        assert_eq!(source.stop().map(|c| c.property), Some("IsStopped"));
        assert!(source.is_stopped());
    }
}
