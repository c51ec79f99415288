//! Static overlay configuration, loaded from an optional JSON file.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Context as _, Result};
use serde::Deserialize;

use crate::overlay::Timing;

/// vMix exposes four overlay channels.
const OVERLAY_CHANNELS: std::ops::RangeInclusive<u8> = 1..=4;
/// Room for at least one character before the ellipsis.
const MIN_TITLE_LENGTH: usize = 4;

/// Every tunable of the overlay driver. Keys not present in the file keep their defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OverlayConfig {
    /// Title input showing the current item
    pub now_playing_input: String,
    pub now_playing_overlay_channel: u8,
    /// Title input announcing the next item
    pub next_up_input: String,
    pub next_up_overlay_channel: u8,
    /// Name of the text field inside both title inputs
    pub text_field: String,
    /// Name of the image field inside both title inputs
    pub image_field: String,
    pub now_playing_image: String,
    pub next_up_image: String,
    /// File receiving the untruncated current label
    pub now_playing_file: PathBuf,
    /// File receiving the untruncated next label
    pub next_up_file: PathBuf,
    /// Seconds the now-playing title stays on air after an item starts
    pub show_now_playing_for: f64,
    /// Remaining seconds below which the next-up title goes on air
    pub show_next_up_when_remaining: f64,
    /// Seconds the next-up title stays on air
    pub show_next_up_for: f64,
    pub overlay_transition_type: String,
    /// Overlay transition duration in milliseconds
    pub overlay_transition_duration: u32,
    pub max_title_length: usize,
    /// Text placed before the next item's label
    pub next_up_prefix: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            now_playing_input: "NowPlaying".to_owned(),
            now_playing_overlay_channel: 2,
            next_up_input: "NextUp".to_owned(),
            next_up_overlay_channel: 3,
            text_field: "Headline.Text".to_owned(),
            image_field: "Image.Source".to_owned(),
            now_playing_image: String::new(),
            next_up_image: String::new(),
            now_playing_file: PathBuf::from("now_playing.txt"),
            next_up_file: PathBuf::from("next_up.txt"),
            show_now_playing_for: 8.0,
            show_next_up_when_remaining: 15.0,
            show_next_up_for: 6.0,
            overlay_transition_type: "Fade".to_owned(),
            overlay_transition_duration: 500,
            max_title_length: 40,
            next_up_prefix: "Coming up: ".to_owned(),
        }
    }
}

impl OverlayConfig {
    /// Load the configuration from `path`, or use the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open config file {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the overlay driver cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid option.
    pub fn validate(&self) -> Result<()> {
        for (name, channel) in [
            ("NOW_PLAYING_OVERLAY_CHANNEL", self.now_playing_overlay_channel),
            ("NEXT_UP_OVERLAY_CHANNEL", self.next_up_overlay_channel),
        ] {
            ensure!(
                OVERLAY_CHANNELS.contains(&channel),
                "{name}={channel} is not an overlay channel (expected 1 to 4)"
            );
        }
        if self.now_playing_input == self.next_up_input
            && self.now_playing_overlay_channel == self.next_up_overlay_channel
        {
            bail!("Now-playing and next-up titles must not share the same input and overlay channel");
        }
        ensure!(
            self.max_title_length >= MIN_TITLE_LENGTH,
            "MAX_TITLE_LENGTH must be at least {MIN_TITLE_LENGTH}"
        );
        self.timing().map(drop)
    }

    /// Timing windows of the overlay state machine.
    ///
    /// # Errors
    ///
    /// Returns an error if a window is negative or not finite.
    pub fn timing(&self) -> Result<Timing> {
        Ok(Timing {
            show_now_playing_for: seconds("SHOW_NOW_PLAYING_FOR", self.show_now_playing_for)?,
            show_next_up_when_remaining: seconds(
                "SHOW_NEXT_UP_WHEN_REMAINING",
                self.show_next_up_when_remaining,
            )?,
            show_next_up_for: seconds("SHOW_NEXT_UP_FOR", self.show_next_up_for)?,
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("{name}={value} is not a valid duration"))
}
