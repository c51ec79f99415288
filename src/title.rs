//! Title overlays: text formatting and the commands that put a title on air.

use crate::{
    config::OverlayConfig,
    overlay::Slot,
    vmix::{Command, VmixClient},
};

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max` characters, ending with an ellipsis when shortened.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text
        .chars()
        .take(max.saturating_sub(ELLIPSIS.len()))
        .collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// A title input and the overlay channel it is shown on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSlot {
    pub input: String,
    pub channel: u8,
    pub image: String,
    /// Prepended to the truncated label
    pub prefix: String,
}

pub struct TitlePresenter {
    client: VmixClient,
    text_field: String,
    image_field: String,
    max_length: usize,
    now_playing: TitleSlot,
    next_up: TitleSlot,
}

impl TitlePresenter {
    #[must_use]
    pub fn new(client: VmixClient, config: &OverlayConfig) -> Self {
        Self {
            client,
            text_field: config.text_field.clone(),
            image_field: config.image_field.clone(),
            max_length: config.max_title_length,
            now_playing: TitleSlot {
                input: config.now_playing_input.clone(),
                channel: config.now_playing_overlay_channel,
                image: config.now_playing_image.clone(),
                prefix: String::new(),
            },
            next_up: TitleSlot {
                input: config.next_up_input.clone(),
                channel: config.next_up_overlay_channel,
                image: config.next_up_image.clone(),
                prefix: config.next_up_prefix.clone(),
            },
        }
    }

    #[must_use]
    pub const fn slot(&self, slot: Slot) -> &TitleSlot {
        match slot {
            Slot::NowPlaying => &self.now_playing,
            Slot::NextUp => &self.next_up,
        }
    }

    /// Text displayed in `slot` for `label`
    #[must_use]
    pub fn format(&self, slot: Slot, label: &str) -> String {
        format!("{}{}", self.slot(slot).prefix, truncate(label, self.max_length))
    }

    /// Update the title's text and image, then bring it on air.
    ///
    /// Returns whether vMix accepted the show command.
    #[must_use]
    pub async fn show(&self, slot: Slot, label: &str) -> bool {
        let title = self.slot(slot);
        let text = self.format(slot, label);
        let set_text = Command::set_text(&title.input, &self.text_field, &text);
        let set_image = Command::set_image(&title.input, &self.image_field, &title.image);
        let (text_sent, image_sent) =
            futures::join!(self.client.send(&set_text), self.client.send(&set_image));
        if !(text_sent && image_sent) {
            tracing::warn!(input = %title.input, "Title content may be stale");
        }
        self.client
            .send(&Command::overlay_in(title.channel, &title.input))
            .await
    }

    /// Returns whether vMix accepted the hide command.
    #[must_use]
    pub async fn hide(&self, slot: Slot) -> bool {
        let title = self.slot(slot);
        self.client
            .send(&Command::overlay_out(title.channel, &title.input))
            .await
    }

    /// Apply the configured transition to every overlay channel in use.
    pub async fn configure_transitions(&self, kind: &str, duration_ms: u32) {
        let mut channels = vec![self.now_playing.channel, self.next_up.channel];
        channels.dedup();
        for channel in channels {
            let kind_sent = self
                .client
                .send(&Command::set_overlay_transition(channel, kind))
                .await;
            let duration_sent = self
                .client
                .send(&Command::set_overlay_transition_duration(channel, duration_ms))
                .await;
            if kind_sent && duration_sent {
                tracing::info!(channel, kind, duration_ms, "Overlay transition configured");
            } else {
                tracing::warn!(channel, "Overlay transition not configured, keeping vMix setting");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_untouched() {
        assert_eq!(truncate("Intro", 10), "Intro");
        assert_eq!(truncate("0123456789", 10), "0123456789");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn long_titles_are_cut() {
        let cut = truncate("The Long And Winding Road", 10);
        assert_eq!(cut, "The Lon...");
        assert_eq!(cut.chars().count(), 10);
        assert_eq!(truncate("01234567890", 10), "0123456...");
    }

    #[test]
    fn truncation_counts_characters() {
        let cut = truncate("Ça va être génial ce soir", 12);
        assert_eq!(cut, "Ça va êtr...");
        assert_eq!(cut.chars().count(), 12);
    }

    #[test]
    fn slot_text() {
        let config = OverlayConfig {
            max_title_length: 8,
            next_up_prefix: "Next: ".to_owned(),
            ..OverlayConfig::default()
        };
        let client = VmixClient::new(crate::vmix::api_url("127.0.0.1").unwrap()).unwrap();
        let presenter = TitlePresenter::new(client, &config);

        assert_eq!(presenter.format(Slot::NowPlaying, "Overture"), "Overture");
        assert_eq!(presenter.format(Slot::NowPlaying, "Overture No. 2"), "Overt...");
        assert_eq!(presenter.format(Slot::NextUp, "Finale"), "Next: Finale");
        assert_eq!(presenter.format(Slot::NextUp, "Grand Finale"), "Next: Grand...");
        assert_eq!(presenter.slot(Slot::NextUp).channel, 3);
    }
}
