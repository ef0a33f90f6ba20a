/// What to do once the current level is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearedAction {
    /// Load this campaign ordinal with fresh per-level state.
    LoadLevel(u32),
    /// Persist the final score; nothing further to load.
    CampaignComplete,
}

/// Navigation offered to the player after a loss. The score is persisted
/// before either is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LossChoices {
    pub return_to_menu: bool,
    pub restart_from_start: bool,
}

/// Position within a campaign of `campaign_length` levels. Custom maps play
/// as a one-level run outside story mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progression {
    current: u32,
    campaign_length: u32,
    story_mode: bool,
}

impl Progression {
    pub fn campaign(ordinal: u32, campaign_length: u32) -> Self {
        let campaign_length = campaign_length.max(1);
        Self {
            current: ordinal.clamp(1, campaign_length),
            campaign_length,
            story_mode: true,
        }
    }

    pub fn custom() -> Self {
        Self {
            current: 1,
            campaign_length: 1,
            story_mode: false,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn campaign_length(&self) -> u32 {
        self.campaign_length
    }

    pub fn story_mode(&self) -> bool {
        self.story_mode
    }

    pub fn on_level_cleared(&self) -> ClearedAction {
        if self.story_mode && self.current < self.campaign_length {
            ClearedAction::LoadLevel(self.current + 1)
        } else {
            ClearedAction::CampaignComplete
        }
    }

    pub fn on_player_lost(&self) -> LossChoices {
        LossChoices {
            return_to_menu: true,
            restart_from_start: self.story_mode,
        }
    }

    pub(crate) fn advance_to(&mut self, ordinal: u32) {
        self.current = ordinal.clamp(1, self.campaign_length);
    }
}
