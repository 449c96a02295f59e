//! Prompt resolution for purchases.
//!
//! Regular purchases fill the purchaser's text into their era's template.
//! Reward purchases use a fixed prompt per variant and ignore the text.

use std::collections::BTreeMap;

use crate::config::{SpecialPrompts, WorkerConfig};
use crate::error::CoreError;
use crate::types::{Purchase, Reward};

/// Marker in era templates replaced by the purchase text.
pub const PLACEHOLDER: &str = "<<>>";

/// Resolves generation prompts from the configured templates.
#[derive(Debug, Clone)]
pub struct PromptResolver {
    templates: BTreeMap<String, String>,
    special: SpecialPrompts,
}

impl PromptResolver {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            templates: config.prompt_template_for_era.clone(),
            special: config.special_prompts.clone(),
        }
    }

    /// Build the prompt for a purchase.
    ///
    /// - `Reward::None`: era template with the first [`PLACEHOLDER`]
    ///   replaced by `purchase.text`; [`CoreError::MissingTemplate`] if the
    ///   era has none.
    /// - King/Queen/Knight: the configured special prompt.
    /// - Anything else: [`CoreError::InvalidReward`].
    pub fn resolve(&self, purchase: &Purchase) -> Result<String, CoreError> {
        match purchase.reward {
            Reward::None => {
                let template = self.templates.get(&purchase.era_key()).ok_or(
                    CoreError::MissingTemplate {
                        era_id: purchase.era_id,
                    },
                )?;
                Ok(template.replacen(PLACEHOLDER, &purchase.text, 1))
            }
            Reward::King => Ok(self.special.king.clone()),
            Reward::Queen => Ok(self.special.queen.clone()),
            Reward::Knight => Ok(self.special.knight.clone()),
            other => Err(CoreError::InvalidReward(other)),
        }
    }
}
