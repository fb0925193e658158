use crate::{Error, Result};

/// The three user inputs a story is built from. Fields are trimmed and
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPrompt {
    character: String,
    setting: String,
    plot_twist: String,
}

impl StoryPrompt {
    pub fn new(
        character: impl Into<String>,
        setting: impl Into<String>,
        plot_twist: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            character: required("character", character.into())?,
            setting: required("setting", setting.into())?,
            plot_twist: required("plot_twist", plot_twist.into())?,
        })
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    pub fn plot_twist(&self) -> &str {
        &self.plot_twist
    }

    /// Instruction text sent to the model.
    pub fn render(&self) -> String {
        format!(
            "Create an engaging short story with the following elements:\n\
             Character: {}\n\
             Setting: {}\n\
             Plot Twist: {}\n\
             \n\
             Make it creative, engaging, and around 200 words. Focus on vivid descriptions and emotional depth.\n\
             The story should have a clear beginning, middle, and end, incorporating the plot twist naturally.",
            self.character, self.setting, self.plot_twist
        )
    }
}

fn required(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::IncompletePrompt(field));
    }
    Ok(trimmed.to_string())
}
