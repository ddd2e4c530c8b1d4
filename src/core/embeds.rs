//! Embed construction for bot replies
//!
//! Handlers and the dispatcher build a platform-neutral [`Embed`]; the gateway
//! layer turns it into a serenity `CreateEmbed` when the reply is sent.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Platform-neutral embed value, serenity conversion moved behind `apply_to`
//! - 1.0.0: Info and error embed builders

use crate::core::response::{truncate, truncate_for_embed};
use serenity::builder::CreateEmbed;

/// Field values are capped by Discord at 1024 characters
const FIELD_LIMIT: usize = 1024;

pub mod colors {
    /// Neutral / success replies
    pub const SUNSHINE_YELLOW: u32 = 0xFFD166;
    /// Errors, denials and rate limits
    pub const HOT_PINK_POP: u32 = 0xFF4F9A;
    pub const SKY_BLUE: u32 = 0x5BC0EB;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn new(color: u32) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::new(colors::SUNSHINE_YELLOW).description(description)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(colors::HOT_PINK_POP).description(description)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate_for_embed(&description.into()));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: truncate(&value.into(), FIELD_LIMIT),
            inline,
        });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Copy this embed onto a serenity builder
    pub fn apply_to<'a>(&self, builder: &'a mut CreateEmbed) -> &'a mut CreateEmbed {
        builder.color(self.color);
        if let Some(title) = &self.title {
            builder.title(title);
        }
        if let Some(description) = &self.description {
            builder.description(description);
        }
        for field in &self.fields {
            builder.field(&field.name, &field.value, field.inline);
        }
        if let Some(image) = &self.image {
            builder.image(image);
        }
        if let Some(thumbnail) = &self.thumbnail {
            builder.thumbnail(thumbnail);
        }
        if let Some(footer) = &self.footer {
            builder.footer(|f| f.text(footer));
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_and_error_colors() {
        assert_eq!(Embed::info("ok").color, colors::SUNSHINE_YELLOW);
        assert_eq!(Embed::error("no").color, colors::HOT_PINK_POP);
        assert_eq!(Embed::error("no").description.as_deref(), Some("no"));
    }

    #[test]
    fn test_long_description_is_truncated() {
        let embed = Embed::info("x".repeat(5000));
        let description = embed.description.unwrap();
        assert_eq!(description.chars().count(), 4096);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_field_value_capped() {
        let embed = Embed::info("help").field("Subcommands", "y".repeat(2000), false);
        assert_eq!(embed.fields[0].value.chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn test_apply_to_builds_serenity_embed() {
        let embed = Embed::info("body")
            .title("Help: prefix")
            .field("Usage", "d.prefix [subcommand] [options]", false)
            .footer("footer");
        let mut builder = CreateEmbed::default();
        embed.apply_to(&mut builder);

        assert_eq!(builder.0.get("title").and_then(|v| v.as_str()), Some("Help: prefix"));
        assert_eq!(builder.0.get("description").and_then(|v| v.as_str()), Some("body"));
        let fields = builder.0.get("fields").and_then(|v| v.as_array()).unwrap();
        assert_eq!(fields.len(), 1);
    }
}
