//! Message components shared by the message and interaction responders

use serenity::builder::CreateActionRow;
use serenity::model::application::component::ButtonStyle;

use crate::commands::LinkButton;

/// Append one link button per entry, in order
pub fn add_link_buttons<'a>(row: &'a mut CreateActionRow, links: &[LinkButton]) -> &'a mut CreateActionRow {
    for link in links {
        row.create_button(|b| b.style(ButtonStyle::Link).label(&link.label).url(&link.url));
    }
    row
}
