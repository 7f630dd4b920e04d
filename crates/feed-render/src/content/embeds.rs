//! Embed flattening

use feed_core::Embed;

/// Flatten embeds into markdown: a bold title line, then the description,
/// with a blank line between embeds.
pub fn flatten_embeds(embeds: &[Embed]) -> String {
    embeds
        .iter()
        .map(embed_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn embed_markdown(embed: &Embed) -> String {
    let mut md = String::new();
    if let Some(title) = embed.title.as_deref().filter(|t| !t.is_empty()) {
        md.push_str("**");
        md.push_str(title);
        md.push_str("**\n");
    }
    if let Some(description) = embed.description.as_deref().filter(|d| !d.is_empty()) {
        md.push_str(description);
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(title: Option<&str>, description: Option<&str>) -> Embed {
        Embed {
            title: title.map(String::from),
            description: description.map(String::from),
        }
    }

    #[test]
    fn test_single_embed() {
        assert_eq!(
            flatten_embeds(&[embed(Some("News"), Some("Details"))]),
            "**News**\nDetails"
        );
    }

    #[test]
    fn test_partial_embeds() {
        assert_eq!(flatten_embeds(&[embed(Some("Only title"), None)]), "**Only title**\n");
        assert_eq!(flatten_embeds(&[embed(None, Some("Only body"))]), "Only body");
        assert_eq!(flatten_embeds(&[embed(Some(""), None)]), "");
    }

    #[test]
    fn test_embeds_joined_by_blank_line() {
        assert_eq!(
            flatten_embeds(&[embed(Some("A"), Some("a")), embed(Some("B"), Some("b"))]),
            "**A**\na\n\n**B**\nb"
        );
        assert_eq!(flatten_embeds(&[]), "");
    }
}
