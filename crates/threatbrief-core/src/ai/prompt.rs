use std::fmt::Write;

use crate::feed::FeedItem;

/// Per-item summary budget inside the prompt
pub const MAX_SUMMARY_CHARS: usize = 2000;

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Characters an item contributes to the prompt, after summary truncation
pub fn prompt_len(item: &FeedItem) -> usize {
    item.title.len()
        + truncate_chars(&item.summary, MAX_SUMMARY_CHARS).len()
        + item.link.len()
        + item.source.len()
}

/// Severity label the model assigns to each reported item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    High,
    Medium,
    Low,
}

impl Criticality {
    pub const ALL: [Criticality; 4] = [
        Criticality::Critical,
        Criticality::High,
        Criticality::Medium,
        Criticality::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Criticality::Critical => "Critical",
            Criticality::High => "High",
            Criticality::Medium => "Medium",
            Criticality::Low => "Low",
        }
    }

    /// Badge background colour; medium and low share a tier
    pub fn color(self) -> &'static str {
        match self {
            Criticality::Critical => "#c0392b",
            Criticality::High => "#e67e22",
            Criticality::Medium | Criticality::Low => "#27ae60",
        }
    }
}

const CARD_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; border: 1px solid #e0e0e0; border-radius: 8px; padding: 20px; margin-bottom: 25px; background-color: #f9f9f9;">
    <h2 style="color: #2c3e50; margin-top: 0;">[ITEM TITLE]</h2>
    <div style="margin-bottom: 10px;">
        <span style="background-color: [BADGE_COLOR]; color: white; padding: 5px 12px; border-radius: 15px; font-weight: bold; font-size: 12px;">CRITICALITY: [LEVEL]</span>
        <span style="margin-left: 10px; color: #7f8c8d; font-size: 12px;">Source: [SOURCE NAME]</span>
    </div>
    <p><b>1. DESCRIPTION:</b> [Detailed technical summary]</p>
    <p><b>2. RECOMMENDATION:</b> [Immediate suggested action]</p>
    <p><b>3. INDICATORS OF COMPROMISE (IoCs):</b> <code style="background: #eee; padding: 2px 5px;">[Technical list, or "None published"]</code></p>
    <div style="margin-top: 15px;">
        <a href="[LINK]" style="background-color: #3498db; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; font-weight: bold; display: inline-block;">View original source &rarr;</a>
    </div>
</div>"#;

/// Build the composite report prompt for an ordered batch of items
pub fn build_prompt(items: &[FeedItem], language: &str) -> String {
    let mut prompt = String::from(
        "You are a Senior Cyber Threat Intelligence Analyst. Turn the news items below \
into a highly readable HTML intelligence report.\n\n\
PRIORITY ORDER (most important first):\n\
1. Banking, fintech, investment and startups.\n\
2. Data breaches, leaked credentials, brute-force and enumeration attacks.\n\
3. Every other sector.\n\n\
REQUIRED HTML FORMAT (follow strictly):\n\
Produce one card per news item, ordered by the priority above, using exactly this structure:\n",
    );
    prompt.push_str(CARD_TEMPLATE);
    prompt.push_str("\n\nCRITICALITY COLOURS (use for [BADGE_COLOR]):\n");
    for level in Criticality::ALL {
        let _ = writeln!(prompt, "- {}: {}", level.label(), level.color());
    }
    let _ = write!(
        prompt,
        "\nWrite the report in {language}. Return only the HTML cards, without \
markdown code fences, <html> or <body> tags.\n\nNEWS ITEMS:\n"
    );

    for (i, item) in items.iter().enumerate() {
        let _ = write!(
            prompt,
            "ID:{} | Title: {} | Summary: {} | Source: {} | Link: {}\n\n",
            i + 1,
            item.title,
            truncate_chars(&item.summary, MAX_SUMMARY_CHARS),
            item.source,
            item.link
        );
    }

    prompt
}
