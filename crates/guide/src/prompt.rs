//! Prompt text for the content panel and the analytics overlay.

pub fn brief_system_prompt() -> &'static str {
    "You are a concise, friendly travel writer. Answer in Markdown with short \
     sections and bullet points. Do not invent visa rules or prices; say when \
     travellers should check official sources."
}

/// User prompt for the travel brief shown when a country is selected.
pub fn brief_prompt(country: &str) -> String {
    format!(
        "Write a travel brief for {country}.\n\
         Include these sections:\n\
         1. Overview (two or three sentences)\n\
         2. Best time to visit\n\
         3. Top highlights (five bullet points)\n\
         4. Food to try\n\
         5. Practical tips (currency, language, getting around)"
    )
}

/// System prompt that keeps the chat assistant on the selected country.
pub fn chat_system_prompt(country: &str) -> String {
    format!(
        "You are a travel assistant for {country}. Answer questions about travelling \
         in {country}: places, culture, food, seasons, transport and etiquette. If the \
         user asks about something unrelated to {country}, briefly steer the \
         conversation back to {country}. Keep answers under 200 words."
    )
}

/// Asks for a ranking time series as a single JSON object.
pub fn bar_race_prompt(topic: &str, periods: u32, entries: u32) -> String {
    format!(
        "Create an illustrative ranking dataset for a bar chart race about: {topic}.\n\
         Use {periods} consecutive periods and the same {entries} entries in every period.\n\
         Respond with only a JSON object of this shape, no commentary:\n\
         {{\"title\": string, \"unit\": string, \"frames\": [{{\"period\": string, \
         \"entries\": [{{\"label\": string, \"value\": number}}]}}]}}\n\
         Values must be non-negative numbers. Frames must be in chronological order."
    )
}

#[cfg(test)]
mod tests {
    use super::{bar_race_prompt, brief_prompt, chat_system_prompt};

    #[test]
    fn prompts_name_the_country() {
        assert!(brief_prompt("Peru").contains("travel brief for Peru"));
        let system = chat_system_prompt("Peru");
        assert!(system.starts_with("You are a travel assistant for Peru."));
        assert_eq!(system.matches("Peru").count(), 4);
    }

    #[test]
    fn bar_race_prompt_spells_out_the_json_shape() {
        let p = bar_race_prompt("tourist arrivals in Europe", 8, 10);
        assert!(p.contains("8 consecutive periods"));
        assert!(p.contains("same 10 entries"));
        assert!(p.contains("{\"title\": string"));
    }
}
