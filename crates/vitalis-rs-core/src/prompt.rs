//! System prompt assembly for conversation turns.

use chrono::{DateTime, Local};

/// Base instructions for the health assistant; `{user_info}` and `{time}` are filled per turn.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Vitalis, an AI health assistant that helps users make healthier lifestyle choices through personalized, data-driven insights.

Your role is to:
1. Analyze the user's health data (steps, heart rate, sleep, goals)
2. Provide personalized, actionable health insights
3. Ask follow-up questions to understand user needs better
4. Offer helpful suggestions and nudges
5. Build trust through ongoing dialogue

Current user context:
{user_info}

System Time: {time}

Remember to:
- Be encouraging and supportive
- Provide specific, actionable advice based on their health data
- Ask clarifying questions when needed
- Reference the user's actual data when available
- Suggest realistic next steps
- Maintain a conversational, friendly tone";

/// Instruction for the structured memory evaluation call.
pub const DEFAULT_MEMORY_EVALUATION_PROMPT: &str = "You decide whether the latest exchange contains information worth saving to the user's long-term memory.

Answer with exactly one verdict:
- STORE: the user shared new, durable facts about themselves (name, goals, health conditions, preferences, routines, progress).
- EXPLICIT: the user directly asked you to remember, note or save something.
- SKIP: greetings, small talk, questions, or facts that were already known.

When unsure, answer SKIP.";

const MEMORY_BLOCK_HEADER: &str = "\n\n**IMPORTANT - USER MEMORIES & PREVIOUS CONTEXT:**\nYou have stored the following information about this user. Use this context to provide personalized, continuous responses:\n";
const MEMORY_BLOCK_FOOTER: &str = "\n\n**CRITICAL:** Based on these memories, DO NOT greet the user as if meeting for the first time. Continue the conversation naturally based on previous interactions and their established goals.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wrap memory bullets in the prompt section; empty input yields an empty block.
pub fn memory_block(bullets: &[String]) -> String {
    if bullets.is_empty() {
        return String::new();
    }
    format!(
        "{MEMORY_BLOCK_HEADER}{}{MEMORY_BLOCK_FOOTER}",
        bullets.join("\n")
    )
}

/// Fill the template placeholders and append the memory block.
pub fn build_system_prompt(
    template: &str,
    user_id: &str,
    now: DateTime<Local>,
    memory_block: &str,
) -> String {
    let filled = template
        .replace("{user_info}", &format!("User ID: {user_id}"))
        .replace("{time}", &now.format(TIME_FORMAT).to_string());
    format!("{filled}{memory_block}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholders_are_filled() {
        let now = Local
            .with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
            .single()
            .expect("valid time");
        let prompt = build_system_prompt("who: {user_info} at {time}", "u-7", now, "");
        assert_eq!(prompt, "who: User ID: u-7 at 2024-06-01 09:30:00");
    }

    #[test]
    fn memory_block_is_empty_without_bullets() {
        assert_eq!(memory_block(&[]), "");
    }

    #[test]
    fn memory_block_lists_bullets_between_header_and_footer() {
        let block = memory_block(&["- User's name is Sam".to_string(), "- Walks daily".to_string()]);
        assert!(block.starts_with("\n\n**IMPORTANT - USER MEMORIES"));
        assert!(block.contains("responses:\n- User's name is Sam\n- Walks daily\n\n**CRITICAL:**"));
        let prompt = build_system_prompt(DEFAULT_SYSTEM_PROMPT, "u", Local::now(), &block);
        assert!(prompt.ends_with(MEMORY_BLOCK_FOOTER));
        assert!(!prompt.contains("{user_info}"));
    }

    #[test]
    fn memory_block_text_is_exact() {
        let block = memory_block(&["- Goal: 10000 steps".to_string()]);
        assert_eq!(
            block,
            "\n\n**IMPORTANT - USER MEMORIES & PREVIOUS CONTEXT:**\n\
             You have stored the following information about this user. \
             Use this context to provide personalized, continuous responses:\n\
             - Goal: 10000 steps\n\n\
             **CRITICAL:** Based on these memories, DO NOT greet the user as if meeting \
             for the first time. Continue the conversation naturally based on previous \
             interactions and their established goals."
        );
    }
}
