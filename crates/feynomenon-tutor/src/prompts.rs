//! Fixed texts sent to the model or shown to the learner.

pub const GREETING: &str =
    "Hello! I'm here to help you learn. What topic or concept are you curious about today?";

/// Sent when the learner ends a tutoring session.
pub const FAREWELL: &str = "Thanks for learning with me today! Goodbye!";

/// Console farewell when the learner leaves before choosing a topic.
pub const TOPIC_PHASE_FAREWELL: &str = "Goodbye! Thanks for stopping by.";

pub const INTERRUPTED: &str = "Session interrupted. Goodbye!";

/// Inputs that end a session without contacting the model.
pub const TERMINATION_WORDS: [&str; 3] = ["quit", "exit", "stop"];

pub const TOPIC_GATHERING_INSTRUCTIONS: &str = "\
You are a friendly and curious AI assistant. Your goal is to understand what topic or general theme the user wants to learn about.
Engage them in a brief, conversational way to pinpoint their interest.
Once you have a clear topic, confirm it with the user and clearly state the chosen topic.
Examples:
- \"What exciting concept would you like to unravel today?\"
- \"I'm ready to explore! What subject is on your mind?\"
- \"Let's discover something new. What's the main idea you're curious about?\"
";

/// System instructions for the tutoring conversation about `topic`.
pub fn feynman_instructions(topic: &str) -> String {
    format!(
        "You are an AI tutor specializing in the Feynman Technique for learning about {topic}.
Your process should be:
1.  **Explain:** Provide a clear, simple explanation of the concept for {topic} as if explaining it to a 5-year-old.
2.  **Quiz & Simplify:** After your explanation, immediately ask the user a probing question to check their understanding or identify potential areas of confusion. For example: \"Does that make sense, or should I simplify the part about [specific sub-concept]?\" or \"Can you rephrase that in your own words?\"
3.  **Iterate:** If the user struggles or asks for simplification, re-explain the concept (or the difficult part) in an even simpler way or using a different analogy. If they show understanding, offer to explain at a slightly more advanced level (e.g., for a high schooler or university student), followed by another quiz.
4.  **Stay on topic:** Only discuss {topic}. If the user deviates, gently bring them back.
5.  **Be encouraging and patient.**
"
    )
}

/// First user turn of the tutoring conversation.
pub fn bootstrap_prompt(topic: &str) -> String {
    format!("Please begin explaining {topic} using the Feynman technique.")
}

pub fn topic_announcement(topic: &str) -> String {
    format!(
        "Great! So, your chosen topic is: **{topic}**. Let's begin our Feynman technique learning journey."
    )
}

/// True when `text`, trimmed and compared case-insensitively, is a
/// termination word.
pub fn is_termination(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    TERMINATION_WORDS.contains(&text.as_str())
}
