//! ChatML prompt builder.
//!
//! Serializes a system instruction, conversation history, and the new user
//! message into one `<|im_start|>`/`<|im_end|>` delimited prompt, ending
//! with an open assistant block the model continues from.

use crate::turn::ConversationTurn;

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";

/// Assemble the full prompt: system block, then a user + assistant block
/// per history turn in order, then the new user block, then an open
/// assistant block with no content.
///
/// Pure and byte-stable: identical inputs yield identical output.
pub fn build_prompt(system: &str, history: &[ConversationTurn], user_message: &str) -> String {
    let mut prompt = String::new();
    push_block(&mut prompt, "system", system);
    for turn in history {
        push_block(&mut prompt, "user", &turn.user);
        push_block(&mut prompt, "assistant", &turn.assistant);
    }
    push_block(&mut prompt, "user", user_message);
    prompt.push_str(IM_START);
    prompt.push_str("assistant\n");
    prompt
}

fn push_block(buf: &mut String, role: &str, content: &str) {
    buf.push_str(IM_START);
    buf.push_str(role);
    buf.push('\n');
    buf.push_str(content);
    buf.push_str(IM_END);
    buf.push('\n');
}
