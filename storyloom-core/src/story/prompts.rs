//! Prompt templates for each story phase

use super::{Character, OutlineEntry, Premise};

pub const PREMISE_SYSTEM: &str = "You are a novelist developing a story idea. \
Reply with a first line of the form `Title: <title>` followed by a premise of two or three paragraphs. \
Do not add commentary.";

pub const CHARACTERS_SYSTEM: &str = "You are a novelist designing a cast. \
Reply with one JSON object per line and nothing else. \
Each object has the keys \"name\", \"role\" and \"description\".";

pub const OUTLINE_SYSTEM: &str = "You are a novelist outlining a book. \
Reply with one JSON object per line and nothing else. \
Each object has the keys \"number\" (starting at 1), \"title\" and \"summary\".";

pub const CHAPTER_SYSTEM: &str = "You are a novelist writing one chapter of a book. \
Write only the chapter prose, without a heading or commentary.";

pub fn premise_prompt(idea: &str) -> String {
    format!("Develop a premise for a story based on this idea:\n\n{}", idea)
}

pub fn characters_prompt(premise: &Premise) -> String {
    format!(
        "Premise:\n{}\n\nCreate the main characters for this story.",
        premise.text
    )
}

pub fn outline_prompt(premise: &Premise, characters: &[Character], chapters: usize) -> String {
    format!(
        "Premise:\n{}\n\nCharacters:\n{}\n\nOutline the story in exactly {} chapters.",
        premise.text,
        cast_list(characters),
        chapters
    )
}

pub fn chapter_prompt(
    premise: &Premise,
    characters: &[Character],
    outline: &[OutlineEntry],
    entry: &OutlineEntry,
    passages: &[String],
) -> String {
    let mut prompt = format!(
        "Premise:\n{}\n\nCharacters:\n{}\n\nOutline:\n{}\n\n",
        premise.text,
        cast_list(characters),
        outline
            .iter()
            .map(|e| format!("{}. {}: {}", e.number, e.title, e.summary))
            .collect::<Vec<_>>()
            .join("\n")
    );

    if !passages.is_empty() {
        prompt.push_str("Style references (match their voice, do not copy them):\n");
        for passage in passages {
            prompt.push_str(&format!("---\n{}\n", passage));
        }
        prompt.push_str("---\n\n");
    }

    prompt.push_str(&format!(
        "Write chapter {}, \"{}\": {}",
        entry.number, entry.title, entry.summary
    ));
    prompt
}

fn cast_list(characters: &[Character]) -> String {
    characters
        .iter()
        .map(|c| format!("- {} ({}): {}", c.name, c.role, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}
