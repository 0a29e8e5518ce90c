//! Fixed replies for when the document has no answer

/// Refusal in English, the pivot language
pub const REFUSAL_EN: &str =
    "I'm sorry, I couldn't find relevant information. Could you please rephrase your question?";

pub const REFUSAL_HI: &str =
    "माफ़ कीजिए, मुझे प्रासंगिक जानकारी नहीं मिली। कृपया अपना प्रश्न दोबारा पूछें।";

/// Nothing usable is published: never ingested, or the saved file failed validation
pub const UNAVAILABLE_EN: &str =
    "The knowledge base is unavailable. Please ingest the document again.";

pub const EMPTY_INPUT_EN: &str = "I didn't catch that. Could you please say it again?";

/// Catalogued refusal for `language`, if there is one
pub fn refusal_for(language: &str) -> Option<&'static str> {
    match language {
        "en" => Some(REFUSAL_EN),
        "hi" => Some(REFUSAL_HI),
        _ => None,
    }
}

/// Reply given when answering failed part way
pub fn apology(error: &str) -> String {
    format!("Sorry, I ran into a problem answering that: {}", error)
}
