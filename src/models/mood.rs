//! Fixed mood taxonomy shared by every write path and the analytics reader.
//!
//! The table is immutable for the lifetime of the process. Entries snapshot a
//! mood's score at write time, so editing a score here never rewrites history.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mood {
    /// Uppercase lookup key (`HAPPY`).
    #[serde(skip_serializing)]
    pub key: &'static str,
    /// Lowercase identifier stored on entries (`happy`).
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub score: i32,
    pub color: &'static str,
    pub prompt: &'static str,
    pub pixabay_query: &'static str,
}

pub static MOODS: &[Mood] = &[
    Mood {
        key: "HAPPY",
        id: "happy",
        label: "Happy",
        emoji: "😊",
        score: 9,
        color: "amber",
        prompt: "What's making you smile today?",
        pixabay_query: "happy sunshine joy",
    },
    Mood {
        key: "GRATEFUL",
        id: "grateful",
        label: "Grateful",
        emoji: "🙏",
        score: 9,
        color: "emerald",
        prompt: "What are you thankful for today?",
        pixabay_query: "gratitude thankful blessed",
    },
    Mood {
        key: "EXCITED",
        id: "excited",
        label: "Excited",
        emoji: "🤩",
        score: 8,
        color: "orange",
        prompt: "What are you looking forward to?",
        pixabay_query: "excitement celebration fireworks",
    },
    Mood {
        key: "PEACEFUL",
        id: "peaceful",
        label: "Peaceful",
        emoji: "😌",
        score: 8,
        color: "teal",
        prompt: "Where did you find calm today?",
        pixabay_query: "peaceful lake calm",
    },
    Mood {
        key: "HOPEFUL",
        id: "hopeful",
        label: "Hopeful",
        emoji: "🌅",
        score: 7,
        color: "sky",
        prompt: "What gives you hope right now?",
        pixabay_query: "sunrise hope horizon",
    },
    Mood {
        key: "CONTENT",
        id: "content",
        label: "Content",
        emoji: "🙂",
        score: 7,
        color: "green",
        prompt: "What feels just right in your life at the moment?",
        pixabay_query: "cozy relaxing comfort",
    },
    Mood {
        key: "NEUTRAL",
        id: "neutral",
        label: "Neutral",
        emoji: "😐",
        score: 5,
        color: "gray",
        prompt: "How would you describe today in a few words?",
        pixabay_query: "calm still landscape",
    },
    Mood {
        key: "TIRED",
        id: "tired",
        label: "Tired",
        emoji: "😴",
        score: 4,
        color: "slate",
        prompt: "What has been draining your energy?",
        pixabay_query: "tired sleepy rest",
    },
    Mood {
        key: "CONFUSED",
        id: "confused",
        label: "Confused",
        emoji: "😕",
        score: 4,
        color: "violet",
        prompt: "What feels unclear right now?",
        pixabay_query: "confusion fog maze",
    },
    Mood {
        key: "ANXIOUS",
        id: "anxious",
        label: "Anxious",
        emoji: "😰",
        score: 3,
        color: "yellow",
        prompt: "What's weighing on your mind?",
        pixabay_query: "anxiety stress storm",
    },
    Mood {
        key: "SAD",
        id: "sad",
        label: "Sad",
        emoji: "😢",
        score: 3,
        color: "blue",
        prompt: "What's troubling you?",
        pixabay_query: "sad rain lonely",
    },
    Mood {
        key: "FRUSTRATED",
        id: "frustrated",
        label: "Frustrated",
        emoji: "😤",
        score: 2,
        color: "red",
        prompt: "What's been getting in your way?",
        pixabay_query: "frustration tangled knot",
    },
    Mood {
        key: "ANGRY",
        id: "angry",
        label: "Angry",
        emoji: "😠",
        score: 1,
        color: "rose",
        prompt: "What's made you upset?",
        pixabay_query: "anger fire volcano",
    },
];

/// Lookup by the lowercase id stored on entries. Never panics.
pub fn mood_by_id(id: &str) -> Option<&'static Mood> {
    MOODS.iter().find(|m| m.id == id)
}

/// Lookup by a client-supplied key; the key is uppercased before matching.
pub fn mood_by_key(key: &str) -> Option<&'static Mood> {
    let key = key.trim().to_uppercase();
    MOODS.iter().find(|m| m.key == key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Thriving,
    Positive,
    Mixed,
    Struggling,
}

impl MoodTrend {
    pub fn message(&self) -> &'static str {
        match self {
            MoodTrend::Thriving => "You've been feeling great!",
            MoodTrend::Positive => "Your mood has been generally positive",
            MoodTrend::Mixed => "Mixed feelings lately",
            MoodTrend::Struggling => "It's been a challenging time",
        }
    }
}

pub fn mood_trend(average_score: f64) -> MoodTrend {
    if average_score >= 8.0 {
        MoodTrend::Thriving
    } else if average_score >= 6.0 {
        MoodTrend::Positive
    } else if average_score >= 4.0 {
        MoodTrend::Mixed
    } else {
        MoodTrend::Struggling
    }
}
