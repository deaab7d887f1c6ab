//! Rule-table advice over a user's recent entries.
//!
//! Each rule is an independent predicate over [`Patterns`] paired with a
//! fixed sentence. Rules are evaluated in table order and every match
//! contributes its sentence, so adding a rule never touches the others.

use crate::models::{CycleEntry, Flow, Mood};

const TOP_SYMPTOMS: usize = 3;
const SAD_MOOD_SHARE: f64 = 0.4;
const HEAVY_FLOW_SHARE: f64 = 0.6;

pub const HEALTHY_PATTERN: &str = "Your cycle data looks healthy! Keep tracking to help me provide more personalized insights. Remember to listen to your body and practice self-care during your cycle.";

/// Frequency summary the rules are evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Patterns {
    pub top_symptoms: Vec<String>,
    pub entries: usize,
    pub sad_days: usize,
    pub heavy_days: usize,
}

impl Patterns {
    pub fn from_entries(entries: &[CycleEntry]) -> Self {
        // Vec keeps first-seen order so the stable sort below breaks ties by it.
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for symptom in entries.iter().flat_map(|e| e.symptoms.iter()) {
            match counts.iter().position(|(s, _)| *s == symptom.as_str()) {
                Some(i) => counts[i].1 += 1,
                None => counts.push((symptom.as_str(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        Patterns {
            top_symptoms: counts
                .into_iter()
                .take(TOP_SYMPTOMS)
                .map(|(s, _)| s.to_string())
                .collect(),
            entries: entries.len(),
            sad_days: entries.iter().filter(|e| e.mood == Mood::Sad).count(),
            heavy_days: entries.iter().filter(|e| e.flow == Flow::Heavy).count(),
        }
    }

    fn has_top_symptom(&self, tag: &str) -> bool {
        self.top_symptoms.iter().any(|s| s == tag)
    }

    fn exceeds(&self, count: usize, share: f64) -> bool {
        count as f64 > self.entries as f64 * share
    }
}

pub struct AdviceRule {
    pub name: &'static str,
    pub applies: fn(&Patterns) -> bool,
    pub sentence: &'static str,
}

pub static RULES: &[AdviceRule] = &[
    AdviceRule {
        name: "cramps",
        applies: |p| p.has_top_symptom("cramps"),
        sentence: "I notice you frequently experience cramps. Try gentle yoga, heat therapy, or magnesium supplements to help manage the pain.",
    },
    AdviceRule {
        name: "mood_swings",
        applies: |p| p.has_top_symptom("mood_swings"),
        sentence: "Your mood patterns suggest hormonal fluctuations. Consider tracking your emotions and practicing mindfulness or meditation.",
    },
    AdviceRule {
        name: "fatigue",
        applies: |p| p.has_top_symptom("fatigue"),
        sentence: "Fatigue seems to be a recurring issue. Ensure you're getting enough iron-rich foods and quality sleep during your cycle.",
    },
    AdviceRule {
        name: "bloating",
        applies: |p| p.has_top_symptom("bloating"),
        sentence: "To help with bloating, try reducing sodium intake and staying hydrated. Gentle movement can also help.",
    },
    AdviceRule {
        name: "low_mood",
        applies: |p| p.exceeds(p.sad_days, SAD_MOOD_SHARE),
        sentence: "I see you've been feeling down during your cycles. This is completely normal, but consider talking to someone you trust or practicing self-care activities.",
    },
    AdviceRule {
        name: "heavy_flow",
        applies: |p| p.exceeds(p.heavy_days, HEAVY_FLOW_SHARE),
        sentence: "You often experience heavy flow. Make sure you're getting enough iron and consider discussing this with your healthcare provider if it's concerning you.",
    },
];

/// Builds the advice text, or `None` when there are fewer than two entries.
pub fn compose_advice(entries: &[CycleEntry]) -> Option<String> {
    compose_with(RULES, entries)
}

pub fn compose_with(rules: &[AdviceRule], entries: &[CycleEntry]) -> Option<String> {
    if entries.len() < 2 {
        return None;
    }

    let patterns = Patterns::from_entries(entries);
    let fired: Vec<&str> = rules
        .iter()
        .filter(|r| (r.applies)(&patterns))
        .inspect(|r| tracing::debug!(rule = r.name, "advice rule fired"))
        .map(|r| r.sentence)
        .collect();

    if fired.is_empty() {
        return Some(HEALTHY_PATTERN.to_string());
    }
    Some(fired.join(" ").trim_end().to_string())
}
