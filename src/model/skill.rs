use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

pub const DEFAULT_SKILL_LEVEL: &str = "Intermediate";

/// A named skill with a proficiency level. Two skills are equal when their
/// names match case-insensitively; the level is ignored.
#[derive(Debug, Clone, Serialize)]
pub struct Skill {
    pub name: String,
    pub level: String,
}

impl Skill {
    pub fn new(name: impl Into<String>, level: Option<&str>) -> Self {
        let level = level
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_SKILL_LEVEL);
        Self {
            name: name.into().trim().to_string(),
            level: level.to_string(),
        }
    }

    /// Accepts a bare name or a `{name, level}` object. Anything else, or
    /// an empty name, yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let skill = match value {
            Value::String(name) => Skill::new(name.as_str(), None),
            Value::Object(obj) => {
                let name = obj.get("name").and_then(Value::as_str)?;
                Skill::new(name, obj.get("level").and_then(Value::as_str))
            }
            _ => return None,
        };
        if skill.name.is_empty() {
            None
        } else {
            Some(skill)
        }
    }

    fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for Skill {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Skill {}

impl Hash for Skill {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Normalizes a skills field: an array of mixed entries, or a single entry.
/// The result is de-duplicated.
pub fn normalize_skills(value: &Value) -> Vec<Skill> {
    match value {
        Value::Array(entries) => dedup_skills(entries.iter().filter_map(Skill::from_value)),
        other => Skill::from_value(other).into_iter().collect(),
    }
}

/// Drops later entries whose name matches an earlier one, keeping order.
pub fn dedup_skills(skills: impl IntoIterator<Item = Skill>) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|skill| seen.insert(skill.key()))
        .collect()
}
