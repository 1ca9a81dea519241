use serde_json::{json, Value};

use super::ActionContext;
use crate::backend::{BackendError, Filter};
use crate::model::raw::RawRecord;
use crate::model::skill::{dedup_skills, normalize_skills, Skill};

pub const PROFILES: &str = "profiles";

pub async fn fetch_skills(ctx: &ActionContext) -> Result<Vec<Skill>, BackendError> {
    let filter = Filter::by_id(ctx.user_id()).columns("id,skills");
    let rows = ctx.call(ctx.backend.select(PROFILES, &filter)).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("skills"))
        .map(normalize_skills)
        .unwrap_or_default())
}

/// Replaces the profile's skills with `skills`, de-duplicated by name.
pub async fn save_skills(ctx: &ActionContext, skills: Vec<Skill>) -> Option<Vec<Skill>> {
    let skills = dedup_skills(skills);
    let encoded: Vec<Value> = skills
        .iter()
        .map(|s| json!({ "name": s.name, "level": s.level }))
        .collect();
    let patch = RawRecord::new().with("skills", encoded);
    let filter = Filter::by_id(ctx.user_id());
    let count = skills.len();
    ctx.act("save skills", ctx.backend.update(PROFILES, &filter, patch), |_| {
        format!("Saved {count} skills")
    })
    .await
    .map(|row| row.get("skills").map(normalize_skills).unwrap_or_default())
}
