use std::sync::Arc;

use skill::Skill;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

/// Shared by every request; the skill is immutable once built
#[derive(Clone)]
pub struct AppState {
    pub skill: Arc<Skill>,
}

impl AppState {
    pub fn new(skill: Skill) -> Self {
        Self {
            skill: Arc::new(skill),
        }
    }
}
