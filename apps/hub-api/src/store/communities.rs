//! In-memory community directory and membership aggregates.
//!
//! Keys are canonical slugs, so "RPG" and "rpg" always land on the same
//! entry. `memberCount` is derived from the member set, which makes
//! repeated joins by the same user naturally idempotent.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::Mutex;

use gamerhub_common::normalize_slug;
use gamerhub_common::wire::CommunitySummary;

/// Genres seeded at startup.
pub const DEFAULT_GENRES: &[(&str, &str)] = &[
    ("action", "Action"),
    ("fps", "FPS"),
    ("indie", "Indie"),
    ("moba", "MOBA"),
    ("rpg", "RPG"),
    ("strategy", "Strategy"),
];

struct CommunityEntry {
    name: String,
    members: HashSet<String>,
}

pub struct CommunityStore {
    entries: DashMap<String, Mutex<CommunityEntry>>,
}

impl CommunityStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn seed(&self, genres: &[(&str, &str)]) {
        for (slug, name) in genres {
            self.insert(slug, name);
        }
    }

    pub fn insert(&self, slug: &str, name: &str) {
        let slug = normalize_slug(slug);
        self.entries.entry(slug).or_insert_with(|| {
            Mutex::new(CommunityEntry {
                name: name.to_string(),
                members: HashSet::new(),
            })
        });
    }

    /// Create the community on first reference. Hubs mentioned by a client
    /// before any seed entry exists get a display name derived from the slug.
    pub fn ensure(&self, slug: &str) {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return;
        }
        let name = display_name(&slug);
        self.entries.entry(slug).or_insert_with(|| {
            Mutex::new(CommunityEntry {
                name,
                members: HashSet::new(),
            })
        });
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(&normalize_slug(slug))
    }

    /// Record a persisted membership. Returns `true` only when the user was
    /// not already a member (the memberCount aggregate moved).
    pub fn add_member(&self, slug: &str, user_id: &str) -> bool {
        self.ensure(slug);
        let slug = normalize_slug(slug);
        match self.entries.get(&slug) {
            Some(entry) => entry.lock().members.insert(user_id.to_string()),
            None => false,
        }
    }

    pub fn member_count(&self, slug: &str) -> Option<i64> {
        let entry = self.entries.get(&normalize_slug(slug))?;
        let count = entry.lock().members.len() as i64;
        Some(count)
    }

    /// Slugs of every community the user belongs to, sorted.
    pub fn communities_of(&self, user_id: &str) -> Vec<String> {
        let mut slugs: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().lock().members.contains(user_id))
            .map(|entry| entry.key().clone())
            .collect();
        slugs.sort();
        slugs
    }

    /// Directory listing, sorted by slug.
    pub fn list(&self) -> Vec<CommunitySummary> {
        let mut communities: Vec<CommunitySummary> = self
            .entries
            .iter()
            .map(|entry| {
                let inner = entry.value().lock();
                CommunitySummary {
                    slug: entry.key().clone(),
                    name: inner.name.clone(),
                    member_count: inner.members.len() as i64,
                }
            })
            .collect();
        communities.sort_by(|a, b| a.slug.cmp(&b.slug));
        communities
    }
}

fn display_name(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
