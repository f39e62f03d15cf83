use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{Follower, FollowerId, FollowerProfile, UserIdentity},
    services::providers::MediaService,
};

/// Upper bound on following pages, in case the service never reports the last page
const MAX_FOLLOWING_PAGES: u32 = 500;

/// The accounts the current root user follows
///
/// Every reload bumps `generation`; work started under an older generation must be
/// discarded when it completes.
#[derive(Debug, Default)]
pub struct FollowerDirectory {
    root: Option<UserIdentity>,
    followers: Vec<Follower>,
    generation: u64,
}

impl FollowerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the directory and starts a new generation
    pub fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.root = None;
        self.followers.clear();
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Replaces the follower set; repeated ids keep their first position
    pub fn install(&mut self, root: UserIdentity, profiles: Vec<FollowerProfile>) -> usize {
        let mut seen = HashSet::with_capacity(profiles.len());
        self.followers = profiles
            .into_iter()
            .filter(|p| seen.insert(p.id))
            .map(Follower::new)
            .collect();
        self.root = Some(root);
        self.followers.len()
    }

    pub fn root(&self) -> Option<&UserIdentity> {
        self.root.as_ref()
    }

    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }

    pub fn get(&self, id: FollowerId) -> Option<&Follower> {
        self.followers.iter().find(|f| f.id() == id)
    }

    pub fn get_mut(&mut self, id: FollowerId) -> Option<&mut Follower> {
        self.followers.iter_mut().find(|f| f.id() == id)
    }
}

/// Pages through everyone `user_id` follows until the service reports the last page
pub async fn fetch_following(
    service: &dyn MediaService,
    user_id: FollowerId,
) -> AppResult<Vec<FollowerProfile>> {
    let mut profiles = Vec::new();

    for page in 1..=MAX_FOLLOWING_PAGES {
        let batch = service.list_following(user_id, page).await?;
        profiles.extend(batch.items);

        if !batch.has_next_page {
            return Ok(profiles);
        }
    }

    tracing::warn!(
        user_id = user_id,
        pages = MAX_FOLLOWING_PAGES,
        "Following list truncated at page limit"
    );

    Ok(profiles)
}
