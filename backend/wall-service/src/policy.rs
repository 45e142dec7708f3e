//! Pure authorization rules for the wall.
//!
//! Nothing here touches storage. Callers load the entities, ask for a
//! decision, then perform the write. Every denial carries the reason that
//! ends up in the `Forbidden` response.

use uuid::Uuid;

use crate::domain::Post;

pub const OWNER_CANNOT_LIKE: &str = "owner cannot like own post";
pub const OWNER_CANNOT_COMMENT: &str = "owner cannot comment own post";
pub const ALREADY_LIKED: &str = "already liked";

/// The kinds of interaction a user can have with somebody's post.
///
/// Matches over this enum are exhaustive on purpose: a new kind does not
/// get an implicit allow, it forces every rule site to take a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Like,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { reason: &'static str },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Whether `actor` may edit or delete an entity owned by `owner`.
/// Ownership is the only grant; there are no admin overrides here.
pub fn can_modify(actor: Uuid, owner: Uuid) -> bool {
    actor == owner
}

/// Whether `actor` may interact with `post` in the given way.
///
/// Owners cannot like or comment their own posts, and a like is denied
/// while the actor is already in the post's like set.
pub fn can_interact(actor: Uuid, post: &Post, kind: InteractionKind) -> Decision {
    if post.owner_id == actor {
        let reason = match kind {
            InteractionKind::Like => OWNER_CANNOT_LIKE,
            InteractionKind::Comment => OWNER_CANNOT_COMMENT,
        };
        return Decision::Denied { reason };
    }

    match kind {
        InteractionKind::Like => {
            if post.likes.contains(&actor) {
                return Decision::Denied {
                    reason: ALREADY_LIKED,
                };
            }
            Decision::Allowed
        }
        InteractionKind::Comment => Decision::Allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_owned_by(owner_id: Uuid) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            owner_id,
            title: "title".to_string(),
            description: "description".to_string(),
            location: "somewhere".to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_may_modify_own_entity() {
        let owner = Uuid::new_v4();
        assert!(can_modify(owner, owner));
    }

    #[test]
    fn stranger_may_not_modify() {
        assert!(!can_modify(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn stranger_may_like() {
        let post = post_owned_by(Uuid::new_v4());
        let actor = Uuid::new_v4();
        assert!(can_interact(actor, &post, InteractionKind::Like).is_allowed());
    }

    #[test]
    fn owner_may_not_like_own_post() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner);
        assert_eq!(
            can_interact(owner, &post, InteractionKind::Like),
            Decision::Denied {
                reason: OWNER_CANNOT_LIKE
            }
        );
    }

    #[test]
    fn second_like_is_denied() {
        let actor = Uuid::new_v4();
        let mut post = post_owned_by(Uuid::new_v4());
        post.likes.push(actor);
        assert_eq!(
            can_interact(actor, &post, InteractionKind::Like),
            Decision::Denied {
                reason: ALREADY_LIKED
            }
        );
    }

    #[test]
    fn owner_may_not_comment_own_post() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner);
        assert_eq!(
            can_interact(owner, &post, InteractionKind::Comment),
            Decision::Denied {
                reason: OWNER_CANNOT_COMMENT
            }
        );
    }

    #[test]
    fn stranger_may_comment_repeatedly() {
        let actor = Uuid::new_v4();
        let mut post = post_owned_by(Uuid::new_v4());
        post.comments.push(Uuid::new_v4());
        assert!(can_interact(actor, &post, InteractionKind::Comment).is_allowed());
    }
}
