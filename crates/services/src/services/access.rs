//! Ownership checks used to enable delete controls.
//!
//! This is advisory: the delete statement itself is scoped to the owner, so
//! a client that ignores this flag still cannot remove someone else's row.

use db::models::training_session::{SessionWithProfile, TrainingSession};
use uuid::Uuid;

/// Anything that belongs to exactly one user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for TrainingSession {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for SessionWithProfile {
    fn owner_id(&self) -> Uuid {
        self.session.user_id
    }
}

/// True only when someone is signed in and they own `item`
pub fn can_delete<T: Owned + ?Sized>(item: &T, current_user: Option<Uuid>) -> bool {
    current_user.is_some_and(|id| id == item.owner_id())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use db::models::{profile::Profile, training_session::GiType};

    use super::*;

    fn owned_by(user_id: Uuid) -> TrainingSession {
        TrainingSession {
            id: Uuid::new_v4(),
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            gym: "Gym".to_string(),
            gi_type: GiType::Nogi,
            duration_min: 60,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn anonymous_cannot_delete() {
        assert!(!can_delete(&owned_by(Uuid::new_v4()), None));
    }

    #[test]
    fn other_user_cannot_delete() {
        assert!(!can_delete(&owned_by(Uuid::new_v4()), Some(Uuid::new_v4())));
    }

    #[test]
    fn owner_can_delete() {
        let owner = Uuid::new_v4();
        assert!(can_delete(&owned_by(owner), Some(owner)));
    }

    #[test]
    fn joined_rows_use_session_owner() {
        let owner = Uuid::new_v4();
        let joined = SessionWithProfile {
            session: owned_by(owner),
            profile: Profile {
                id: owner,
                display_name: "Ana".to_string(),
                created_at: Utc::now(),
            },
        };
        assert!(can_delete(&joined, Some(owner)));
        assert!(!can_delete(&joined, Some(Uuid::nil())));
    }
}
