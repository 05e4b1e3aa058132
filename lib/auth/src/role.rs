use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use apex_utils::errors::AppError;

use crate::user::User;

/// Role of whoever sends a request. `Guest` is never stored, it is the role of unauthenticated requesters.
#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum Role {
    Guest = 0,
    Member = 1,
    Moderator = 2,
    Admin = 3,
}

/// Relation between a user and a post or comment they want to report.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ContentRelation {
    /// The user wrote the reported post or comment.
    pub is_author: bool,
    /// The user wrote the post under which the reported comment lives.
    pub is_post_author: bool,
    /// The user moderates the apex containing the content.
    pub is_apex_moderator: bool,
}

/// Either an anonymous guest or an authenticated user.
#[derive(Clone, Debug, PartialEq)]
pub enum Requester {
    Guest,
    User(User),
}

impl Role {
    pub fn is_authenticated(self) -> bool {
        self != Role::Guest
    }

    pub fn check_authenticated(self) -> Result<(), AppError> {
        match self.is_authenticated() {
            true => Ok(()),
            false => Err(AppError::NotAuthenticated),
        }
    }

    /// Apex blocks only gate authenticated access, guests can always list subscribers.
    pub fn check_can_view_subscribers(self, is_blocked_from_apex: bool) -> Result<(), AppError> {
        match (self, is_blocked_from_apex) {
            (Role::Guest, _) => Ok(()),
            (_, true) => Err(AppError::BlockedFromApex),
            (_, false) => Ok(()),
        }
    }

    pub fn check_can_create_apex(self) -> Result<(), AppError> {
        self.check_authenticated()?;
        match self {
            Role::Admin => Ok(()),
            _ => Err(AppError::InsufficientPrivileges),
        }
    }

    pub fn check_can_moderate_apex(self, is_apex_moderator: bool) -> Result<(), AppError> {
        self.check_authenticated()?;
        match (self, is_apex_moderator) {
            (Role::Admin, _) | (_, true) => Ok(()),
            _ => Err(AppError::InsufficientPrivileges),
        }
    }

    pub fn check_can_publish_in_apex(self, is_blocked_from_apex: bool) -> Result<(), AppError> {
        self.check_authenticated()?;
        match is_blocked_from_apex {
            true => Err(AppError::BlockedFromApex),
            false => Ok(()),
        }
    }

    /// Admins, moderators of the apex and authors involved with the content cannot report it.
    pub fn check_can_report(self, relation: ContentRelation) -> Result<(), AppError> {
        self.check_authenticated()?;
        match (self, relation) {
            (Role::Admin, _) => Err(AppError::InsufficientPrivileges),
            (_, ContentRelation { is_apex_moderator: true, .. }) => Err(AppError::InsufficientPrivileges),
            (_, ContentRelation { is_author: true, .. }) | (_, ContentRelation { is_post_author: true, .. }) => Err(AppError::InsufficientPrivileges),
            _ => Ok(()),
        }
    }
}

impl Requester {
    pub fn role(&self) -> Role {
        match self {
            Requester::Guest => Role::Guest,
            Requester::User(user) => user.role,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Requester::Guest => None,
            Requester::User(user) => Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use apex_utils::errors::AppError;

    use crate::role::{ContentRelation, Requester, Role};
    use crate::user::User;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
    }

    #[test]
    fn test_check_can_view_subscribers() {
        // guests are never checked against apex blocks
        assert_eq!(Role::Guest.check_can_view_subscribers(true), Ok(()));
        assert_eq!(Role::Guest.check_can_view_subscribers(false), Ok(()));
        for role in Role::iter().filter(|role| role.is_authenticated()) {
            assert_eq!(role.check_can_view_subscribers(false), Ok(()));
            assert_eq!(role.check_can_view_subscribers(true), Err(AppError::BlockedFromApex));
        }
    }

    #[test]
    fn test_check_can_create_apex() {
        assert_eq!(Role::Guest.check_can_create_apex(), Err(AppError::NotAuthenticated));
        assert_eq!(Role::Member.check_can_create_apex(), Err(AppError::InsufficientPrivileges));
        assert_eq!(Role::Moderator.check_can_create_apex(), Err(AppError::InsufficientPrivileges));
        assert_eq!(Role::Admin.check_can_create_apex(), Ok(()));
    }

    #[test]
    fn test_check_can_moderate_apex() {
        assert_eq!(Role::Guest.check_can_moderate_apex(true), Err(AppError::NotAuthenticated));
        assert_eq!(Role::Member.check_can_moderate_apex(false), Err(AppError::InsufficientPrivileges));
        assert_eq!(Role::Moderator.check_can_moderate_apex(false), Err(AppError::InsufficientPrivileges));
        assert_eq!(Role::Moderator.check_can_moderate_apex(true), Ok(()));
        assert_eq!(Role::Admin.check_can_moderate_apex(false), Ok(()));
    }

    #[test]
    fn test_check_can_publish_in_apex() {
        assert_eq!(Role::Guest.check_can_publish_in_apex(false), Err(AppError::NotAuthenticated));
        assert_eq!(Role::Member.check_can_publish_in_apex(false), Ok(()));
        assert_eq!(Role::Member.check_can_publish_in_apex(true), Err(AppError::BlockedFromApex));
        assert_eq!(Role::Admin.check_can_publish_in_apex(true), Err(AppError::BlockedFromApex));
    }

    #[test]
    fn test_check_can_report() {
        let unrelated = ContentRelation::default();
        assert_eq!(Role::Guest.check_can_report(unrelated), Err(AppError::NotAuthenticated));
        assert_eq!(Role::Member.check_can_report(unrelated), Ok(()));
        assert_eq!(Role::Moderator.check_can_report(unrelated), Ok(()));
        assert_eq!(Role::Admin.check_can_report(unrelated), Err(AppError::InsufficientPrivileges));

        let author = ContentRelation { is_author: true, ..Default::default() };
        let post_author = ContentRelation { is_post_author: true, ..Default::default() };
        let apex_moderator = ContentRelation { is_apex_moderator: true, ..Default::default() };
        for relation in [author, post_author, apex_moderator] {
            assert_eq!(Role::Member.check_can_report(relation), Err(AppError::InsufficientPrivileges));
            assert_eq!(Role::Moderator.check_can_report(relation), Err(AppError::InsufficientPrivileges));
        }
    }

    #[test]
    fn test_requester_role() {
        assert_eq!(Requester::Guest.role(), Role::Guest);
        assert_eq!(Requester::Guest.user(), None);
        let user = User { role: Role::Moderator, ..Default::default() };
        let requester = Requester::User(user.clone());
        assert_eq!(requester.role(), Role::Moderator);
        assert_eq!(requester.user(), Some(&user));
    }
}
