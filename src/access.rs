use crate::error::AccessError;
use crate::models::{CollectionName, Role, Session};

// The vote tally is public; the voter roll is not
pub fn authorize_collection(session: &Session, name: CollectionName) -> Result<(), AccessError> {
    match (name, session.role) {
        (CollectionName::Votes, _) | (CollectionName::Voters, Role::Admin) => Ok(()),
        (CollectionName::Voters, role) => Err(AccessError::Forbidden {
            role,
            action: format!("watch {}", name),
        }),
    }
}

pub fn authorize_admin(session: &Session, action: &str) -> Result<(), AccessError> {
    match session.role {
        Role::Admin => Ok(()),
        role => Err(AccessError::Forbidden {
            role,
            action: action.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_may_watch_votes() {
        for role in [Role::Voter, Role::Admin] {
            assert!(authorize_collection(&Session::new("u", role), CollectionName::Votes).is_ok());
        }
    }

    #[test]
    fn only_admins_may_watch_voters() {
        let voter = Session::new("u", Role::Voter);
        let err = authorize_collection(&voter, CollectionName::Voters).unwrap_err();
        assert_eq!(err.to_string(), "Role voter may not watch voters");
        assert!(authorize_collection(&Session::new("a", Role::Admin), CollectionName::Voters).is_ok());
    }

    #[test]
    fn admin_actions_need_the_admin_role() {
        assert!(authorize_admin(&Session::new("u", Role::Voter), "approve voters").is_err());
        assert!(authorize_admin(&Session::new("a", Role::Admin), "approve voters").is_ok());
    }
}
