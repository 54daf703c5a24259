use uuid::Uuid;

use crate::domain::catalog::validate_name;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{normalize_email, NewUser, User, UserPatch};
use crate::realtime::{Action, ChangeEvent, ChangeFeed, Table};

pub struct UserService<R> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.repo.list()
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn create_user(&self, user: NewUser) -> Result<Uuid, DomainError> {
        let user = NewUser {
            email: normalize_email(&user.email)?,
            full_name: validate_name(&user.full_name)?,
            role: user.role,
        };
        let id = self.repo.create(&user)?;
        log::info!("created {} user {id}", user.role);
        self.notify(Action::Insert, id);
        Ok(id)
    }

    pub fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DomainError> {
        let patch = UserPatch {
            full_name: patch.full_name.as_deref().map(validate_name).transpose()?,
            ..patch
        };
        if !self.repo.update(id, &patch)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Action::Update, id);
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    pub fn delete_user(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound);
        }
        log::info!("deleted user {id}");
        self.notify(Action::Delete, id);
        Ok(())
    }

    fn notify(&self, action: Action, id: Uuid) {
        self.feed
            .publish(ChangeEvent::new(Table::Users, action, id));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::UserService;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::UserRepository;
    use crate::domain::user::{NewUser, Role, User, UserPatch};
    use crate::realtime::ChangeFeed;

    #[derive(Default)]
    struct InMemoryUsers {
        users: Mutex<Vec<User>>,
    }

    impl UserRepository for InMemoryUsers {
        fn list(&self) -> Result<Vec<User>, DomainError> {
            Ok(self.users.lock().expect("lock").clone())
        }

        fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .expect("lock")
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        fn create(&self, user: &NewUser) -> Result<Uuid, DomainError> {
            let mut users = self.users.lock().expect("lock");
            if users.iter().any(|u| u.email == user.email) {
                return Err(DomainError::Conflict("email already registered".into()));
            }
            let id = Uuid::new_v4();
            users.push(User {
                id,
                email: user.email.clone(),
                full_name: user.full_name.clone(),
                role: user.role,
                active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            Ok(id)
        }

        fn update(&self, id: Uuid, patch: &UserPatch) -> Result<bool, DomainError> {
            let mut users = self.users.lock().expect("lock");
            let Some(user) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(false);
            };
            if let Some(name) = &patch.full_name {
                user.full_name = name.clone();
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            if let Some(active) = patch.active {
                user.active = active;
            }
            Ok(true)
        }

        fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut users = self.users.lock().expect("lock");
            let before = users.len();
            users.retain(|u| u.id != id);
            Ok(users.len() < before)
        }
    }

    fn service() -> UserService<InMemoryUsers> {
        UserService::new(InMemoryUsers::default(), ChangeFeed::default())
    }

    fn giulia() -> NewUser {
        NewUser {
            email: " Giulia@Lavanderia.IT".into(),
            full_name: "Giulia Verdi".into(),
            role: Role::Operator,
        }
    }

    #[test]
    fn email_is_normalized_and_unique() {
        let svc = service();
        let id = svc.create_user(giulia()).expect("create");
        let user = svc.get_user(id).expect("get").expect("exists");
        assert_eq!(user.email, "giulia@lavanderia.it");

        let err = svc
            .create_user(NewUser {
                email: "giulia@lavanderia.it".into(),
                ..giulia()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_changes_role_and_deactivates() {
        let svc = service();
        let id = svc.create_user(giulia()).expect("create");
        let user = svc
            .update_user(
                id,
                UserPatch {
                    role: Some(Role::Admin),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(user.role, Role::Admin);
        assert!(!user.active);
        assert_eq!(user.full_name, "Giulia Verdi");
    }

    #[test]
    fn blank_full_name_is_rejected() {
        let svc = service();
        let id = svc.create_user(giulia()).expect("create");
        let err = svc
            .update_user(
                id,
                UserPatch {
                    full_name: Some("  ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(matches!(
            svc.delete_user(Uuid::new_v4()),
            Err(DomainError::NotFound)
        ));
    }
}
