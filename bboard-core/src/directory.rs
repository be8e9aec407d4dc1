//! Directory: person registration and lookup by username.
//!
//! Components borrow the unit of work mutably and so can never commit or roll
//! it back; that is left to the [`Board`](crate::Board).

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{BoardError, Result};
use crate::models::{NewPerson, PersonId, PersonView, Username};
use crate::store::{PersonRecord, UnitOfWork};

impl From<PersonRecord> for PersonView {
    fn from(record: PersonRecord) -> Self {
        Self {
            name: record.name,
            username: record.username,
            student_id: record.student_id,
        }
    }
}

/// Register a person. The username must not be taken.
pub async fn register<W: UnitOfWork>(work: &mut W, person: &NewPerson) -> Result<PersonId> {
    let username = person.username().as_str();

    if work.find_person(username).await?.is_some() {
        return Err(BoardError::conflict("username", username));
    }

    let id = work
        .insert_person(person.name(), username, person.student_id())
        .await
        .map_err(|e| BoardError::from_store(e, "username", username))?;

    info!(person_id = %id, username, "person registered");
    Ok(id)
}

pub async fn lookup<W: UnitOfWork>(work: &mut W, username: &Username) -> Result<PersonView> {
    work.find_person(username.as_str())
        .await?
        .map(PersonView::from)
        .ok_or_else(|| BoardError::not_found("person", username.as_str()))
}

/// Store identifier of a person, or `NotFound`.
pub async fn resolve_id<W: UnitOfWork>(work: &mut W, username: &Username) -> Result<PersonId> {
    work.find_person(username.as_str())
        .await?
        .map(|p| p.id)
        .ok_or_else(|| BoardError::not_found("person", username.as_str()))
}

/// Name -> username for everyone. People sharing a name collapse to the last
/// username in username order.
pub async fn list_people<W: UnitOfWork>(work: &mut W) -> Result<BTreeMap<String, String>> {
    let mut people = work.list_people().await?;
    people.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(people.into_iter().map(|p| (p.name, p.username)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};

    #[tokio::test]
    async fn register_then_lookup() {
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let ada = NewPerson::new("Ada", "ada", Some("1815")).unwrap();
        let id = register(&mut work, &ada).await.unwrap();

        let username = Username::new("ada").unwrap();
        assert_eq!(resolve_id(&mut work, &username).await.unwrap(), id);
        assert_eq!(
            lookup(&mut work, &username).await.unwrap(),
            PersonView {
                name: "Ada".into(),
                username: "ada".into(),
                student_id: Some("1815".into()),
            }
        );
        work.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let ada = NewPerson::new("Ada", "ada", None).unwrap();
        register(&mut work, &ada).await.unwrap();

        let imposter = NewPerson::new("Not Ada", "ada", None).unwrap();
        assert_eq!(
            register(&mut work, &imposter).await.unwrap_err(),
            BoardError::conflict("username", "ada")
        );
        work.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let ghost = Username::new("ghost").unwrap();
        assert!(matches!(
            resolve_id(&mut work, &ghost).await,
            Err(BoardError::NotFound { resource: "person", .. })
        ));
        work.rollback().await.unwrap();
    }
}
