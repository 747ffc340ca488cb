//! Internal Diesel row structs.
//!
//! Never exposed to the domain; repositories convert rows into entities at
//! the adapter boundary.

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::IdentityPersistenceError;
use crate::domain::{
    AuthorizedKeyEntry, AuthorizedKeyEntryId, AuthorizedKeyOptions, Domain, DomainId, Host,
    HostId, PublicKey, User, UserId,
};

use super::schema::{authorized_keys, domains, hosts, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = domains)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DomainRow {
    pub id: Uuid,
    pub name: String,
    pub comment: Option<String>,
}

impl From<DomainRow> for Domain {
    fn from(row: DomainRow) -> Self {
        Self {
            id: DomainId::from_uuid(row.id),
            name: row.name,
            comment: row.comment,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = domains)]
pub(crate) struct NewDomainRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hosts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HostRow {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub name: String,
    pub comment: Option<String>,
}

impl From<HostRow> for Host {
    fn from(row: HostRow) -> Self {
        Self {
            id: HostId::from_uuid(row.id),
            domain_id: DomainId::from_uuid(row.domain_id),
            name: row.name,
            comment: row.comment,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = hosts)]
pub(crate) struct NewHostRow<'a> {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub name: &'a str,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub name: String,
    pub pub_key: String,
    pub comment: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityPersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let pub_key = PublicKey::new(row.pub_key).map_err(|err| {
            IdentityPersistenceError::query(format!("invalid public key stored for {}: {err}", row.id))
        })?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            host_id: HostId::from_uuid(row.host_id),
            name: row.name,
            pub_key,
            comment: row.comment,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub host_id: Uuid,
    pub name: &'a str,
    pub pub_key: &'a str,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = authorized_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuthorizedKeyRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub authed_user_id: Uuid,
    pub options: Option<String>,
}

impl TryFrom<AuthorizedKeyRow> for AuthorizedKeyEntry {
    type Error = IdentityPersistenceError;

    fn try_from(row: AuthorizedKeyRow) -> Result<Self, Self::Error> {
        let options = row
            .options
            .map(AuthorizedKeyOptions::new)
            .transpose()
            .map_err(|err| {
                IdentityPersistenceError::query(format!(
                    "invalid options stored for authorized key {}: {err}",
                    row.id
                ))
            })?;
        Ok(Self {
            id: AuthorizedKeyEntryId::new(row.id),
            owner: UserId::from_uuid(row.owner_id),
            authed_user: UserId::from_uuid(row.authed_user_id),
            options,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = authorized_keys)]
pub(crate) struct NewAuthorizedKeyRow<'a> {
    pub owner_id: Uuid,
    pub authed_user_id: Uuid,
    pub options: Option<&'a str>,
}
