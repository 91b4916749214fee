//! In-process [`UserStore`] used by service and route tests.
//!
//! Mirrors the `PostgreSQL` store's observable behaviour: unique email and
//! external id, newest-first ordering, case-insensitive search, and cascade
//! of orders and addresses on delete.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use saakie_core::{
    AddressId, Email, ExternalUserId, OrderId, OrderStatus, UserId, UserRole, UserStatus,
};

use super::{RepositoryError, UserStore};
use crate::models::{
    Address, IdentityProfile, NewUser, OrderAggregates, OrderSummary, PageRequest, UserAccount,
    UserChanges, UserDetail, UserFilter, UserPage, UserSummary,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserAccount>,
    orders: Vec<(UserId, OrderSummary)>,
    addresses: Vec<(UserId, Address)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn aggregates(&self, id: UserId) -> OrderAggregates {
        self.orders
            .iter()
            .filter(|(owner, _)| *owner == id)
            .fold(OrderAggregates::default(), |acc, (_, order)| OrderAggregates {
                order_count: acc.order_count + 1,
                total_spent: acc.total_spent + order.total_amount,
            })
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|u| &u.email == email && Some(u.id) != except)
    }
}

fn matches(user: &UserAccount, filter: &UserFilter) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        if !user.name.to_lowercase().contains(&needle)
            && !user.email.as_str().to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    filter.role.is_none_or(|role| user.role == role)
        && filter.status.is_none_or(|status| user.status == status)
}

fn conflict() -> RepositoryError {
    RepositoryError::Conflict("email already exists".to_owned())
}

/// A directory held in memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach an order to `user`.
    pub fn add_order(&self, user: UserId, total_amount: Decimal, status: OrderStatus) -> OrderId {
        let mut tables = self.write();
        let id = OrderId::new(tables.next_id());
        tables.orders.push((
            user,
            OrderSummary {
                id,
                total_amount,
                status,
                created_at: Utc::now(),
            },
        ));
        id
    }

    /// Attach an address to `user`.
    pub fn add_address(&self, user: UserId, city: &str, is_default: bool) -> AddressId {
        let mut tables = self.write();
        let id = AddressId::new(tables.next_id());
        tables.addresses.push((
            user,
            Address {
                id,
                line1: "12 MG Road".to_owned(),
                line2: None,
                city: city.to_owned(),
                state: "Karnataka".to_owned(),
                pincode: "560001".to_owned(),
                country: "India".to_owned(),
                is_default,
            },
        ));
        id
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.read().orders.len()
    }

    #[must_use]
    pub fn address_count(&self) -> usize {
        self.read().addresses.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<UserPage, RepositoryError> {
        let tables = self.read();
        let mut matching: Vec<&UserAccount> =
            tables.users.iter().filter(|u| matches(u, filter)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let users = matching
            .into_iter()
            .skip(offset)
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .map(|account| UserSummary {
                account: account.clone(),
                aggregates: tables.aggregates(account.id),
            })
            .collect();

        Ok(UserPage { users, total })
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| &u.external_id == external_id)
            .cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.read().users.iter().find(|u| &u.email == email).cloned())
    }

    async fn get_detail(&self, id: UserId) -> Result<Option<UserDetail>, RepositoryError> {
        let tables = self.read();
        let Some(account) = tables.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };

        let mut orders: Vec<OrderSummary> = tables
            .orders
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, order)| order.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let addresses = tables
            .addresses
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, address)| address.clone())
            .collect();

        Ok(Some(UserDetail {
            aggregates: tables.aggregates(id),
            account,
            orders,
            addresses,
        }))
    }

    async fn aggregates(&self, id: UserId) -> Result<OrderAggregates, RepositoryError> {
        Ok(self.read().aggregates(id))
    }

    async fn insert(&self, user: &NewUser) -> Result<UserAccount, RepositoryError> {
        let mut tables = self.write();
        if tables.email_taken(&user.email, None) {
            return Err(conflict());
        }
        if tables.users.iter().any(|u| u.external_id == user.external_id) {
            return Err(RepositoryError::Conflict(
                "external id is linked to another account".to_owned(),
            ));
        }

        let now = Utc::now();
        let account = UserAccount {
            id: UserId::new(tables.next_id()),
            external_id: user.external_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            status: user.status,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(account.clone());
        Ok(account)
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<UserAccount>, RepositoryError> {
        let mut tables = self.write();
        if let Some(email) = &changes.email
            && tables.email_taken(email, Some(id))
        {
            return Err(conflict());
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name.clone_from(name);
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            user.phone.clone_from(phone);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.write();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.orders.retain(|(owner, _)| *owner != id);
        tables.addresses.retain(|(owner, _)| *owner != id);
        Ok(true)
    }

    async fn upsert_identity(
        &self,
        profile: &IdentityProfile,
    ) -> Result<(UserAccount, bool), RepositoryError> {
        let existing = self.get_by_external_id(&profile.external_id).await?;
        match existing {
            Some(account) => {
                let changes = UserChanges {
                    name: Some(profile.name.clone()),
                    email: Some(profile.email.clone()),
                    phone: Some(profile.phone.clone()),
                    ..UserChanges::default()
                };
                let updated = self
                    .update(account.id, &changes)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                Ok((updated, false))
            }
            None => {
                let created = self
                    .insert(&NewUser {
                        external_id: profile.external_id.clone(),
                        name: profile.name.clone(),
                        email: profile.email.clone(),
                        phone: profile.phone.clone(),
                        role: UserRole::default(),
                        status: UserStatus::default(),
                    })
                    .await?;
                Ok((created, true))
            }
        }
    }

    async fn delete_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<bool, RepositoryError> {
        let id = self
            .read()
            .users
            .iter()
            .find(|u| &u.external_id == external_id)
            .map(|u| u.id);
        match id {
            Some(id) => self.delete(id).await,
            None => Ok(false),
        }
    }
}
