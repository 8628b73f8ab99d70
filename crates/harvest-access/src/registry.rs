//! Enumerable role membership.

use std::collections::BTreeMap;

use harvest_types::access::Role;
use harvest_types::snapshot::RoleGrant;
use harvest_types::Address;

use crate::{AccessError, Result};

/// Role membership table. Members of each role are kept in grant order.
#[derive(Clone, Debug, Default)]
pub struct AccessRegistry {
    members: BTreeMap<Role, Vec<Address>>,
}

impl AccessRegistry {
    /// Create a registry whose only member is `admin`, holding `Admin`.
    ///
    /// # Errors
    ///
    /// - [`AccessError::ZeroAccount`] if `admin` is the zero address
    pub fn new(admin: Address) -> Result<Self> {
        if admin.is_zero() {
            return Err(AccessError::ZeroAccount);
        }
        let mut members = BTreeMap::new();
        members.insert(Role::Admin, vec![admin]);
        Ok(Self { members })
    }

    /// Rebuild a registry from persisted grants, preserving their order.
    pub fn from_grants(grants: &[RoleGrant]) -> Self {
        let mut registry = Self::default();
        for grant in grants {
            registry.insert(grant.role, grant.account);
        }
        registry
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|accounts| accounts.contains(account))
    }

    /// Holders of `role`, in grant order.
    pub fn members(&self, role: Role) -> &[Address] {
        self.members
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All grants, role by role, each in grant order.
    pub fn grants(&self) -> Vec<RoleGrant> {
        self.members
            .iter()
            .flat_map(|(role, accounts)| {
                accounts.iter().map(|account| RoleGrant {
                    role: *role,
                    account: *account,
                })
            })
            .collect()
    }

    /// Capability check used by every gated operation.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] if `account` does not hold `role`
    pub fn require(&self, role: Role, account: &Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                role,
                account: *account,
            })
        }
    }

    /// Grant `role` to `account`. Returns whether membership changed.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] if `sender` is not an admin
    /// - [`AccessError::ZeroAccount`] if `account` is the zero address
    pub fn grant(&mut self, sender: &Address, role: Role, account: Address) -> Result<bool> {
        self.require(Role::Admin, sender)?;
        if account.is_zero() {
            return Err(AccessError::ZeroAccount);
        }
        let changed = self.insert(role, account);
        if changed {
            tracing::info!(%role, %account, %sender, "role granted");
        }
        Ok(changed)
    }

    /// Revoke `role` from `account`. Returns whether membership changed.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] if `sender` is not an admin
    pub fn revoke(&mut self, sender: &Address, role: Role, account: &Address) -> Result<bool> {
        self.require(Role::Admin, sender)?;
        let changed = self.remove(role, account);
        if changed {
            tracing::info!(%role, %account, %sender, "role revoked");
        }
        Ok(changed)
    }

    /// Give up `role`. `sender` must be `account`.
    ///
    /// # Errors
    ///
    /// - [`AccessError::RenounceForOther`] if `sender != account`
    pub fn renounce(&mut self, sender: &Address, role: Role, account: &Address) -> Result<bool> {
        if sender != account {
            return Err(AccessError::RenounceForOther {
                sender: *sender,
                account: *account,
            });
        }
        let changed = self.remove(role, account);
        if changed {
            tracing::info!(%role, %account, "role renounced");
        }
        Ok(changed)
    }

    fn insert(&mut self, role: Role, account: Address) -> bool {
        let accounts = self.members.entry(role).or_default();
        if accounts.contains(&account) {
            return false;
        }
        accounts.push(account);
        true
    }

    fn remove(&mut self, role: Role, account: &Address) -> bool {
        let Some(accounts) = self.members.get_mut(&role) else {
            return false;
        };
        let before = accounts.len();
        accounts.retain(|member| member != account);
        accounts.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address::repeat(0xAD);
    const WRITER: Address = Address::repeat(0x57);
    const OTHER: Address = Address::repeat(0x07);

    fn registry() -> AccessRegistry {
        AccessRegistry::new(ADMIN).expect("registry")
    }

    #[test]
    fn test_new_grants_admin() {
        let reg = registry();
        assert!(reg.has_role(Role::Admin, &ADMIN));
        assert_eq!(reg.members(Role::Admin), &[ADMIN]);
        assert!(reg.members(Role::Writer).is_empty());
    }

    #[test]
    fn test_zero_admin_rejected() {
        assert_eq!(
            AccessRegistry::new(Address::ZERO).err(),
            Some(AccessError::ZeroAccount)
        );
    }

    #[test]
    fn test_admin_grants_and_revokes() {
        let mut reg = registry();
        assert!(reg.grant(&ADMIN, Role::Writer, WRITER).expect("grant"));
        assert!(!reg.grant(&ADMIN, Role::Writer, WRITER).expect("regrant is a no-op"));
        assert!(reg.has_role(Role::Writer, &WRITER));

        assert!(reg.revoke(&ADMIN, Role::Writer, &WRITER).expect("revoke"));
        assert!(!reg.revoke(&ADMIN, Role::Writer, &WRITER).expect("re-revoke is a no-op"));
        assert!(!reg.has_role(Role::Writer, &WRITER));
    }

    #[test]
    fn test_non_admin_cannot_grant_or_revoke() {
        let mut reg = registry();
        reg.grant(&ADMIN, Role::Writer, WRITER).expect("grant");

        assert_eq!(
            reg.grant(&WRITER, Role::Writer, OTHER),
            Err(AccessError::Unauthorized {
                role: Role::Admin,
                account: WRITER
            })
        );
        assert!(reg.revoke(&WRITER, Role::Admin, &ADMIN).is_err());
        assert!(reg.has_role(Role::Admin, &ADMIN));
    }

    #[test]
    fn test_admin_manages_admin_role() {
        let mut reg = registry();
        reg.grant(&ADMIN, Role::Admin, OTHER).expect("grant admin");
        reg.revoke(&OTHER, Role::Admin, &ADMIN).expect("new admin revokes old");
        assert_eq!(reg.members(Role::Admin), &[OTHER]);
    }

    #[test]
    fn test_renounce_only_self() {
        let mut reg = registry();
        reg.grant(&ADMIN, Role::Writer, WRITER).expect("grant");

        assert!(matches!(
            reg.renounce(&ADMIN, Role::Writer, &WRITER),
            Err(AccessError::RenounceForOther { .. })
        ));
        assert!(reg.renounce(&WRITER, Role::Writer, &WRITER).expect("renounce"));
        assert!(!reg.has_role(Role::Writer, &WRITER));
    }

    #[test]
    fn test_members_keep_grant_order() {
        let mut reg = registry();
        let accounts: Vec<Address> = (1..=4).map(Address::repeat).collect();
        for account in &accounts {
            reg.grant(&ADMIN, Role::Writer, *account).expect("grant");
        }
        reg.revoke(&ADMIN, Role::Writer, &accounts[1]).expect("revoke");
        assert_eq!(
            reg.members(Role::Writer),
            &[accounts[0], accounts[2], accounts[3]]
        );
    }

    #[test]
    fn test_grants_round_trip() {
        let mut reg = registry();
        reg.grant(&ADMIN, Role::Writer, WRITER).expect("grant");
        reg.grant(&ADMIN, Role::Writer, OTHER).expect("grant");

        let rebuilt = AccessRegistry::from_grants(&reg.grants());
        assert_eq!(rebuilt.members(Role::Admin), reg.members(Role::Admin));
        assert_eq!(rebuilt.members(Role::Writer), &[WRITER, OTHER]);
    }

    #[test]
    fn test_zero_account_cannot_be_granted() {
        let mut reg = registry();
        assert_eq!(
            reg.grant(&ADMIN, Role::Writer, Address::ZERO),
            Err(AccessError::ZeroAccount)
        );
    }
}
