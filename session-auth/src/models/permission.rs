//! Capability model - the closed set of grants a role can carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protected capabilities. Each one maps to exactly one flag on [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ManageRoles,
    ManageUsers,
    ManageVeterinarians,
    ManageVaccines,
    ManageFood,
    ManagePets,
    DumpDatabase,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageRoles => "manage-roles",
            Capability::ManageUsers => "manage-users",
            Capability::ManageVeterinarians => "manage-veterinarians",
            Capability::ManageVaccines => "manage-vaccines",
            Capability::ManageFood => "manage-food",
            Capability::ManagePets => "manage-pets",
            Capability::DumpDatabase => "dump-database",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|cap| cap.as_str() == s)
    }

    pub fn all() -> &'static [Capability] {
        &[
            Capability::ManageRoles,
            Capability::ManageUsers,
            Capability::ManageVeterinarians,
            Capability::ManageVaccines,
            Capability::ManageFood,
            Capability::ManagePets,
            Capability::DumpDatabase,
        ]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role as seen by the session layer. Mutation happens in the repository layer only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub manage_roles: bool,
    #[serde(default)]
    pub manage_users: bool,
    #[serde(default)]
    pub manage_veterinarians: bool,
    #[serde(default)]
    pub manage_vaccines: bool,
    #[serde(default)]
    pub manage_food: bool,
    #[serde(default)]
    pub manage_pets: bool,
    #[serde(default)]
    pub dump_database: bool,
}

impl Role {
    /// A role with no capabilities.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style grant, used when seeding roles.
    pub fn with(mut self, capability: Capability) -> Self {
        *self.flag_mut(capability) = true;
        self
    }

    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageRoles => self.manage_roles,
            Capability::ManageUsers => self.manage_users,
            Capability::ManageVeterinarians => self.manage_veterinarians,
            Capability::ManageVaccines => self.manage_vaccines,
            Capability::ManageFood => self.manage_food,
            Capability::ManagePets => self.manage_pets,
            Capability::DumpDatabase => self.dump_database,
        }
    }

    /// Capabilities this role grants, in declaration order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::all()
            .iter()
            .copied()
            .filter(|cap| self.grants(*cap))
            .collect()
    }

    fn flag_mut(&mut self, capability: Capability) -> &mut bool {
        match capability {
            Capability::ManageRoles => &mut self.manage_roles,
            Capability::ManageUsers => &mut self.manage_users,
            Capability::ManageVeterinarians => &mut self.manage_veterinarians,
            Capability::ManageVaccines => &mut self.manage_vaccines,
            Capability::ManageFood => &mut self.manage_food,
            Capability::ManagePets => &mut self.manage_pets,
            Capability::DumpDatabase => &mut self.dump_database,
        }
    }
}

/// True when `role` grants every capability in `caps`. An empty request is trivially satisfied.
pub fn has_all(role: &Role, caps: &[Capability]) -> bool {
    caps.iter().all(|cap| role.grants(*cap))
}

/// True when `role` grants at least one capability in `caps`.
pub fn has_any(role: &Role, caps: &[Capability]) -> bool {
    caps.iter().any(|cap| role.grants(*cap))
}

/// True when a single role in `roles` grants all of `caps`.
///
/// Flags are never unioned across roles: holding `A` through one role and `B`
/// through another does not satisfy a request for `A` and `B`.
pub fn any_role_has_all(roles: &[Role], caps: &[Capability]) -> bool {
    roles.iter().any(|role| has_all(role, caps))
}

/// True when some role in `roles` grants at least one of `caps`.
pub fn any_role_has_any(roles: &[Role], caps: &[Capability]) -> bool {
    roles.iter().any(|role| has_any(role, caps))
}

/// Permission predicate attached to a protected endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// One role must grant every listed capability.
    All(Vec<Capability>),
    /// Some role must grant at least one listed capability.
    Any(Vec<Capability>),
}

impl Requirement {
    pub fn all(caps: &[Capability]) -> Self {
        Requirement::All(caps.to_vec())
    }

    pub fn any(caps: &[Capability]) -> Self {
        Requirement::Any(caps.to_vec())
    }

    pub fn is_satisfied_by(&self, roles: &[Role]) -> bool {
        match self {
            Requirement::All(caps) => any_role_has_all(roles, caps),
            Requirement::Any(caps) => any_role_has_any(roles, caps),
        }
    }
}
