use serde::{Deserialize, Serialize};

/// Caller role, as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "USER")]
    Customer,
    Owner,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    BookSeats,
    ManageShows,
    ManageAnyBooking,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::BookSeats => true,
            Capability::ManageShows => matches!(self, Role::Owner | Role::Admin),
            Capability::ManageAnyBooking => self == Role::Admin,
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Owners manage their own theatres only; admins manage all of them.
    pub fn manages_theatre(&self, owner_id: i64) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Owner => owner_id == self.user_id,
            Role::Customer => false,
        }
    }

    pub fn may_modify_booking(&self, booking_user_id: i64) -> bool {
        booking_user_id == self.user_id || self.can(Capability::ManageAnyBooking)
    }
}
