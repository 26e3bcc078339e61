//! Access policies for lists of budgets and everything nested under them.
//!
//! Handlers resolve the resources named in the path first, so a missing
//! resource is reported as [Error::NotFound], and then check the policies
//! attached to the route with [authorize].

use rusqlite::Connection;

use crate::{Error, UserID, budget_list::BudgetList, share::is_shared_with};

/// What the user wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch or list.
    Read,
    /// Create or update.
    Write,
    /// Delete.
    Delete,
}

/// A rule that a request must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The user owns the list or the list has been shared with them.
    AdmittedOrOwner,
    /// Any action other than delete is allowed. Deleting requires the user
    /// to be the owner of the targeted resource.
    OnlyOwnerDelete,
}

/// A user's request to act on a list or a resource inside it.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    /// The authenticated user.
    pub user: UserID,
    /// What the user wants to do.
    pub action: Action,
    /// The list the resource belongs to.
    pub list: &'a BudgetList,
    /// The owner of the targeted resource. `None` means the list itself is
    /// the target.
    pub resource_owner: Option<UserID>,
}

impl AccessRequest<'_> {
    fn target_owner(&self) -> UserID {
        self.resource_owner.unwrap_or(self.list.owner)
    }
}

/// Whether `user` owns `list` or has been granted access to it.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the share lookup failed.
fn is_admitted_or_owner(
    user: UserID,
    list: &BudgetList,
    connection: &Connection,
) -> Result<bool, Error> {
    if list.owner == user {
        return Ok(true);
    }

    is_shared_with(list.id, user, connection)
}

fn is_allowed(
    policy: Policy,
    request: &AccessRequest,
    connection: &Connection,
) -> Result<bool, Error> {
    match policy {
        Policy::AdmittedOrOwner => is_admitted_or_owner(request.user, request.list, connection),
        Policy::OnlyOwnerDelete => {
            Ok(request.action != Action::Delete || request.user == request.target_owner())
        }
    }
}

/// Check that `request` satisfies every policy in `policies`.
///
/// # Errors
///
/// Returns [Error::Forbidden] if any policy denies the request.
pub fn authorize(
    policies: &[Policy],
    request: &AccessRequest,
    connection: &Connection,
) -> Result<(), Error> {
    for &policy in policies {
        if !is_allowed(policy, request, connection)? {
            tracing::warn!(
                "User {} denied {:?} on list {} by {:?}",
                request.user,
                request.action,
                request.list.id,
                policy
            );
            return Err(Error::Forbidden);
        }
    }

    Ok(())
}
