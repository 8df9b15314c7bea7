use crate::{error::AppError, model::role::Role};

/// Everything a protected operation may ask permission for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    ReadProfile,
    UpdateProfile,
    ManageUsers,
    ViewAllAttendance,
    ViewAllLeaveRequests,
    DecideLeave,
    ManageLeaveBalances,
}

impl Capability {
    /// Owner-scoped capabilities are granted to the resource owner as well as
    /// to admins. The rest are admin only.
    fn owner_scoped(self) -> bool {
        matches!(self, Capability::ReadProfile | Capability::UpdateProfile)
    }
}

pub fn authorize(
    role: Role,
    caller_id: u64,
    owner_id: Option<u64>,
    capability: Capability,
) -> Result<(), AppError> {
    if role.is_admin() {
        return Ok(());
    }

    if capability.owner_scoped() && owner_id == Some(caller_id) {
        return Ok(());
    }

    Err(AppError::Forbidden(if capability.owner_scoped() {
        "Access denied".into()
    } else {
        "Admin only".into()
    }))
}
