use furrow_types::models::Role;

/// Roles a viewer may target when starting a brand-new conversation.
///
/// One explicit capability table instead of role checks scattered through
/// handlers. It only gates *initiation*: an existing thread may always be
/// continued by either side, and reading is never restricted here.
///
/// - Admins may contact anyone.
/// - Customers may approach growers (product questions) and admins (support).
/// - Growers may approach admins; customers must reach out to a grower first.
pub fn may_start(viewer: Role) -> &'static [Role] {
    match viewer {
        Role::Admin => &[Role::Admin, Role::Grower, Role::Customer],
        Role::Customer => &[Role::Grower, Role::Admin],
        Role::Grower => &[Role::Admin],
    }
}

pub fn may_initiate(viewer: Role, target: Role) -> bool {
    may_start(viewer).contains(&target)
}
