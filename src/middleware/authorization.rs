//! Role and ownership checks applied inside route handlers.

use crate::helpers::JsonResponse;
use crate::models::{Ticket, User};
use actix_web::Error;

pub fn admin_only(user: &User) -> Result<(), Error> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(JsonResponse::forbidden("Admin access required"))
    }
}

/// Admins see every ticket of their organization, customers only their own.
pub fn can_access_ticket(user: &User, ticket: &Ticket) -> bool {
    ticket.organization_id == user.organization_id
        && (user.is_admin() || ticket.customer_id == user.id)
}

pub fn ticket_access(user: &User, ticket: &Ticket) -> Result<(), Error> {
    if can_access_ticket(user, ticket) {
        Ok(())
    } else {
        // same answer as a missing ticket, ids of other tenants stay hidden
        Err(JsonResponse::not_found("Ticket not found"))
    }
}
