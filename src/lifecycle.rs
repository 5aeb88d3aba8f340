// src/lifecycle.rs
//
// Request lifecycle controller. Status transitions are monotonic:
// pending -> {approved, rejected}, approved -> fulfilled; rejected and
// fulfilled are terminal. Approval is the point where inventory is actually
// debited; fulfillment is a pure status/notification step.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AdminContext;
use crate::error::{ApiError, ApiResult};
use crate::inventory;
use crate::models::{NotificationKind, RequestStatus, ResourceRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Approve,
    Reject,
    Fulfill,
}

impl RequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
            RequestAction::Fulfill => "fulfill",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full transition table. Everything not listed is a refusal, and a
/// refusal never mutates anything.
pub fn next_status(current: RequestStatus, action: RequestAction) -> ApiResult<RequestStatus> {
    match (current, action) {
        (RequestStatus::Pending, RequestAction::Approve) => Ok(RequestStatus::Approved),
        (RequestStatus::Pending, RequestAction::Reject) => Ok(RequestStatus::Rejected),
        (RequestStatus::Approved, RequestAction::Fulfill) => Ok(RequestStatus::Fulfilled),
        (from, action) => Err(ApiError::InvalidTransition { from, action }),
    }
}

/// Outcome of a committed decision. `notified` reports the best-effort side
/// effect separately from the authoritative transition: `None` when the
/// transition carries no notification (reject), otherwise whether the
/// notification record was written.
#[derive(Debug, Serialize)]
pub struct DecisionOutcome {
    pub request: ResourceRequest,
    pub notified: Option<bool>,
}

const REQUEST_COLUMNS: &str = "request_id, resource_id, resource_name, quantity, citizen_id, \
     citizen_name, contact_number, city, status, priority, urgency_note, \
     delivery_address, created_at, processed_at, processed_by";

/// Drives a single admin decision on a request.
///
/// The request row is locked for the span of the decision, so concurrent
/// decisions on the same request serialize and exactly one wins; the loser
/// sees the committed status and fails the transition guard. The inventory
/// debit happens inside the same transaction, before the status flip, and
/// an insufficient-stock refusal aborts the whole decision.
pub async fn decide(
    pool: &PgPool,
    admin: &AdminContext,
    request_id: Uuid,
    action: RequestAction,
) -> ApiResult<DecisionOutcome> {
    let mut tx = pool.begin().await?;

    // 1) Load the request inside the admin's city scope and lock it.
    //    Cross-city access is indistinguishable from not-found.
    let sql = format!(
        r#"SELECT {REQUEST_COLUMNS} FROM requests
           WHERE request_id = $1 AND city = $2
           FOR UPDATE"#
    );
    let request = sqlx::query_as::<_, ResourceRequest>(&sql)
        .bind(request_id)
        .bind(&admin.city)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("request"))?;

    // 2) Status guard. A refusal is a no-op.
    let target = next_status(request.status, action)?;

    // 3) Approval debits inventory first; the transition only commits if the
    //    debit was applied.
    if action == RequestAction::Approve {
        inventory::reserve(&mut *tx, &admin.city, request.resource_id, request.quantity).await?;
    }

    // 4) Flip the status. processed_at/processed_by are stamped on the first
    //    transition out of pending and preserved afterwards.
    let sql = format!(
        r#"UPDATE requests
           SET status = $3,
               processed_at = COALESCE(processed_at, now()),
               processed_by = COALESCE(processed_by, $4)
           WHERE request_id = $1 AND city = $2
           RETURNING {REQUEST_COLUMNS}"#
    );
    let updated = sqlx::query_as::<_, ResourceRequest>(&sql)
        .bind(request_id)
        .bind(&admin.city)
        .bind(target)
        .bind(admin.admin_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    // 5) Best-effort notification, after the commit. A failure here is
    //    reported but never rolls back the transition: re-running the whole
    //    approval would double-debit.
    let notified = match action {
        RequestAction::Reject => None,
        RequestAction::Approve => Some(notify(pool, &updated, NotificationKind::Approval).await),
        RequestAction::Fulfill => Some(notify(pool, &updated, NotificationKind::Fulfillment).await),
    };

    Ok(DecisionOutcome {
        request: updated,
        notified,
    })
}

async fn notify(pool: &PgPool, request: &ResourceRequest, kind: NotificationKind) -> bool {
    let (title, message) = match kind {
        NotificationKind::Approval => (
            "Request approved",
            format!(
                "Your request for {} x {} was approved.",
                request.quantity, request.resource_name
            ),
        ),
        NotificationKind::Fulfillment => (
            "Request fulfilled",
            format!(
                "Your request for {} x {} was fulfilled.",
                request.quantity, request.resource_name
            ),
        ),
    };

    let res = sqlx::query(
        r#"
        INSERT INTO notifications
            (notification_id, user_id, title, message, kind, resource_id, request_id, city)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.citizen_id)
    .bind(title)
    .bind(&message)
    .bind(kind)
    .bind(request.resource_id)
    .bind(request.request_id)
    .bind(&request.city)
    .execute(pool)
    .await;

    match res {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                request_id = %request.request_id,
                error = %e,
                "notification write failed; transition already committed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert_eq!(
            next_status(RequestStatus::Pending, RequestAction::Approve).unwrap(),
            RequestStatus::Approved
        );
        assert_eq!(
            next_status(RequestStatus::Pending, RequestAction::Reject).unwrap(),
            RequestStatus::Rejected
        );
        assert_eq!(
            next_status(RequestStatus::Approved, RequestAction::Fulfill).unwrap(),
            RequestStatus::Fulfilled
        );
    }

    #[test]
    fn every_other_pair_is_refused() {
        use RequestAction::*;
        use RequestStatus::*;

        let legal = [(Pending, Approve), (Pending, Reject), (Approved, Fulfill)];
        for from in [Pending, Approved, Rejected, Fulfilled] {
            for action in [Approve, Reject, Fulfill] {
                if legal.contains(&(from, action)) {
                    continue;
                }
                let err = next_status(from, action).unwrap_err();
                assert!(
                    matches!(err, ApiError::InvalidTransition { from: f, action: a }
                        if f == from && a == action),
                    "expected refusal for {from:?} + {action:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        use RequestAction::*;
        for from in [RequestStatus::Rejected, RequestStatus::Fulfilled] {
            for action in [Approve, Reject, Fulfill] {
                assert!(next_status(from, action).is_err());
            }
        }
    }
}
