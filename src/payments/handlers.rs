use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateIntentRequest, VerifyPaymentRequest, VerifyPaymentResponse, CURRENCY},
    gateway::PaymentIntent,
    signature::verify_signature,
};
use crate::{auth::extractors::AuthUser, error::ApiError, orders::services, state::AppState};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payment/create-order", post(create_order))
        .route("/payment/verify-payment", post(verify_payment))
}

fn receipt_id(now: OffsetDateTime) -> String {
    format!("receipt_{}", now.unix_timestamp_nanos() / 1_000_000)
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let amount = payload.amount_minor()?;
    let receipt = receipt_id(OffsetDateTime::now_utc());
    let intent = state
        .gateway
        .create_intent(amount, CURRENCY, &receipt)
        .await
        .map_err(ApiError::Gateway)?;
    info!(%user_id, intent_id = %intent.id, amount, "payment intent created");
    Ok(Json(intent))
}

#[instrument(skip(state, payload))]
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let order_id = payload.validate()?;
    if !verify_signature(
        &state.config.razorpay.key_secret,
        &payload.razorpay_order_id,
        &payload.razorpay_payment_id,
        &payload.razorpay_signature,
    ) {
        warn!(%user_id, %order_id, intent_id = %payload.razorpay_order_id, "payment signature mismatch");
        return Err(ApiError::InvalidSignature);
    }

    services::mark_paid_online(&state, user_id, order_id).await?;
    info!(
        %user_id,
        %order_id,
        payment_id = %payload.razorpay_payment_id,
        "online payment verified"
    );
    Ok(Json(VerifyPaymentResponse {
        message: "Payment verified successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{
        lifecycle::{Decision, PaymentMethod},
        repo_types::{NewOrder, NewOrderItem},
    };
    use crate::payments::signature::expected_signature;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[test]
    fn receipt_uses_unix_millis() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(receipt_id(at), "receipt_1700000000000");
    }

    #[tokio::test]
    async fn create_order_sizes_intent_in_paise() {
        let state = AppState::fake();
        let user = AuthUser(Uuid::new_v4());
        let Json(intent) = create_order(
            State(state),
            user,
            Json(CreateIntentRequest { amount: Some(20) }),
        )
        .await
        .unwrap();
        assert_eq!(intent.amount, 2000);
        assert_eq!(intent.currency, "INR");
        assert!(intent.receipt.unwrap().starts_with("receipt_"));
    }

    #[tokio::test]
    async fn bad_signature_fails_before_touching_the_order() {
        let state = AppState::fake();
        let user = AuthUser(Uuid::new_v4());
        let err = verify_payment(
            State(state),
            user,
            Json(VerifyPaymentRequest {
                razorpay_order_id: "order_1".into(),
                razorpay_payment_id: "pay_1".into(),
                razorpay_signature: "deadbeef".into(),
                db_order_id: Some(Uuid::new_v4()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidSignature));
    }

    async fn accepted_order(state: &AppState) -> (Uuid, Uuid) {
        let owner: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password_hash, branch, role)
            VALUES ('Asha', 'asha@ssbs.sies.edu.in', 'x', 'IT', 'student')
            RETURNING id
            "#,
        )
        .fetch_one(&state.db)
        .await
        .unwrap();
        let order = services::place_order(
            state,
            NewOrder {
                user_id: owner,
                total_price: 20,
                room_no: None,
                message: String::new(),
                items: vec![NewOrderItem {
                    food_type: "beverages".into(),
                    name: "Tea".into(),
                    price: 10,
                    quantity: 2,
                    image: String::new(),
                }],
            },
        )
        .await
        .unwrap();
        services::confirm_order(state, order.id, Decision::Accept)
            .await
            .unwrap();
        (owner, order.id)
    }

    fn signed(state: &AppState, order_id: Uuid) -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            razorpay_order_id: "order_IluGWxBm9U8zJ8".into(),
            razorpay_payment_id: "pay_IluGWxBm9U8zJ9".into(),
            razorpay_signature: expected_signature(
                &state.config.razorpay.key_secret,
                "order_IluGWxBm9U8zJ8",
                "pay_IluGWxBm9U8zJ9",
            ),
            db_order_id: Some(order_id),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn verified_payment_marks_order_paid_online(pool: PgPool) {
        let state = AppState::fake_with_pool(pool);
        let (owner, order_id) = accepted_order(&state).await;
        services::set_payment_type(&state, owner, order_id, PaymentMethod::Offline)
            .await
            .unwrap();

        let Json(res) = verify_payment(
            State(state.clone()),
            AuthUser(owner),
            Json(signed(&state, order_id)),
        )
        .await
        .unwrap();
        assert_eq!(res.message, "Payment verified successfully");

        let stored = &services::list_my_orders(&state, owner).await.unwrap()[0];
        assert!(stored.payment_status);
        assert_eq!(stored.payment_type, "online");

        let again = verify_payment(
            State(state.clone()),
            AuthUser(owner),
            Json(signed(&state, order_id)),
        )
        .await;
        assert!(matches!(again, Err(ApiError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn valid_signature_cannot_pay_someone_elses_order(pool: PgPool) {
        let state = AppState::fake_with_pool(pool);
        let (owner, order_id) = accepted_order(&state).await;

        let err = verify_payment(
            State(state.clone()),
            AuthUser(Uuid::new_v4()),
            Json(signed(&state, order_id)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let stored = &services::list_my_orders(&state, owner).await.unwrap()[0];
        assert!(!stored.payment_status);
        assert_eq!(stored.payment_type, "");
    }
}
