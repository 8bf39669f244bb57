//! Router assembly

use std::time::Duration;

use axum::{
    handler::Handler,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cors::cors_middleware;
use crate::handlers;
use crate::state::AppState;

const PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);
const PROXY_TIMEOUT: Duration = Duration::from_secs(60);

/// POST operation with a 204 preflight and a JSON 405 for anything else
fn operation<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}

pub fn router(state: AppState) -> Router {
    let payments = Router::new()
        .route("/createStripeCheckout", operation(handlers::create_stripe_checkout))
        .route("/verifyStripePayment", operation(handlers::verify_stripe_payment))
        .route("/createPayPalOrder", operation(handlers::create_paypal_order))
        .route("/verifyPayPalPayment", operation(handlers::verify_paypal_payment))
        .route("/createPaystackTransaction", operation(handlers::create_paystack_transaction))
        .route("/verifyPaystackPayment", operation(handlers::verify_paystack_payment))
        .route("/cancelSubscription", operation(handlers::cancel_subscription))
        .layer(TimeoutLayer::new(PAYMENT_TIMEOUT));
    
    let proxy = Router::new()
        .route("/openaiProxy", operation(handlers::openai_proxy))
        .layer(TimeoutLayer::new(PROXY_TIMEOUT));
    
    Router::new()
        .route(
            "/health",
            get(handlers::health_check).fallback(handlers::method_not_allowed),
        )
        .merge(payments)
        .merge(proxy)
        .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use relay_core::{
        CheckoutRequest, GatewayRegistry, MemorySubscriptionStore, PaymentConfirmation,
        PaymentGateway, PriceTable, ProviderCheckout, ProviderKind, StaticTokenVerifier,
        SubscriptionId, SubscriptionLifecycle, SubscriptionStatus, SubscriptionStore, Tier,
    };
    use relay_runtime::{OpenAiConfig, OpenAiProxy};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::CorsConfig;

    /// References are `ref_<subscription id>`; a `ref_unpaid_` prefix reports unpaid.
    struct FakeGateway {
        kind: ProviderKind,
        configured: bool,
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn begin_checkout(
            &self,
            request: &CheckoutRequest,
        ) -> relay_core::Result<ProviderCheckout> {
            Ok(ProviderCheckout {
                external_ref: format!("ref_{}", request.subscription_id),
                redirect_url: Some(format!("https://pay.test/{}", request.amount)),
                access_code: Some("code".into()),
            })
        }

        async fn confirm_payment(&self, reference: &str) -> relay_core::Result<PaymentConfirmation> {
            if reference.starts_with("ref_unpaid_") {
                return Ok(PaymentConfirmation::unpaid());
            }
            Ok(PaymentConfirmation::paid(
                reference.strip_prefix("ref_").map(ToString::to_string),
            ))
        }
    }

    struct Harness {
        app: Router,
        store: Arc<MemorySubscriptionStore>,
    }

    fn harness() -> Harness {
        harness_with_proxy(OpenAiProxy::unconfigured(reqwest::Client::new()))
    }

    fn harness_with_proxy(proxy: OpenAiProxy) -> Harness {
        let store = Arc::new(MemorySubscriptionStore::new());
        
        let mut gateways = GatewayRegistry::new();
        gateways.register(FakeGateway { kind: ProviderKind::CardNetwork, configured: true });
        gateways.register(FakeGateway { kind: ProviderKind::Wallet, configured: true });
        gateways.register(FakeGateway { kind: ProviderKind::Regional, configured: false });
        
        let state = AppState {
            lifecycle: Arc::new(SubscriptionLifecycle::new(
                store.clone(),
                gateways,
                PriceTable::default(),
            )),
            verifier: Arc::new(
                StaticTokenVerifier::new()
                    .with_user("tok-alice", "alice")
                    .with_user("tok-bob", "bob"),
            ),
            proxy: Arc::new(proxy),
            cors: Arc::new(CorsConfig::default()),
            app_origin: "https://app.example.com".into(),
        };
        
        Harness { app: router(state), store }
    }

    fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "http://localhost:3000");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;
        
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["providers"], json!({"stripe": true, "paypal": true, "paystack": false}));
        assert_eq!(body["aiProxyConfigured"], false);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let h = harness();
        let body = json!({"tier": "project", "isAnnual": false});
        
        let (status, body) = send(&h.app, post_json("/createStripeCheckout", None, &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let h = harness();
        let body = json!({"subscriptionId": "abc"});
        
        let (status, _) = send(&h.app, post_json("/cancelSubscription", Some("tok-mallory"), &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let h = harness();
        let request = Request::get("/verifyPayPalPayment").body(Body::empty()).unwrap();
        
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn test_preflight_allowed_origin() {
        let h = harness();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/createPayPalOrder")
            .header(header::ORIGIN, "https://demo.web.app")
            .body(Body::empty())
            .unwrap();
        
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://demo.web.app");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
        
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_foreign_origin() {
        let h = harness();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/createPayPalOrder")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).is_some());
    }

    #[tokio::test]
    async fn test_checkout_then_confirm_activates() {
        let h = harness();
        let body = json!({"tier": "project", "isAnnual": false, "email": "a@example.com"});
        
        let (status, started) =
            send(&h.app, post_json("/createStripeCheckout", Some("tok-alice"), &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["success"], true);
        assert_eq!(started["checkoutUrl"], "https://pay.test/7900");
        
        let id = SubscriptionId::from_string(started["subscriptionId"].as_str().unwrap());
        let pending = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(pending.status, SubscriptionStatus::Pending);
        assert_eq!(pending.user_id, "alice");
        
        let verify = json!({"reference": format!("ref_{id}")});
        let (status, confirmed) =
            send(&h.app, post_json("/verifyStripePayment", Some("tok-alice"), &verify)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed, json!({"success": true, "subscriptionId": id.as_str()}));
        
        let active = h.store.get(&id).await.unwrap().unwrap();
        assert_eq!(active.status, SubscriptionStatus::Active);
        assert_eq!(active.tier, Tier::Project);
        assert!(!active.is_annual);
        assert!(active.end_date.is_some());
    }

    #[tokio::test]
    async fn test_paypal_order_shape() {
        let h = harness();
        let body = json!({"tier": "program", "isAnnual": true});
        
        let (status, order) =
            send(&h.app, post_json("/createPayPalOrder", Some("tok-alice"), &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["approvalUrl"], "https://pay.test/189000");
        assert_eq!(
            order["orderId"].as_str().unwrap(),
            format!("ref_{}", order["subscriptionId"].as_str().unwrap())
        );
    }

    #[tokio::test]
    async fn test_confirm_not_completed() {
        let h = harness();
        let verify = json!({"orderId": "ref_unpaid_123"});
        
        let (status, body) =
            send(&h.app, post_json("/verifyPayPalPayment", Some("tok-alice"), &verify)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "error": "Payment not completed"}));
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let h = harness();
        let body = json!({"tier": "portfolio", "email": "a@example.com"});
        
        let (status, body) =
            send(&h.app, post_json("/createPaystackTransaction", Some("tok-alice"), &body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Payment service not configured"}));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let h = harness();
        let body = json!({"tier": "project"});
        let (_, started) =
            send(&h.app, post_json("/createStripeCheckout", Some("tok-alice"), &body)).await;
        let id = started["subscriptionId"].as_str().unwrap().to_string();
        
        let cancel = json!({"subscriptionId": id});
        let (status, body) = send(&h.app, post_json("/cancelSubscription", Some("tok-bob"), &cancel)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Not authorized to cancel this subscription"}));
        
        let missing = json!({"subscriptionId": "does-not-exist"});
        let (status, body) = send(&h.app, post_json("/cancelSubscription", Some("tok-alice"), &missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Subscription not found"}));
        
        let (status, body) = send(&h.app, post_json("/cancelSubscription", Some("tok-alice"), &cancel)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Subscription cancelled successfully"}));
        
        let record = h.store.get(&SubscriptionId::from_string(id)).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_proxy_without_credentials() {
        let h = harness();
        let body = json!({"input": "hello"});
        
        let (status, body) = send(&h.app, post_json("/openaiProxy", None, &body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Service configuration error"}));
    }

    #[tokio::test]
    async fn test_proxy_relays_upstream_status() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/chat/completions"))
            .respond_with(
                wiremock::ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "model not found"}})),
            )
            .mount(&server)
            .await;
        
        let proxy = OpenAiProxy::new(
            reqwest::Client::new(),
            OpenAiConfig::new("sk-test").with_api_base(server.uri()),
        );
        let h = harness_with_proxy(proxy);
        
        let body = json!({"messages": []});
        let (status, body) = send(&h.app, post_json("/openaiProxy", None, &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "model not found");
    }

    #[tokio::test]
    async fn test_proxy_non_json_upstream_reports_cause() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/responses"))
            .respond_with(wiremock::ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;
        
        let proxy = OpenAiProxy::new(
            reqwest::Client::new(),
            OpenAiConfig::new("sk-test").with_api_base(server.uri()),
        );
        let h = harness_with_proxy(proxy);
        
        let body = json!({"input": "hello"});
        let (status, body) = send(&h.app, post_json("/openaiProxy", None, &body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process request");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        assert_eq!(body.as_object().unwrap().len(), 2);
    }
}
