use matchpoint::config::Config;
use matchpoint::db;
use matchpoint::routes;
use matchpoint::state::{AppState, DbPool};
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestApp {
    base_url: String,
    pool: DbPool,
    client: reqwest::Client,
    _temp: TempDir,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn spawn_app() -> TestApp {
    let temp = TempDir::new().unwrap();
    let pool = db::create_pool(&temp.path().join("api.db")).expect("Failed to create pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.links.base_url = Some("http://app.test".to_string());
    let state = AppState {
        db: pool.clone(),
        config,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::app(state)).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        pool,
        client: reqwest::Client::new(),
        _temp: temp,
    }
}

async fn register_user(app: &TestApp, name: &str) -> String {
    let res = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "password123",
            "name": name,
            "age": 27,
            "gender": "F",
            "location": "Lyon",
            "sports": ["Tennis"],
            "images": ["https://example.com/photo.jpg"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn swipe(app: &TestApp, from: &str, to: &str, direction: &str) -> Value {
    let res = app
        .client
        .post(app.url("/matching/swipe"))
        .json(&json!({
            "currentUserId": from,
            "targetUserId": to,
            "direction": direction,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

/// Mutual like; returns the chat id of the new match.
async fn create_match(app: &TestApp, a: &str, b: &str) -> String {
    swipe(app, a, b, "LIKE").await;
    let outcome = swipe(app, b, a, "LIKE").await;
    assert_eq!(outcome["isMatch"], true);
    outcome["chatId"].as_str().unwrap().to_string()
}

fn insert_admin(pool: &DbPool) -> String {
    let hash = bcrypt::hash("admin123", 4).unwrap();
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO admins (id, email, password_hash, name)
         VALUES ('admin-1', 'admin@example.com', ?1, 'Admin')",
        rusqlite::params![hash],
    )
    .unwrap();
    "admin-1".to_string()
}

async fn register_partner(app: &TestApp, company: &str, email: &str) -> String {
    let res = app
        .client
        .post(app.url("/auth/partner/register"))
        .json(&json!({
            "email": email,
            "password": "password123",
            "companyName": company,
            "address": "12 Rue de la République, Lyon",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "PENDING");
    body["id"].as_str().unwrap().to_string()
}

async fn set_partner_status(app: &TestApp, admin_id: &str, partner_id: &str, status: &str) {
    let res = app
        .client
        .put(app.url(&format!("/admin/partners/{}/status", partner_id)))
        .json(&json!({ "adminId": admin_id, "status": status }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn index_reports_service_banner() {
    let app = spawn_app().await;

    let res = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "matchpoint");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn user_registration_and_login() {
    let app = spawn_app().await;
    let alice_id = register_user(&app, "Alice").await;

    // Duplicate email
    let res = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "email": "alice@example.com",
            "password": "password123",
            "name": "Alice Again",
            "age": 30,
            "gender": "F",
            "location": "Paris",
            "sports": ["Running"],
            "images": ["https://example.com/a.jpg"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "A user with this email already exists");

    // Underage
    let res = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "email": "kid@example.com",
            "password": "password123",
            "name": "Kid",
            "age": 16,
            "gender": "M",
            "location": "Lyon",
            "sports": ["Tennis"],
            "images": ["https://example.com/k.jpg"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Login
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), alice_id);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["sports"][0], "Tennis");

    // Wrong password and unknown email report the same error
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "nope12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn swipe_match_and_chat_flow() {
    let app = spawn_app().await;
    let alice = register_user(&app, "Alice").await;
    let bob = register_user(&app, "Bob").await;
    let carol = register_user(&app, "Carol").await;

    let outcome = swipe(&app, &alice, &bob, "LIKE").await;
    assert_eq!(outcome["isMatch"], false);
    assert!(outcome.get("matchId").is_none());

    let outcome = swipe(&app, &bob, &alice, "LIKE").await;
    assert_eq!(outcome["isMatch"], true);
    let chat_id = outcome["chatId"].as_str().unwrap().to_string();

    // Both sides see the match, each labelled with the other user
    let res = app
        .client
        .get(app.url("/matching/matches"))
        .query(&[("currentUserId", alice.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["chatId"].as_str().unwrap(), chat_id);
    assert_eq!(body[0]["matchedUser"]["name"], "Bob");

    let res = app
        .client
        .get(app.url("/matching/matches"))
        .query(&[("currentUserId", carol.as_str())])
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Exchange messages
    let res = app
        .client
        .post(app.url("/chat/messages"))
        .json(&json!({ "chatId": chat_id, "senderId": alice, "content": "Hi Bob!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["sender"]["name"], "Alice");

    let res = app
        .client
        .post(app.url("/chat/messages"))
        .json(&json!({ "chatId": chat_id, "senderId": bob, "content": "Hey Alice, padel tonight?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .get(app.url("/chat/messages"))
        .query(&[("chatId", chat_id.as_str()), ("userId", alice.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Hi Bob!");
    assert_eq!(messages[1]["content"], "Hey Alice, padel tonight?");
    assert_eq!(body["chat"]["type"], "INTERNAL");

    // Outsiders and anonymous callers are kept out
    let res = app
        .client
        .get(app.url("/chat/messages"))
        .query(&[("chatId", chat_id.as_str()), ("userId", carol.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .get(app.url("/chat/messages"))
        .query(&[("chatId", chat_id.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn swipe_rejects_bad_input() {
    let app = spawn_app().await;
    let alice = register_user(&app, "Alice").await;

    let res = app
        .client
        .post(app.url("/matching/swipe"))
        .json(&json!({ "currentUserId": alice, "targetUserId": alice, "direction": "LIKE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = app
        .client
        .post(app.url("/matching/swipe"))
        .json(&json!({ "currentUserId": alice, "targetUserId": "ghost", "direction": "LIKE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = app
        .client
        .post(app.url("/matching/swipe"))
        .json(&json!({ "currentUserId": alice, "targetUserId": "ghost", "direction": "UP" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid swipe direction");
}

#[tokio::test]
async fn guest_link_flow() {
    let app = spawn_app().await;
    let alice = register_user(&app, "Alice").await;
    let bob = register_user(&app, "Bob").await;
    let carol = register_user(&app, "Carol").await;
    let chat_id = create_match(&app, &alice, &bob).await;

    app.client
        .post(app.url("/chat/messages"))
        .json(&json!({ "chatId": chat_id, "senderId": alice, "content": "Bring a friend!" }))
        .send()
        .await
        .unwrap();

    // Members mint the link; outsiders cannot
    let res = app
        .client
        .post(app.url("/chat/external-link"))
        .json(&json!({ "chatId": chat_id, "userId": carol }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .post(app.url("/chat/external-link"))
        .json(&json!({ "chatId": chat_id, "userId": alice }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let link: Value = res.json().await.unwrap();
    let token = link["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert_eq!(
        link["url"].as_str().unwrap(),
        format!("http://app.test/chat/external/{}", token)
    );

    // The other member gets the same link back
    let res = app
        .client
        .post(app.url("/chat/external-link"))
        .json(&json!({ "chatId": chat_id, "userId": bob }))
        .send()
        .await
        .unwrap();
    let again: Value = res.json().await.unwrap();
    assert_eq!(again["token"].as_str().unwrap(), token);

    // The landing endpoint serves the thread by token alone
    let res = app
        .client
        .get(app.url(&format!("/chat/external/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["messages"][0]["content"], "Bring a friend!");
    assert_eq!(body["chat"]["id"].as_str().unwrap(), chat_id);

    let res = app
        .client
        .get(app.url(&format!("/chat/external/{}", "0".repeat(64))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    // A guest reads without naming the chat, but a stale token is refused
    let res = app
        .client
        .get(app.url("/chat/messages"))
        .query(&[("guestToken", token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let wrong = "f".repeat(64);
    let res = app
        .client
        .get(app.url("/chat/messages"))
        .query(&[("chatId", chat_id.as_str()), ("guestToken", wrong.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // Guests post on behalf of a named sender
    let res = app
        .client
        .post(app.url("/chat/messages"))
        .json(&json!({ "chatId": chat_id, "guestToken": token, "senderId": bob, "content": "On my way" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .post(app.url("/chat/messages"))
        .json(&json!({ "chatId": chat_id, "guestToken": token, "content": "anonymous" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn feed_and_admin_moderation() {
    let app = spawn_app().await;
    let alice = register_user(&app, "Alice").await;
    let _bob = register_user(&app, "Bob").await;
    let carol = register_user(&app, "Carol").await;

    let res = app
        .client
        .get(app.url("/matching/feed"))
        .query(&[("currentUserId", alice.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Carol", "Bob"]);

    let admin = insert_admin(&app.pool);

    // Admin login works against the stored hash
    let res = app
        .client
        .post(app.url("/auth/admin/login"))
        .json(&json!({ "email": "admin@example.com", "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let res = app
        .client
        .post(app.url("/auth/admin/login"))
        .json(&json!({ "email": "admin@example.com", "password": "wrong1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Blocking hides the user from feeds and bars their login
    let res = app
        .client
        .put(app.url(&format!("/admin/users/{}/status", carol)))
        .json(&json!({ "adminId": admin, "status": "BLOCKED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "BLOCKED");

    let res = app
        .client
        .get(app.url("/matching/feed"))
        .query(&[("currentUserId", alice.as_str())])
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bob"]);

    let res = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "email": "carol@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // Only a real admin may moderate, and only with a known status
    let res = app
        .client
        .put(app.url(&format!("/admin/users/{}/status", carol)))
        .json(&json!({ "adminId": "not-an-admin", "status": "ACTIVE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = app
        .client
        .put(app.url(&format!("/admin/users/{}/status", carol)))
        .json(&json!({ "adminId": admin, "status": "SUSPENDED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = app
        .client
        .put(app.url("/admin/users/ghost/status"))
        .json(&json!({ "adminId": admin, "status": "ACTIVE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn offer_lifecycle() {
    let app = spawn_app().await;
    let admin = insert_admin(&app.pool);
    let partner = register_partner(&app, "City Sports Club", "club@example.com").await;

    let offer_body = json!({
        "partnerId": partner,
        "title": "Padel court rental",
        "price": 15.0,
        "description": "One hour on our indoor courts",
        "datetime": "2027-06-01T10:00:00Z",
        "location": "Lyon 7e",
        "imageUrl": "https://example.com/court.jpg",
        "sport": "Padel",
    });

    // Pending partners cannot publish
    let res = app
        .client
        .post(app.url("/offers"))
        .json(&offer_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    set_partner_status(&app, &admin, &partner, "APPROVED").await;

    let res = app
        .client
        .post(app.url("/offers"))
        .json(&offer_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let offer: Value = res.json().await.unwrap();
    let offer_id = offer["id"].as_str().unwrap().to_string();
    assert_eq!(offer["partnerId"].as_str().unwrap(), partner);
    assert_eq!(offer["isActive"], true);
    // Datetimes are normalized so lexicographic comparisons stay chronological
    assert_eq!(offer["datetime"], "2027-06-01T10:00:00.000Z");

    // An offer in the past never shows up as available
    let mut past = offer_body.clone();
    past["title"] = json!("Last season's tournament");
    past["datetime"] = json!("2020-01-01T10:00:00Z");
    let res = app
        .client
        .post(app.url("/offers"))
        .json(&past)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .get(app.url("/offers/available"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let available = body.as_array().unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0]["title"], "Padel court rental");

    let res = app
        .client
        .get(app.url("/offers/mine"))
        .query(&[("partnerId", partner.as_str())])
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Validation failures
    let mut invalid = offer_body.clone();
    invalid["price"] = json!(0.0);
    let res = app
        .client
        .post(app.url("/offers"))
        .json(&invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let mut invalid = offer_body.clone();
    invalid["datetime"] = json!("next tuesday");
    let res = app
        .client
        .post(app.url("/offers"))
        .json(&invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Deletion is owner-only, even between approved partners
    let rival = register_partner(&app, "Rival Gym", "rival@example.com").await;
    set_partner_status(&app, &admin, &rival, "APPROVED").await;
    let res = app
        .client
        .delete(app.url(&format!("/offers/{}", offer_id)))
        .query(&[("partnerId", rival.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .delete(app.url(&format!("/offers/{}", offer_id)))
        .query(&[("partnerId", partner.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    let res = app
        .client
        .get(app.url("/offers/available"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn partner_login_reports_status() {
    let app = spawn_app().await;
    let partner = register_partner(&app, "City Sports Club", "club@example.com").await;

    let res = app
        .client
        .post(app.url("/auth/partner/login"))
        .json(&json!({ "email": "club@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), partner);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["companyName"], "City Sports Club");

    let res = app
        .client
        .post(app.url("/auth/partner/register"))
        .json(&json!({
            "email": "club@example.com",
            "password": "password123",
            "companyName": "Copycat Club",
            "address": "Elsewhere",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);
}
