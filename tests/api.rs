//! Public API tests: health, blog, camps, trainings, core and media serving

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Local};
use serde_json::{json, Value};

use common::{spawn_app, spawn_app_with};
use gabi::config::ServerConfig;

fn days_from_today(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|item| item["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "ok"}));

    app.state.pool.close().await;
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn trailing_slash_is_optional() {
    let app = spawn_app().await;

    let (with_slash, _) = app.get("/api/blog/articles/").await;
    let (without_slash, _) = app.get("/api/blog/articles").await;
    assert_eq!(with_slash, StatusCode::OK);
    assert_eq!(without_slash, StatusCode::OK);

    let (status, body) = app.get("/api/camps/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn media_is_served_without_caching() {
    let app = spawn_app().await;
    let dir = app.media_dir.path().join("coaches");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("anna.txt"), "portrait").unwrap();

    let response = app
        .send(
            Request::builder()
                .uri("/media/coaches/anna.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"portrait");
}

#[tokio::test]
async fn cors_preflight_allows_site_origin() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/core/lead")
                .header(header::ORIGIN, "https://gabi.club")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

// ============================================================================
// Blog
// ============================================================================

#[tokio::test]
async fn blog_lists_only_published_articles() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let tag = app
        .admin_create(&token, "/api/admin/tags", json!({"title": "Бег", "slug": "running"}))
        .await;
    let tag_id = tag["id"].as_i64().unwrap();

    let published = app
        .admin_create(
            &token,
            "/api/admin/articles",
            json!({
                "title": "Утренняя пробежка",
                "slug": "morning-run",
                "excerpt": "Как начать бегать",
                "content": "Первый абзац",
                "is_featured": true,
                "tag_ids": [tag_id],
                "cover_image": "articles/run.jpg",
                "sections": [{"title": "Разминка", "content": "10 минут", "order": 1}]
            }),
        )
        .await;
    assert_eq!(published["slug"], "morning-run");

    app.admin_create(
        &token,
        "/api/admin/articles",
        json!({"title": "Черновик", "slug": "draft", "is_published": false}),
    )
    .await;
    app.admin_create(
        &token,
        "/api/admin/articles",
        json!({"title": "Растяжка", "slug": "stretching", "excerpt": "Flexibility drills"}),
    )
    .await;

    let (status, list) = app.get("/api/blog/articles").await;
    assert_eq!(status, StatusCode::OK);
    let mut names = titles(&list);
    names.sort();
    assert_eq!(names, vec!["Растяжка", "Утренняя пробежка"]);

    let (_, featured) = app.get("/api/blog/articles?is_featured=true").await;
    assert_eq!(titles(&featured), vec!["Утренняя пробежка"]);

    let (_, by_tag) = app.get("/api/blog/articles?tag=running").await;
    assert_eq!(titles(&by_tag), vec!["Утренняя пробежка"]);

    let (_, blank_main) = app
        .get("/api/blog/articles?is_featured=&featured=1")
        .await;
    assert_eq!(titles(&blank_main), vec!["Утренняя пробежка"]);

    let (_, blank_tag) = app.get("/api/blog/articles?tags__slug=&tag=nope").await;
    assert!(blank_tag.as_array().unwrap().is_empty());

    let (_, by_tag_id) = app
        .get(&format!("/api/blog/articles?tags__id={}", tag_id))
        .await;
    assert_eq!(titles(&by_tag_id), vec!["Утренняя пробежка"]);

    let (_, searched) = app.get("/api/blog/articles?search=FLEXIBILITY").await;
    assert_eq!(titles(&searched), vec!["Растяжка"]);

    let (status, _) = app.get("/api/blog/articles?tag_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, detail) = app.get("/api/blog/articles/morning-run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["content"], "Первый абзац");
    assert_eq!(detail["cover_image"], "/media/articles/run.jpg");
    assert_eq!(detail["tags"][0]["slug"], "running");
    assert_eq!(detail["sections"][0]["title"], "Разминка");

    let (status, _) = app.get("/api/blog/articles/draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, tags) = app.get("/api/blog/tags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags[0]["slug"], "running");

    let (status, _) = app.get("/api/blog/tags/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Camps
// ============================================================================

fn camp(title: &str, slug: &str, status: &str, featured: bool, start_in: i64) -> Value {
    json!({
        "title": title,
        "slug": slug,
        "description": "Неделя тренировок",
        "start_date": days_from_today(start_in),
        "end_date": days_from_today(start_in + 5),
        "price_from": "45000",
        "location": "Сочи",
        "status": status,
        "is_featured": featured
    })
}

#[tokio::test]
async fn camps_filter_by_status_and_limit_featured() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    for i in 0..4 {
        app.admin_create(
            &token,
            "/api/admin/camps",
            camp(&format!("Сбор {}", i), &format!("camp-{}", i), "upcoming", true, 10 + i),
        )
        .await;
    }
    app.admin_create(
        &token,
        "/api/admin/camps",
        camp("Скрытый", "hidden", "draft", true, 20),
    )
    .await;
    app.admin_create(
        &token,
        "/api/admin/camps",
        camp("Прошлый", "past-camp", "completed", false, -30),
    )
    .await;

    let (status, list) = app.get("/api/camps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 6);
    assert!(titles(&list).contains(&"Скрытый".to_string()));

    let (_, drafts) = app.get("/api/camps?status=draft").await;
    assert_eq!(titles(&drafts), vec!["Скрытый"]);

    let (_, featured) = app.get("/api/camps/featured").await;
    assert_eq!(featured.as_array().unwrap().len(), 3);

    let (_, completed) = app.get("/api/camps?status=completed").await;
    assert_eq!(titles(&completed), vec!["Прошлый"]);
    assert_eq!(completed[0]["price_from"], "45000.00");

    let (_, past) = app.get("/api/camps?past=true").await;
    assert_eq!(titles(&past), vec!["Прошлый"]);

    let (_, not_past) = app.get("/api/camps?past=1").await;
    assert_eq!(not_past.as_array().unwrap().len(), 6);

    let (status, _) = app.get("/api/camps?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, detail) = app.get("/api/camps/camp-0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["location"], "Сочи");

    let (status, hidden) = app.get("/api/camps/hidden").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hidden["status"], "draft");

    let (status, _) = app.get("/api/camps/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Trainings
// ============================================================================

#[tokio::test]
async fn schedule_filters_by_window_and_choices() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let direction = app
        .admin_create(&token, "/api/admin/directions", json!({"title": "Трейл"}))
        .await;
    let location = app
        .admin_create(
            &token,
            "/api/admin/locations",
            json!({"title": "Парк Горького", "latitude": 55.73, "longitude": 37.6}),
        )
        .await;
    let coach = app
        .admin_create(
            &token,
            "/api/admin/coaches",
            json!({"full_name": "Анна Петрова", "direction_ids": [direction["id"]]}),
        )
        .await;

    let session = |title: &str, date: String, kind: &str| {
        json!({
            "title": title,
            "date": date,
            "start_time": "07:00",
            "end_time": "08:30",
            "type": kind,
            "direction_id": direction["id"],
            "coach_id": coach["id"],
            "location_id": location["id"],
            "level_ids": [1],
            "spots_total": 10,
            "spots_available": 4
        })
    };

    app.admin_create(&token, "/api/admin/sessions", session("Завтра", days_from_today(1), "group"))
        .await;
    let past = app
        .admin_create(&token, "/api/admin/sessions", session("Вчера", days_from_today(-1), "open"))
        .await;

    let (status, schedule) = app.get("/api/trainings/schedule").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&schedule), vec!["Завтра"]);
    assert_eq!(schedule[0]["start_time"], "07:00:00");
    assert_eq!(schedule[0]["duration"], 90);
    assert_eq!(schedule[0]["coach"]["full_name"], "Анна Петрова");
    assert_eq!(schedule[0]["levels"][0]["tag"], "beginner");

    let window = format!(
        "/api/trainings/schedule?start={}&end={}",
        days_from_today(-2),
        days_from_today(2)
    );
    let (_, both) = app.get(&window).await;
    assert_eq!(both.as_array().unwrap().len(), 2);

    let (_, open) = app.get(&format!("{}&type=open", window)).await;
    assert_eq!(titles(&open), vec!["Вчера"]);

    let (status, _) = app.get("/api/trainings/schedule?type=yoga").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/trainings/schedule?levels__tag=expert").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // outside the default window
    let (status, _) = app
        .get(&format!("/api/trainings/schedule/{}", past["id"]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // detail honours the list filters too
    let detail = |extra: &str| {
        format!(
            "/api/trainings/schedule/{}?start={}&end={}{}",
            past["id"],
            days_from_today(-2),
            days_from_today(2),
            extra
        )
    };
    let (status, found) = app.get(&detail("&type=open")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["title"], "Вчера");

    let (status, _) = app.get(&detail("&type=group")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get(&detail(&format!("&coach__id={}", coach["id"].as_i64().unwrap() + 100)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&detail("&type=yoga")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, simple) = app.get("/api/trainings/schedule-simple").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&simple), vec!["Завтра"]);
    assert!(simple[0].get("attachments").is_none());

    let (status, meta) = app.get("/api/trainings/meta").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta["levels"].as_array().unwrap().len(), 4);
    assert_eq!(meta["directions"][0]["title"], "Трейл");
    assert_eq!(meta["locations"][0]["title"], "Парк Горького");

    let (_, filters) = app.get("/api/trainings/schedule/filters").await;
    assert_eq!(filters, meta);

    let (_, coaches) = app
        .get(&format!("/api/trainings/coaches?directions__id={}", direction["id"]))
        .await;
    assert_eq!(coaches[0]["full_name"], "Анна Петрова");
}

#[tokio::test]
async fn price_lists_filter_by_category() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    app.admin_create(
        &token,
        "/api/admin/plans",
        json!({
            "title": "Мини-группа",
            "category": "mini_group",
            "price": "3500",
            "benefits": [{"text": "Разбор техники"}]
        }),
    )
    .await;
    app.admin_create(
        &token,
        "/api/admin/plans",
        json!({"title": "Персональная", "category": "personal", "price": 5000, "is_featured": true}),
    )
    .await;
    app.admin_create(
        &token,
        "/api/admin/tariffs",
        json!({
            "title": "Разовое занятие",
            "category": "kids",
            "prices": [{"label": "1 занятие", "price": "800"}]
        }),
    )
    .await;

    let (status, plans) = app.get("/api/trainings/plans?category=mini_group").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&plans), vec!["Мини-группа"]);
    assert_eq!(plans[0]["price"], "3500.00");
    assert_eq!(plans[0]["benefits"][0]["text"], "Разбор техники");

    let (_, featured) = app.get("/api/trainings/plans?is_featured=true").await;
    assert_eq!(titles(&featured), vec!["Персональная"]);

    let (status, _) = app.get("/api/trainings/plans?category=vip").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tariffs) = app.get("/api/trainings/session-tariffs").await;
    assert_eq!(tariffs[0]["prices"][0]["price"], "800.00");

    let (status, _) = app.get("/api/trainings/plans/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Core
// ============================================================================

#[tokio::test]
async fn contact_and_club_are_empty_until_saved() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/core/contact").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.get("/api/core/club").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let token = app.admin_token().await;
    let (status, _) = app
        .call(
            Method::PUT,
            "/api/admin/contact",
            Some(json!({"phone_primary": "+7 900 000-00-00", "email": "hi@gabi.club"})),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, contact) = app.get("/api/core/contact").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contact["phone_primary"], "+7 900 000-00-00");
    assert!(contact.get("created_at").is_none());
}

#[tokio::test]
async fn lead_submission_validates_and_throttles() {
    let app = spawn_app().await;

    let (status, body) = app
        .post_lead("10.0.0.1", json!({"full_name": "Иван", "phone": "+7 900"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], gabi::api::core::LEAD_THANKS);

    let (status, body) = app.post_lead("10.0.0.1", json!({"full_name": "Иван"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"]["non_field_errors"][0],
        gabi::services::lead::CONTACT_REQUIRED
    );

    for _ in 0..3 {
        let (status, _) = app
            .post_lead("10.0.0.1", json!({"full_name": "Иван", "email": "ivan@example.com"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .post_lead("10.0.0.1", json!({"full_name": "Иван", "phone": "+7 900"}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // other clients are unaffected
    let (status, _) = app
        .post_lead("10.0.0.2", json!({"full_name": "Мария", "phone": "+7 901"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.state.lead_service.count().await.unwrap(), 5);
}

#[tokio::test]
async fn forwarded_for_is_ignored_without_trusted_proxy() {
    let app = spawn_app_with(ServerConfig::default(), |_| {}).await;

    for i in 0..5 {
        let (status, _) = app
            .post_lead(
                &format!("10.0.1.{}", i),
                json!({"full_name": "Иван", "phone": "+7 900"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // a fresh spoofed address does not open a new bucket
    let (status, _) = app
        .post_lead("10.0.1.99", json!({"full_name": "Иван", "phone": "+7 900"}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn served_app_keys_leads_on_peer_address() {
    let app = spawn_app_with(ServerConfig::default(), |_| {}).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let served = app.app.clone();
    tokio::spawn(async move {
        gabi::api::serve(listener, served).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health = client.get(format!("{}/api/health", base)).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);

    let mut statuses = Vec::new();
    for i in 0..6 {
        let response = client
            .post(format!("{}/api/core/lead/", base))
            .header("x-forwarded-for", format!("10.9.0.{}", i))
            .json(&json!({"full_name": "Иван", "phone": "+7 900"}))
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }
    assert_eq!(statuses, vec![201, 201, 201, 201, 201, 429]);
    assert!(app.state.lead_service.limiter().is_limited("127.0.0.1").await);
}

